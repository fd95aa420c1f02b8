//! Test that the shared core types are Sync + Send

fn assert_sync_send<T: Sync + Send>() {}

#[test]
fn test_dispatch_table_is_sync_send() {
    assert_sync_send::<spark_core::DispatchTable>();
}

#[test]
fn test_dispose_handle_is_sync_send() {
    assert_sync_send::<spark_core::DisposeHandle>();
}

#[test]
fn test_renderer_registry_is_sync_send() {
    assert_sync_send::<spark_core::RendererRegistry>();
}

#[test]
fn test_spark_config_is_sync_send() {
    assert_sync_send::<spark_core::SparkConfig>();
}

#[test]
fn test_workspace_is_sync_send() {
    assert_sync_send::<spark_core::Workspace>();
}

#[test]
fn test_classifier_is_sync_send() {
    assert_sync_send::<spark_core::DiagramClassifier>();
    assert_sync_send::<spark_core::CustomOrder>();
}

//! Benchmarks for the classification and ordering hot paths.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

use spark_core::{CustomOrder, DiagramClassifier, DispatchTable, Ranking};

const EMBEDDED: &str = r#"<svg xmlns="http://www.w3.org/2000/svg" content="&lt;mxfile host=&quot;app.diagrams.net&quot;&gt;&lt;diagram id=&quot;a&quot;/&gt;&lt;/mxfile&gt;"><g/></svg>"#;

fn icon(paths: usize) -> String {
    let mut svg = String::from(r#"<svg xmlns="http://www.w3.org/2000/svg">"#);
    for i in 0..paths {
        svg.push_str(&format!(r#"<path d="M{i} 0L0 {i}z"/>"#));
    }
    svg.push_str("</svg>");
    svg
}

fn order_text(entries: usize) -> String {
    (0..entries)
        .map(|i| format!("entry-{i}:{}", entries - i))
        .collect::<Vec<_>>()
        .join("\n")
}

fn bench_classify(c: &mut Criterion) {
    let classifier = DiagramClassifier::new();
    let inputs = [
        ("top_level", "<mxfile><diagram/></mxfile>".to_string()),
        ("embedded", EMBEDDED.to_string()),
        ("icon_small", icon(10)),
        ("icon_large", icon(1000)),
    ];

    let mut group = c.benchmark_group("classify");
    for (name, content) in &inputs {
        group.bench_with_input(BenchmarkId::new("content", name), content, |b, c| {
            b.iter(|| classifier.classify(black_box(c)))
        });
    }
    group.finish();
}

fn bench_ranking(c: &mut Criterion) {
    let mut group = c.benchmark_group("ranking");
    for size in [10, 100, 1000] {
        let text = order_text(size);
        group.bench_with_input(BenchmarkId::new("parse", size), &text, |b, t| {
            b.iter(|| Ranking::parse(black_box(t)))
        });

        let names: Vec<String> = (0..size).map(|i| format!("entry-{i}")).collect();
        group.bench_with_input(BenchmarkId::new("sort", size), &names, |b, names| {
            b.iter(|| {
                let mut entries = names.clone();
                CustomOrder::parse(&text).sort(&mut entries);
                entries
            })
        });
    }
    group.finish();
}

fn bench_dispatch(c: &mut Criterion) {
    c.bench_function("DispatchTable::install+dispose", |b| {
        let table = DispatchTable::new();
        table.bind("svg", "image");
        b.iter(|| table.install(black_box(["svg", "drawio"]), "diagram").dispose())
    });
}

criterion_group!(benches, bench_classify, bench_ranking, bench_dispatch);
criterion_main!(benches);

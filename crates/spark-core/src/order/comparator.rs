//! Rank-based ordering of sibling entries.

use std::cmp::Ordering;

use super::ranking::{DEFAULT_RANK, Ranking};

/// A node in the host's navigation tree. Only its name is consulted.
pub trait SiblingEntry {
    fn name(&self) -> &str;
}

impl SiblingEntry for str {
    fn name(&self) -> &str {
        self
    }
}

impl SiblingEntry for String {
    fn name(&self) -> &str {
        self.as_str()
    }
}

impl<T: SiblingEntry + ?Sized> SiblingEntry for &T {
    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Plain named entry, for hosts that do not have their own node type at hand.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NamedEntry {
    pub name: String,
    pub is_folder: bool,
}

impl NamedEntry {
    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: false,
        }
    }

    pub fn folder(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            is_folder: true,
        }
    }
}

impl SiblingEntry for NamedEntry {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Compare two entries by effective rank.
///
/// Entries missing from `ranking` get `default_rank`. Equal ranks compare
/// [`Ordering::Equal`]; they are not broken further, which keeps a stable
/// sort from reshuffling them on every pass.
pub fn compare<A, B>(a: &A, b: &B, ranking: &Ranking, default_rank: i64) -> Ordering
where
    A: SiblingEntry + ?Sized,
    B: SiblingEntry + ?Sized,
{
    let rank_a = ranking.rank_of(a.name(), default_rank);
    let rank_b = ranking.rank_of(b.name(), default_rank);
    rank_a.cmp(&rank_b)
}

/// A ranking paired with the rank used for unlisted entries.
///
/// ```
/// use spark_core::CustomOrder;
///
/// let order = CustomOrder::parse("a:1\nb:2");
/// let mut names = vec!["c", "b", "a"];
/// order.sort(&mut names);
/// assert_eq!(names, ["a", "b", "c"]);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomOrder {
    ranking: Ranking,
    default_rank: i64,
}

impl CustomOrder {
    pub fn new(ranking: Ranking, default_rank: i64) -> Self {
        Self {
            ranking,
            default_rank,
        }
    }

    /// Parse `config_text` with the default fallback rank.
    pub fn parse(config_text: &str) -> Self {
        Self::new(Ranking::parse(config_text), DEFAULT_RANK)
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    pub fn default_rank(&self) -> i64 {
        self.default_rank
    }

    pub fn compare<A, B>(&self, a: &A, b: &B) -> Ordering
    where
        A: SiblingEntry + ?Sized,
        B: SiblingEntry + ?Sized,
    {
        compare(a, b, &self.ranking, self.default_rank)
    }

    /// Stable sort by effective rank.
    pub fn sort<E: SiblingEntry>(&self, entries: &mut [E]) {
        entries.sort_by(|a, b| self.compare(a, b));
    }
}

/// Whether custom ordering replaces the host's native order.
///
/// Custom order applies when the configuration has any content, or when the
/// children being sorted belong to the tree root.
pub fn custom_order_applies(config_text: &str, is_root: bool) -> bool {
    is_root || !config_text.trim().is_empty()
}

/// Sort `entries` by the ranks in `config_text`.
///
/// The text is parsed on every call so an edited configuration takes effect
/// on the next sort without any invalidation step.
pub fn sort_entries<E: SiblingEntry>(entries: &mut [E], config_text: &str, default_rank: i64) {
    CustomOrder::new(Ranking::parse(config_text), default_rank).sort(entries);
}

/// Sort a directory's children, wrapping the host's `native` comparator.
///
/// When [`custom_order_applies`] says no, the entries are ordered by `native`
/// exactly as the host would have ordered them; otherwise by rank.
pub fn sort_children<E, F>(
    entries: &mut [E],
    config_text: &str,
    is_root: bool,
    default_rank: i64,
    native: F,
) where
    E: SiblingEntry,
    F: FnMut(&E, &E) -> Ordering,
{
    if custom_order_applies(config_text, is_root) {
        sort_entries(entries, config_text, default_rank);
    } else {
        entries.sort_by(native);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names<E: SiblingEntry>(entries: &[E]) -> Vec<&str> {
        entries.iter().map(|e| e.name()).collect()
    }

    #[test]
    fn test_compare_by_rank() {
        let ranking: Ranking = [("a", 1), ("b", 2)].into_iter().collect();
        assert_eq!(compare("a", "b", &ranking, DEFAULT_RANK), Ordering::Less);
        assert_eq!(compare("b", "a", &ranking, DEFAULT_RANK), Ordering::Greater);
        assert_eq!(compare("a", "a", &ranking, DEFAULT_RANK), Ordering::Equal);
    }

    #[test]
    fn test_unranked_entries_use_default() {
        let ranking: Ranking = [("late", 2000), ("early", 5)].into_iter().collect();
        assert_eq!(compare("x", "late", &ranking, DEFAULT_RANK), Ordering::Less);
        assert_eq!(compare("x", "early", &ranking, DEFAULT_RANK), Ordering::Greater);
        assert_eq!(compare("x", "y", &ranking, DEFAULT_RANK), Ordering::Equal);
    }

    #[test]
    fn test_explicit_default_rank_ties_with_unranked() {
        let ranking: Ranking = [("pinned", 1000)].into_iter().collect();
        assert_eq!(compare("pinned", "other", &ranking, 1000), Ordering::Equal);
    }

    #[test]
    fn test_sort_ranked_before_unranked() {
        let mut entries = vec!["c", "b", "a"];
        sort_entries(&mut entries, "a:1\nb:2", DEFAULT_RANK);
        assert_eq!(entries, ["a", "b", "c"]);
    }

    #[test]
    fn test_sort_is_stable_for_equal_ranks() {
        let mut entries = vec![
            NamedEntry::file("zeta.md"),
            NamedEntry::folder("Inbox"),
            NamedEntry::file("alpha.md"),
            NamedEntry::folder("Archive"),
        ];
        sort_entries(&mut entries, "Inbox:1\nArchive:1", DEFAULT_RANK);
        assert_eq!(names(&entries), ["Inbox", "Archive", "zeta.md", "alpha.md"]);
    }

    #[test]
    fn test_negative_ranks_sort_first() {
        let mut entries = vec!["a", "b", "c"];
        sort_entries(&mut entries, "c:-10", DEFAULT_RANK);
        assert_eq!(entries, ["c", "a", "b"]);
    }

    #[test]
    fn test_config_edit_takes_effect_on_next_sort() {
        let mut entries = vec!["a", "b"];
        sort_entries(&mut entries, "b:1\na:2", DEFAULT_RANK);
        assert_eq!(entries, ["b", "a"]);
        sort_entries(&mut entries, "a:1\nb:2", DEFAULT_RANK);
        assert_eq!(entries, ["a", "b"]);
    }

    #[test]
    fn test_custom_order_struct() {
        let order = CustomOrder::new(Ranking::parse("b:1"), 0);
        assert_eq!(order.default_rank(), 0);
        assert_eq!(order.ranking().get("b"), Some(1));

        let mut entries = vec![String::from("b"), String::from("a")];
        order.sort(&mut entries);
        assert_eq!(entries, ["a", "b"]);
    }

    #[test]
    fn test_activation_policy() {
        assert!(custom_order_applies("a:1", false));
        assert!(custom_order_applies("", true));
        assert!(!custom_order_applies("", false));
        assert!(!custom_order_applies("  \n\t", false));
        // Non-empty but unparsable text still switches to custom order.
        assert!(custom_order_applies("garbage", false));
    }

    #[test]
    fn test_sort_children_defers_to_native_when_inactive() {
        let mut entries = vec!["b", "c", "a"];
        sort_children(&mut entries, "", false, DEFAULT_RANK, |a, b| b.cmp(a));
        assert_eq!(entries, ["c", "b", "a"]);
    }

    #[test]
    fn test_sort_children_uses_ranks_when_active() {
        let mut entries = vec!["b", "c", "a"];
        sort_children(&mut entries, "a:1", false, DEFAULT_RANK, |a, b| b.cmp(a));
        assert_eq!(entries, ["a", "b", "c"]);
    }

    #[test]
    fn test_sort_children_root_with_empty_config_keeps_input_order() {
        let mut entries = vec!["b", "c", "a"];
        sort_children(&mut entries, "", true, DEFAULT_RANK, |a, b| a.cmp(b));
        assert_eq!(entries, ["b", "c", "a"]);
    }

    #[test]
    fn test_reference_entries() {
        let owned = [NamedEntry::file("x"), NamedEntry::file("y")];
        let mut refs: Vec<&NamedEntry> = owned.iter().collect();
        sort_entries(&mut refs, "y:1", DEFAULT_RANK);
        assert_eq!(refs[0].name, "y");
    }
}

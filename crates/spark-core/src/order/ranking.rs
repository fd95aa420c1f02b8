//! Parsing of the `name:rank` priority list.

use std::collections::HashMap;

/// Rank given to entries that the configuration does not mention.
pub const DEFAULT_RANK: i64 = 1000;

/// Parsed priority list: entry name to rank, lower sorts first.
///
/// Built from raw configuration text with [`Ranking::parse`]. Parsing is
/// tolerant: every line that is not `name:integer` is skipped, so a list in
/// the middle of being edited still orders whatever it can.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Ranking {
    ranks: HashMap<String, i64>,
}

impl Ranking {
    /// Parse configuration text.
    ///
    /// Each line is split on its first `:`. Both halves are trimmed; the line
    /// counts only when the name is non-empty and the rank parses as an
    /// integer. A name listed twice keeps its last rank.
    ///
    /// ```
    /// use spark_core::Ranking;
    ///
    /// let ranking = Ranking::parse("a:1\nb:2\nbad-line\nc:notanum\na:5");
    /// assert_eq!(ranking.get("a"), Some(5));
    /// assert_eq!(ranking.get("b"), Some(2));
    /// assert_eq!(ranking.len(), 2);
    /// ```
    pub fn parse(config_text: &str) -> Self {
        let mut ranks = HashMap::new();
        for (index, line) in config_text.lines().enumerate() {
            match parse_line(line) {
                Some((name, rank)) => {
                    ranks.insert(name.to_string(), rank);
                }
                None => {
                    if !line.trim().is_empty() {
                        tracing::trace!(line = index + 1, "skipping malformed order line");
                    }
                }
            }
        }
        Self { ranks }
    }

    /// Rank configured for `name`, if any.
    pub fn get(&self, name: &str) -> Option<i64> {
        self.ranks.get(name).copied()
    }

    /// Effective rank of `name`: its configured rank or `default_rank`.
    pub fn rank_of(&self, name: &str, default_rank: i64) -> i64 {
        self.get(name).unwrap_or(default_rank)
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    /// Iterate over `(name, rank)` pairs in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.ranks.iter().map(|(name, rank)| (name.as_str(), *rank))
    }
}

impl<S: Into<String>> FromIterator<(S, i64)> for Ranking {
    fn from_iter<I: IntoIterator<Item = (S, i64)>>(iter: I) -> Self {
        Self {
            ranks: iter
                .into_iter()
                .map(|(name, rank)| (name.into(), rank))
                .collect(),
        }
    }
}

/// Parse configuration text into a [`Ranking`].
pub fn build_ranking(config_text: &str) -> Ranking {
    Ranking::parse(config_text)
}

fn parse_line(line: &str) -> Option<(&str, i64)> {
    let (name, rank) = line.split_once(':')?;
    let name = name.trim();
    let rank = rank.trim();
    if name.is_empty() || rank.is_empty() {
        return None;
    }
    let rank = rank.parse::<i64>().ok()?;
    Some((name, rank))
}

//! chars.rs
//! Grapheme-level string primitives. Matching operates on extended grapheme
//! clusters so multi-codepoint units (combining marks, Japanese text) are
//! one matchable character each.

use crate::store::NodeId;
use std::collections::HashMap;
use std::rc::Rc;
use unicode_segmentation::UnicodeSegmentation;

pub fn graphemes(s: &str) -> Vec<String> {
    s.graphemes(true).map(|g| g.to_string()).collect()
}

pub struct CachedLabel {
    pub text: String,
    pub graphemes: Vec<String>,
}

/// Per-node label cache; segmentation happens once per node.
#[derive(Default)]
pub struct GraphemeCache {
    map: HashMap<NodeId, Rc<CachedLabel>>,
}

impl GraphemeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, node: NodeId, text: &str) -> Rc<CachedLabel> {
        if let Some(label) = self.map.get(&node) {
            return Rc::clone(label);
        }
        let label = Rc::new(CachedLabel {
            text: text.to_string(),
            graphemes: graphemes(text),
        });
        self.map.insert(node, Rc::clone(&label));
        label
    }

    pub fn get(&self, node: NodeId) -> Option<Rc<CachedLabel>> {
        self.map.get(&node).map(Rc::clone)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrMatch {
    /// No offset works.
    Empty,
    /// Query fully matched inside the target: `[start, end)`.
    Complete { start: usize, end: usize },
    /// Matching reached the end of the target with query left over;
    /// `remain_query_start` is the first unmatched query position.
    Incomplete { start: usize, remain_query_start: usize },
}

/// Matches `query` against `target` at the first viable offset. Offsets are
/// grapheme indices. An empty query never matches.
pub fn find_in_graphemes(target: &[String], query: &[String]) -> StrMatch {
    if query.is_empty() {
        return StrMatch::Empty;
    }
    'offsets: for i in 0..target.len() {
        for (j, q) in query.iter().enumerate() {
            if i + j >= target.len() {
                return StrMatch::Incomplete {
                    start: i,
                    remain_query_start: j,
                };
            }
            if target[i + j] != *q {
                continue 'offsets;
            }
        }
        return StrMatch::Complete {
            start: i,
            end: i + query.len(),
        };
    }
    StrMatch::Empty
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn find(target: &str, query: &str) -> StrMatch {
        find_in_graphemes(&graphemes(target), &graphemes(query))
    }

    #[rstest]
    #[case("abc", "a", StrMatch::Complete { start: 0, end: 1 })]
    #[case("abc", "ab", StrMatch::Complete { start: 0, end: 2 })]
    #[case("abc", "abc", StrMatch::Complete { start: 0, end: 3 })]
    #[case("abc", "bc", StrMatch::Complete { start: 1, end: 3 })]
    #[case("abc", "c", StrMatch::Complete { start: 2, end: 3 })]
    #[case("abc", "abcd", StrMatch::Incomplete { start: 0, remain_query_start: 3 })]
    #[case("abc", "bcd", StrMatch::Incomplete { start: 1, remain_query_start: 2 })]
    #[case("abc", "x", StrMatch::Empty)]
    #[case("abc", "", StrMatch::Empty)]
    #[case("", "a", StrMatch::Empty)]
    fn test_find_in_graphemes(#[case] target: &str, #[case] query: &str, #[case] want: StrMatch) {
        assert_eq!(find(target, query), want);
    }

    #[test]
    fn test_graphemes_keep_combining_marks_together() {
        // U+304B + U+3099 is one user-perceived character.
        let segmented = graphemes("か\u{3099}き");
        assert_eq!(segmented.len(), 2);
        assert_eq!(segmented[0], "か\u{3099}");
        // The base character alone does not equal the combined cluster.
        assert_eq!(find("か\u{3099}き", "か"), StrMatch::Empty);
        assert_eq!(
            find("か\u{3099}き", "か\u{3099}"),
            StrMatch::Complete { start: 0, end: 1 }
        );
    }

    #[test]
    fn test_cache_segments_once() {
        let mut cache = GraphemeCache::new();
        let node = NodeId::new(0);
        let first = cache.add(node, "abc");
        // A second add with different text keeps the original entry.
        let second = cache.add(node, "zzz");
        assert_eq!(first.text, second.text);
        assert_eq!(cache.get(node).unwrap().graphemes.len(), 3);
    }
}

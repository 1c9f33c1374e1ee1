//! Grapheme-aware substring search across DAG node labels.
pub mod chars;
pub mod finder;

pub use chars::{find_in_graphemes, graphemes, GraphemeCache, StrMatch};
pub use finder::{StringFinder, StringMatch, StringPrefixMatch};

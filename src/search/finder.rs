//! finder.rs
//! Substring search that walks forward through a DAG: a query may start
//! inside one node's label and complete several nodes downstream. Reported
//! offsets are grapheme positions within the first and last node of the
//! matched path.

use crate::error::Error;
use crate::forest::PartialPathMatcher;
use crate::graph::Dag;
use crate::search::chars::{find_in_graphemes, graphemes, CachedLabel, GraphemeCache, StrMatch};
use crate::store::NodeId;
use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringMatch {
    /// Nodes the match spans, in walk order.
    pub path: Vec<NodeId>,
    /// Grapheme offset of the match start within the first node's label.
    pub start_pos: usize,
    /// Grapheme offset of the match end within the last node's label.
    pub end_pos: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StringPrefixMatch {
    pub path: Vec<NodeId>,
    pub end_pos: usize,
}

pub struct StringFinder<N> {
    mapper: Box<dyn Fn(&N) -> String>,
    cache: RefCell<GraphemeCache>,
}

impl<N> StringFinder<N> {
    pub fn new(mapper: impl Fn(&N) -> String + 'static) -> Self {
        Self {
            mapper: Box::new(mapper),
            cache: RefCell::new(GraphemeCache::new()),
        }
    }

    fn label<E: Clone + 'static>(
        &self,
        node: NodeId,
        dag: &Dag<N, E>,
    ) -> Result<Rc<CachedLabel>, Error> {
        if let Some(label) = self.cache.borrow().get(node) {
            return Ok(label);
        }
        let text = {
            let nodes = dag.nodes().borrow();
            (self.mapper)(nodes.get(node)?)
        };
        Ok(self.cache.borrow_mut().add(node, &text))
    }

    fn children_of<E: Clone + 'static>(&self, node: NodeId, dag: &Dag<N, E>) -> Vec<NodeId> {
        dag.edges()
            .get(node)
            .map(|group| group.children.iter().map(|e| e.to).collect())
            .unwrap_or_default()
    }

    /// Matches `query` starting somewhere within `node`'s label. A match
    /// that exhausts the label before the query continues into every child,
    /// one result per successful continuation.
    pub fn find_from_node<E: Clone + 'static>(
        &self,
        node: NodeId,
        dag: &Dag<N, E>,
        query: &str,
    ) -> Result<Vec<StringMatch>, Error> {
        let query = graphemes(query);
        let label = self.label(node, dag)?;
        match find_in_graphemes(&label.graphemes, &query) {
            StrMatch::Empty => Ok(Vec::new()),
            StrMatch::Complete { start, end } => Ok(vec![StringMatch {
                path: vec![node],
                start_pos: start,
                end_pos: end,
            }]),
            StrMatch::Incomplete {
                start,
                remain_query_start,
            } => {
                let remain = &query[remain_query_start..];
                let mut results = Vec::new();
                for child in self.children_of(node, dag) {
                    for prefix in self.start_with_graphemes(&[child], dag, remain)? {
                        let mut path = Vec::with_capacity(prefix.path.len() + 1);
                        path.push(node);
                        path.extend(prefix.path);
                        results.push(StringMatch {
                            path,
                            start_pos: start,
                            end_pos: prefix.end_pos,
                        });
                    }
                }
                Ok(results)
            }
        }
    }

    /// Continuation step: the last node's label must be a prefix of `query`
    /// (descend further), or `query` a prefix of the label (the match
    /// completes here at `query.len()` graphemes).
    pub fn start_with_from_node<E: Clone + 'static>(
        &self,
        path: &[NodeId],
        dag: &Dag<N, E>,
        query: &str,
    ) -> Result<Vec<StringPrefixMatch>, Error> {
        self.start_with_graphemes(path, dag, &graphemes(query))
    }

    fn start_with_graphemes<E: Clone + 'static>(
        &self,
        path: &[NodeId],
        dag: &Dag<N, E>,
        query: &[String],
    ) -> Result<Vec<StringPrefixMatch>, Error> {
        let node = *path.last().ok_or(Error::EmptyPath)?;
        let label = self.label(node, dag)?;

        if label.graphemes.starts_with(query) {
            return Ok(vec![StringPrefixMatch {
                path: path.to_vec(),
                end_pos: query.len(),
            }]);
        }
        if !query.starts_with(&label.graphemes) {
            return Ok(Vec::new());
        }

        let remain = &query[label.graphemes.len()..];
        let mut results = Vec::new();
        for child in self.children_of(node, dag) {
            let mut extended = path.to_vec();
            extended.push(child);
            results.extend(self.start_with_graphemes(&extended, dag, remain)?);
        }
        Ok(results)
    }

    /// Adapts the finder to the forest's partial-path protocol, keeping
    /// node paths and dropping position information.
    pub fn matcher<E: Clone + 'static>(
        finder: Rc<Self>,
        query: &str,
    ) -> PartialPathMatcher<'static, N, E>
    where
        N: 'static,
    {
        let query = query.to_string();
        Box::new(move |node, dag| {
            Ok(finder
                .find_from_node(node, dag, &query)?
                .into_iter()
                .map(|m| m.path)
                .collect())
        })
    }
}

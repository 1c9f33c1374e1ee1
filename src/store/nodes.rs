//! nodes.rs
//! Bidirectional node registry: values get dense ids, and a derived string
//! key maps equal values back to the id they already hold, so `add` is
//! idempotent. Key derivation is injected at construction; the default is
//! plain `Display` stringification, which makes an unkeyable type a compile
//! error rather than a runtime one.

use crate::error::Error;
use crate::store::NodeId;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt::Display;
use std::rc::Rc;

pub type KeyFn<T> = Box<dyn Fn(&T) -> String>;

/// One registry shared by every DAG of a forest.
pub type SharedNodes<T> = Rc<RefCell<Nodes<T>>>;

pub struct Nodes<T> {
    // Dense columnar storage; index == NodeId.
    values: Vec<T>,
    key_to_id: HashMap<String, NodeId>,
    key_fn: KeyFn<T>,
}

impl<T: Display> Nodes<T> {
    pub fn new() -> Self {
        Self::with_key_fn(|v: &T| v.to_string())
    }
}

impl<T: Display> Default for Nodes<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Nodes<T> {
    pub fn with_key_fn(key_fn: impl Fn(&T) -> String + 'static) -> Self {
        Self {
            values: Vec::new(),
            key_to_id: HashMap::new(),
            key_fn: Box::new(key_fn),
        }
    }

    /// Adds a value, or returns the existing id when a value with the same
    /// derived key was added before.
    pub fn add(&mut self, value: T) -> NodeId {
        let key = (self.key_fn)(&value);
        if let Some(&id) = self.key_to_id.get(&key) {
            return id;
        }
        let id = NodeId::new(self.values.len());
        self.key_to_id.insert(key, id);
        self.values.push(value);
        id
    }

    pub fn get(&self, id: NodeId) -> Result<&T, Error> {
        self.values.get(id.index()).ok_or(Error::NodeNotFound(id))
    }

    pub fn safe_get(&self, id: NodeId) -> Option<&T> {
        self.values.get(id.index())
    }

    pub fn get_by_key(&self, key: &str) -> Result<&T, Error> {
        let id = self
            .key_to_id
            .get(key)
            .ok_or_else(|| Error::NodeKeyNotFound(key.to_string()))?;
        self.get(*id)
    }

    pub fn get_id(&self, value: &T) -> Option<NodeId> {
        self.get_id_by_key(&(self.key_fn)(value))
    }

    pub fn get_id_by_key(&self, key: &str) -> Option<NodeId> {
        self.key_to_id.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &T)> {
        self.values
            .iter()
            .enumerate()
            .map(|(i, v)| (NodeId::new(i), v))
    }

    /// Values in id order; index == NodeId.
    pub fn to_vec(&self) -> Vec<T>
    where
        T: Clone,
    {
        self.values.clone()
    }

    pub fn into_shared(self) -> SharedNodes<T> {
        Rc::new(RefCell::new(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_idempotent() {
        let mut nodes = Nodes::<String>::new();
        let a = nodes.add("a".to_string());
        let b = nodes.add("b".to_string());
        let a2 = nodes.add("a".to_string());
        assert_eq!(a, a2);
        assert_ne!(a, b);
        assert_eq!(nodes.len(), 2);
    }

    #[test]
    fn test_get_variants() {
        let mut nodes = Nodes::<String>::new();
        let a = nodes.add("abc".to_string());
        assert_eq!(nodes.get(a).unwrap(), "abc");
        assert_eq!(nodes.safe_get(NodeId::new(9)), None);
        assert_eq!(
            nodes.get(NodeId::new(9)),
            Err(Error::NodeNotFound(NodeId::new(9)))
        );
        assert_eq!(nodes.get_by_key("abc").unwrap(), "abc");
        assert_eq!(
            nodes.get_by_key("zzz"),
            Err(Error::NodeKeyNotFound("zzz".to_string()))
        );
    }

    #[test]
    fn test_get_id() {
        let mut nodes = Nodes::<String>::new();
        let a = nodes.add("abc".to_string());
        assert_eq!(nodes.get_id(&"abc".to_string()), Some(a));
        assert_eq!(nodes.get_id(&"zzz".to_string()), None);
    }

    #[test]
    fn test_custom_key_fn() {
        struct Label {
            text: String,
        }
        let mut nodes = Nodes::with_key_fn(|l: &Label| l.text.clone());
        let a = nodes.add(Label {
            text: "abc".into(),
        });
        let a2 = nodes.add(Label {
            text: "abc".into(),
        });
        assert_eq!(a, a2);
        assert_eq!(nodes.len(), 1);
    }

    #[test]
    fn test_iter_in_id_order() {
        let mut nodes = Nodes::<i32>::new();
        let ids: Vec<NodeId> = [10, 20, 30].into_iter().map(|v| nodes.add(v)).collect();
        let seen: Vec<(NodeId, i32)> = nodes.iter().map(|(id, v)| (id, *v)).collect();
        assert_eq!(seen, vec![(ids[0], 10), (ids[1], 20), (ids[2], 30)]);
        assert_eq!(nodes.to_vec(), vec![10, 20, 30]);
    }
}

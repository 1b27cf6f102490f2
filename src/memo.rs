//! Identity table used by deep duplication.

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::Shared;

#[derive(Clone, Copy, PartialEq, Eq, Hash)]
struct NodeKey {
    addr: usize,
    type_id: TypeId,
}

impl NodeKey {
    fn of<T: 'static>(node: &Shared<T>) -> Self {
        Self {
            addr: Rc::as_ptr(node) as *const () as usize,
            type_id: TypeId::of::<T>(),
        }
    }
}

struct MemoEntry {
    // Held so the original's address cannot be reused while the key is live.
    _original: Rc<dyn Any>,
    copy: Rc<dyn Any>,
}

/// Maps original nodes to the copies made of them during a deep duplication.
///
/// A memo normally lives for a single [`duplicate`](crate::duplicate) call. Passing the
/// same memo to several calls makes them behave as one copy operation: nodes reached
/// by more than one call are copied once.
#[derive(Default)]
pub struct Memo {
    entries: HashMap<NodeKey, MemoEntry>,
    // Nodes strongly reachable from the values being duplicated, originals held alive.
    reachable: HashMap<NodeKey, Rc<dyn Any>>,
}

impl Memo {
    /// An empty memo.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes copied so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no node has been copied yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The copy already made for `original`, if any.
    pub fn lookup<T: 'static>(&self, original: &Shared<T>) -> Option<Shared<T>> {
        self.entries
            .get(&NodeKey::of(original))
            .and_then(|entry| entry.copy.clone().downcast::<RefCell<T>>().ok())
    }

    /// Record `copy` as the duplicate of `original`. A previous record is replaced.
    pub fn record<T: 'static>(&mut self, original: &Shared<T>, copy: &Shared<T>) {
        let original_any: Rc<dyn Any> = original.clone();
        let copy_any: Rc<dyn Any> = copy.clone();
        self.entries.insert(
            NodeKey::of(original),
            MemoEntry {
                _original: original_any,
                copy: copy_any,
            },
        );
    }
}

impl Memo {
    /// Marks `node` as part of the copied region. Returns `false` if it already was.
    pub(crate) fn mark<T: 'static>(&mut self, node: &Shared<T>) -> bool {
        let key = NodeKey::of(node);
        if self.reachable.contains_key(&key) {
            return false;
        }
        let original: Rc<dyn Any> = node.clone();
        self.reachable.insert(key, original);
        true
    }

    pub(crate) fn is_marked<T: 'static>(&self, node: &Shared<T>) -> bool {
        self.reachable.contains_key(&NodeKey::of(node))
    }
}

impl fmt::Debug for Memo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("entries", &self.entries.len())
            .finish()
    }
}

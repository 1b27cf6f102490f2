//! Shallow and deep duplication of `Rc` object graphs.
//!
//! Identity lives in [`Shared<T>`] nodes. A shallow duplicate copies a value and keeps
//! pointing at the same nodes; a deep duplicate copies every reachable node once,
//! using a [`Memo`] so that shared nodes stay shared and cycles close on the copies.
//!
//! Back-references are `Weak` pointers. A deep duplicate redirects them to the copy of
//! their target whenever that target is strongly reachable from the duplicated value,
//! whatever the field order, and otherwise leaves them pointing at the original.
//!
//! # Examples
//!
//! ```rust
//! use creational::{duplicate_node, shared, CopyMode, Shared};
//! use std::cell::RefCell;
//! use std::rc::{Rc, Weak};
//!
//! struct Parent {
//!     child: Shared<Child>,
//! }
//!
//! struct Child {
//!     parent: Weak<RefCell<Parent>>,
//! }
//!
//! creational::impl_duplicate!(Parent { child });
//! creational::impl_duplicate!(Child { parent });
//!
//! let parent = Rc::new_cyclic(|weak| {
//!     RefCell::new(Parent {
//!         child: shared(Child { parent: weak.clone() }),
//!     })
//! });
//!
//! let copy = duplicate_node(&parent, CopyMode::Deep, None);
//! let back = copy.borrow().child.borrow().parent.upgrade().unwrap();
//! assert!(Rc::ptr_eq(&back, &copy));
//! ```

use std::cell::RefCell;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::rc::{Rc, Weak};

use crate::Memo;

/// A node with identity: shared by shallow copies, copied once by deep copies.
pub type Shared<T> = Rc<RefCell<T>>;

/// Wraps `value` in a fresh [`Shared`] node.
pub fn shared<T>(value: T) -> Shared<T> {
    Rc::new(RefCell::new(value))
}

/// How [`duplicate`] treats nested nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopyMode {
    /// Nested nodes are shared with the original.
    Shallow,
    /// Nested nodes are copied, preserving sharing and cycles.
    Deep,
}

impl fmt::Display for CopyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CopyMode::Shallow => f.write_str("shallow"),
            CopyMode::Deep => f.write_str("deep"),
        }
    }
}

/// Values that can be duplicated shallowly or deeply.
///
/// Implement it with [`impl_duplicate!`](crate::impl_duplicate) for plain structs, or by
/// hand for enums, calling the same method on every field.
pub trait Duplicate: Sized {
    /// A new value whose nested nodes are the original's nodes.
    fn shallow_duplicate(&self) -> Self;

    /// A new value whose nested nodes are copies, resolved through `memo`.
    fn deep_duplicate(&self, memo: &mut Memo) -> Self;

    /// Marks in `memo` every node reachable from this value through strong references.
    ///
    /// [`duplicate`] runs this before [`deep_duplicate`](Duplicate::deep_duplicate);
    /// it must visit the same fields, skipping `Weak` ones.
    fn mark_reachable(&self, memo: &mut Memo);
}

/// Duplicates `value` in the given mode.
///
/// Without a caller-supplied memo, a fresh one is used and dropped on return.
pub fn duplicate<T: Duplicate>(value: &T, mode: CopyMode, memo: Option<&mut Memo>) -> T {
    match mode {
        CopyMode::Shallow => {
            tracing::trace!(target: "creational::duplicate", %mode, "duplicated value");
            value.shallow_duplicate()
        }
        CopyMode::Deep => {
            let mut local = Memo::new();
            let memo = memo.unwrap_or(&mut local);
            value.mark_reachable(memo);
            let copy = value.deep_duplicate(memo);
            tracing::trace!(
                target: "creational::duplicate",
                %mode,
                memo_entries = memo.len(),
                "duplicated value"
            );
            copy
        }
    }
}

/// Duplicates a top-level node.
///
/// Unlike a `Shared` field inside a shallow copy, the node itself is always new: a
/// shallow duplicate is a fresh node holding a shallow duplicate of the inner value.
pub fn duplicate_node<T: Duplicate + 'static>(
    node: &Shared<T>,
    mode: CopyMode,
    memo: Option<&mut Memo>,
) -> Shared<T> {
    match mode {
        CopyMode::Shallow => shared(duplicate(&*node.borrow(), mode, memo)),
        CopyMode::Deep => duplicate(node, mode, memo),
    }
}

impl<T: Duplicate + 'static> Duplicate for Shared<T> {
    fn shallow_duplicate(&self) -> Self {
        Rc::clone(self)
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        if let Some(copy) = memo.lookup(self) {
            return copy;
        }

        // The shell is recorded before recursing so cycles back to this node close on it.
        let shell = shared(self.borrow().shallow_duplicate());
        memo.record(self, &shell);

        let filled = self.borrow().deep_duplicate(memo);
        *shell.borrow_mut() = filled;
        shell
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        // Nodes with a copy already are not descended into; their copies are reused as is.
        if memo.lookup(self).is_none() && memo.mark(self) {
            self.borrow().mark_reachable(memo);
        }
    }
}

impl<T: Duplicate + 'static> Duplicate for Weak<RefCell<T>> {
    fn shallow_duplicate(&self) -> Self {
        Weak::clone(self)
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        let Some(target) = self.upgrade() else {
            return Weak::new();
        };
        if let Some(copy) = memo.lookup(&target) {
            return Rc::downgrade(&copy);
        }
        if memo.is_marked(&target) {
            // Reached strongly later in this copy; the memo keeps the copy alive until then.
            return Rc::downgrade(&target.deep_duplicate(memo));
        }
        Weak::clone(self)
    }

    fn mark_reachable(&self, _memo: &mut Memo) {}
}

// -------------------------------------------------------------------------------------------------
// Leaves and owned containers
// -------------------------------------------------------------------------------------------------

macro_rules! duplicate_by_clone {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Duplicate for $ty {
                fn shallow_duplicate(&self) -> Self {
                    self.clone()
                }

                fn deep_duplicate(&self, _memo: &mut Memo) -> Self {
                    self.clone()
                }

                fn mark_reachable(&self, _memo: &mut Memo) {}
            }
        )*
    };
}

duplicate_by_clone!(
    (),
    bool,
    char,
    i8,
    i16,
    i32,
    i64,
    i128,
    isize,
    u8,
    u16,
    u32,
    u64,
    u128,
    usize,
    f32,
    f64,
    String,
    &'static str,
);

impl<T: Duplicate> Duplicate for Vec<T> {
    fn shallow_duplicate(&self) -> Self {
        self.iter().map(Duplicate::shallow_duplicate).collect()
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        self.iter().map(|item| item.deep_duplicate(memo)).collect()
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        for item in self {
            item.mark_reachable(memo);
        }
    }
}

impl<T: Duplicate> Duplicate for VecDeque<T> {
    fn shallow_duplicate(&self) -> Self {
        self.iter().map(Duplicate::shallow_duplicate).collect()
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        self.iter().map(|item| item.deep_duplicate(memo)).collect()
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        for item in self {
            item.mark_reachable(memo);
        }
    }
}

impl<T: Duplicate> Duplicate for Option<T> {
    fn shallow_duplicate(&self) -> Self {
        self.as_ref().map(Duplicate::shallow_duplicate)
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        self.as_ref().map(|inner| inner.deep_duplicate(memo))
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        if let Some(inner) = self {
            inner.mark_reachable(memo);
        }
    }
}

impl<T: Duplicate> Duplicate for Box<T> {
    fn shallow_duplicate(&self) -> Self {
        Box::new((**self).shallow_duplicate())
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        Box::new((**self).deep_duplicate(memo))
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        (**self).mark_reachable(memo);
    }
}

// Set elements and map keys are compared by value, so they are cloned as leaves.

impl<T: Clone + Ord> Duplicate for BTreeSet<T> {
    fn shallow_duplicate(&self) -> Self {
        self.clone()
    }

    fn deep_duplicate(&self, _memo: &mut Memo) -> Self {
        self.clone()
    }

    fn mark_reachable(&self, _memo: &mut Memo) {}
}

impl<T: Clone + Eq + Hash> Duplicate for HashSet<T> {
    fn shallow_duplicate(&self) -> Self {
        self.clone()
    }

    fn deep_duplicate(&self, _memo: &mut Memo) -> Self {
        self.clone()
    }

    fn mark_reachable(&self, _memo: &mut Memo) {}
}

impl<K: Clone + Ord, V: Duplicate> Duplicate for BTreeMap<K, V> {
    fn shallow_duplicate(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.shallow_duplicate()))
            .collect()
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.deep_duplicate(memo)))
            .collect()
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        for value in self.values() {
            value.mark_reachable(memo);
        }
    }
}

impl<K: Clone + Eq + Hash, V: Duplicate> Duplicate for HashMap<K, V> {
    fn shallow_duplicate(&self) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.shallow_duplicate()))
            .collect()
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        self.iter()
            .map(|(key, value)| (key.clone(), value.deep_duplicate(memo)))
            .collect()
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        for value in self.values() {
            value.mark_reachable(memo);
        }
    }
}

impl<A: Duplicate, B: Duplicate> Duplicate for (A, B) {
    fn shallow_duplicate(&self) -> Self {
        (self.0.shallow_duplicate(), self.1.shallow_duplicate())
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        (self.0.deep_duplicate(memo), self.1.deep_duplicate(memo))
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        self.0.mark_reachable(memo);
        self.1.mark_reachable(memo);
    }
}

impl<A: Duplicate, B: Duplicate, C: Duplicate> Duplicate for (A, B, C) {
    fn shallow_duplicate(&self) -> Self {
        (
            self.0.shallow_duplicate(),
            self.1.shallow_duplicate(),
            self.2.shallow_duplicate(),
        )
    }

    fn deep_duplicate(&self, memo: &mut Memo) -> Self {
        (
            self.0.deep_duplicate(memo),
            self.1.deep_duplicate(memo),
            self.2.deep_duplicate(memo),
        )
    }

    fn mark_reachable(&self, memo: &mut Memo) {
        self.0.mark_reachable(memo);
        self.1.mark_reachable(memo);
        self.2.mark_reachable(memo);
    }
}

// Copyright 2025 the Choreo Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Node identity for graph keys.
//!
//! Graph nodes are arbitrary values, but the graph needs a stable key per
//! node. Two families of keys exist:
//!
//! - Shared objects (`Rc<T>`, `Arc<T>`) map to an [`ObjectId`] derived from
//!   the address of their allocation. Every clone of the same `Rc` yields the
//!   same key, and two live allocations never share one. The object itself is
//!   never touched.
//! - Primitives map to a kind tag plus their string form, so `1_u32` and
//!   `"1"` stay distinct while `1_u32` and `1_i64` collide on purpose.

use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::sync::Arc;
use core::fmt;

/// Identity of a shared allocation.
///
/// Only meaningful while the allocation is alive. A [`Dag`](crate::Dag)
/// keeps every node alive, so keys taken from nodes it contains are unique.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
#[repr(transparent)]
pub struct ObjectId(usize);

impl ObjectId {
    /// Returns the identity of the allocation behind `ptr`.
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized>(ptr: *const T) -> Self {
        Self(ptr.cast::<()>().addr())
    }

    /// Returns the raw numeric id.
    #[inline]
    #[must_use]
    pub fn as_usize(self) -> usize {
        self.0
    }
}

/// Key under which a node is stored in a [`Dag`](crate::Dag).
#[derive(Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub enum NodeKey {
    /// A shared object, keyed by allocation identity.
    Object(ObjectId),
    /// A primitive value, keyed by kind tag and string form.
    Primitive {
        /// First letter of the value's kind: `n`, `s`, `b` or `c`.
        tag: char,
        /// The value's string form.
        value: String,
    },
}

impl NodeKey {
    /// Creates a primitive key from a kind tag and a displayable value.
    #[must_use]
    pub fn primitive(tag: char, value: impl fmt::Display) -> Self {
        Self::Primitive {
            tag,
            value: value.to_string(),
        }
    }

    /// Returns `true` if this key identifies a shared object.
    #[must_use]
    pub fn is_object(&self) -> bool {
        matches!(self, Self::Object(_))
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Object(id) => write!(f, "o{:x}", id.as_usize()),
            Self::Primitive { tag, value } => write!(f, "{tag}{value}"),
        }
    }
}

/// Types that can be stored as [`Dag`](crate::Dag) nodes.
pub trait NodeIdentity {
    /// Returns the key identifying this node.
    ///
    /// The key must be stable: calling this on the same value (or a clone of
    /// a shared object) always returns an equal key.
    fn node_key(&self) -> NodeKey;
}

impl<T: ?Sized> NodeIdentity for Rc<T> {
    #[inline]
    fn node_key(&self) -> NodeKey {
        NodeKey::Object(ObjectId::of(Rc::as_ptr(self)))
    }
}

impl<T: ?Sized> NodeIdentity for Arc<T> {
    #[inline]
    fn node_key(&self) -> NodeKey {
        NodeKey::Object(ObjectId::of(Arc::as_ptr(self)))
    }
}

impl<T: NodeIdentity + ?Sized> NodeIdentity for &T {
    #[inline]
    fn node_key(&self) -> NodeKey {
        (**self).node_key()
    }
}

impl NodeIdentity for str {
    fn node_key(&self) -> NodeKey {
        NodeKey::primitive('s', self)
    }
}

impl NodeIdentity for String {
    fn node_key(&self) -> NodeKey {
        NodeKey::primitive('s', self)
    }
}

impl NodeIdentity for bool {
    fn node_key(&self) -> NodeKey {
        NodeKey::primitive('b', self)
    }
}

impl NodeIdentity for char {
    fn node_key(&self) -> NodeKey {
        NodeKey::primitive('c', self)
    }
}

macro_rules! impl_number_identity {
    ($($ty:ty),* $(,)?) => {
        $(
            impl NodeIdentity for $ty {
                fn node_key(&self) -> NodeKey {
                    NodeKey::primitive('n', self)
                }
            }
        )*
    };
}

impl_number_identity!(
    u8, u16, u32, u64, u128, usize, i8, i16, i32, i64, i128, isize, f32, f64
);

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use alloc::format;

    #[test]
    fn primitives_are_tagged_by_kind() {
        assert_eq!(format!("{}", 5_u32.node_key()), "n5");
        assert_eq!(format!("{}", "abc".node_key()), "sabc");
        assert_eq!(format!("{}", true.node_key()), "btrue");
        assert_ne!(1_u32.node_key(), "1".node_key());
        assert_eq!(1_u32.node_key(), 1_i64.node_key());
    }

    #[test]
    fn rc_clones_share_a_key() {
        let a = Rc::new(7_u32);
        let b = Rc::new(7_u32);

        assert_eq!(a.node_key(), Rc::clone(&a).node_key());
        assert_ne!(a.node_key(), b.node_key());
        assert!(a.node_key().is_object());
    }

    #[test]
    fn unsized_rc_is_keyed_by_data_pointer() {
        let a: Rc<dyn core::fmt::Debug> = Rc::new(1_u8);
        let b = Rc::clone(&a);
        assert_eq!(a.node_key(), b.node_key());
    }
}

//! # packed-avl
//!
//! Ordered maps and sets on an AVL tree that lives in parallel arrays.
//!
//! Nodes are slot indices rather than heap pointers: keys, values and the two
//! child links of slot `i` sit at index `i` of separate columns. The balance
//! factor of a subtree is packed into the two low bits of the link that points
//! at it, so a node costs its key, its value and eight bytes of links. Freed
//! slots are recycled through a free list threaded through the right links.
//!
//! ## Example
//!
//! ```rust
//! use packed_avl::{TreeConfig, TreeMap};
//!
//! let mut map = TreeMap::try_with_config(TreeConfig::with_capacity(16)).unwrap();
//! map.insert("banana", 3);
//! map.insert("apple", 1);
//! map.insert("cherry", 7);
//!
//! assert_eq!(map.get(&"apple"), Some(&1));
//! assert_eq!(map.ceiling_key(&"b"), Some(&"banana"));
//! assert_eq!(map.remove(&"banana"), Some(3));
//! assert_eq!(map.len(), 2);
//! ```

#![deny(unsafe_op_in_unsafe_fn)]

mod capacity;
mod iter;
mod link;
mod store;
mod tree;

pub mod compare;
pub mod config;
pub mod error;
pub mod map;
pub mod set;

pub use compare::{Comparator, Natural};
pub use config::{GrowthPolicy, TreeConfig};
pub use error::{CapacityError, Result};
pub use link::MAX_CAPACITY;
pub use map::TreeMap;
pub use set::TreeSet;

#[cfg(test)]
mod proptests;

//! This crate exposes a self-balancing Binary Search Tree (an AVL tree) that doubles as an
//! ordered map, mostly for educational purposes.
//!
//! ## Binary Search Tree
//!
//! A Binary Search Tree is a data structure supporting operations to
//! insert, find, and remove stored elements. BSTs are typically defined
//! recursively using the notion of a `Node`. A `Node` will typically store
//! some sort of value (the value that was inserted, for example) and will
//! sometimes have child `Node`s. The most important invariants of a BST are:
//!
//! 1. For every `Node` in a BST, all the `Node`s in its left subtree have a
//!    value no greater than its own value.
//! 2. For every `Node` in a BST, all the `Node`s in its right subtree have a
//!    value no less than its own value.
//!
//! > Note that some `Node`s have no children. These `Node`s are called "leaf nodes".
//!
//! Searching for values in the tree takes `O(height)` (where `height` is defined as the longest
//! path from the root `Node` to a leaf `Node`). An AVL tree keeps the height at `O(lg N)` by
//! making sure the two subtrees of every `Node` differ in height by at most one, rotating `Node`s
//! around after every insert and remove that would break that rule.
//!
//! ## What's in here
//!
//! - [`Tree`]: the AVL tree over any `Ord` element. Equal elements are kept side by side.
//! - [`Map`], [`MapElement`] and [`KeyValue`]: `get`/`set` by key on a tree of key/value pairs.
//! - [`Iter`] and [`Traversal`]: pre-order, in-order and post-order iteration that walks parent
//!   links instead of keeping a stack.
//! - [`error::InvariantError`]: what [`Tree::validate`] reports if the structure is ever broken.
//!
//! The tree does no locking of its own. Wrap it in a `Mutex` to share it between threads.

#![deny(missing_docs, clippy::clone_on_ref_ptr)]

pub mod error;
mod iter;
mod map;
mod tree;


pub use error::InvariantError;
pub use iter::{Iter, Traversal};
pub use map::{KeyValue, Map, MapElement};
pub use tree::Tree;

//! Errors reported by [`Tree::validate`][crate::Tree::validate].
//!
//! None of the tree's own operations fail: inserting, removing and looking things up are total
//! functions. These errors only describe a tree whose structure has been corrupted, which can only
//! happen through a bug in the balancing code. A rotation asked to promote a child that isn't
//! there is the same kind of bug but is caught mid-operation, so it panics instead.

use thiserror::Error;

/// An invariant of the AVL tree that didn't hold when the tree was walked.
///
/// Depths count edges from the root, so the root itself is at depth 0. Positions count elements
/// in in-order sequence starting from 0.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvariantError {
    /// A node's cached height doesn't match `1 + max(height(left), height(right))`.
    #[error("node at depth {depth} caches height {cached} but its subtree is {actual} high")]
    StaleHeight {
        /// Depth of the offending node.
        depth: usize,
        /// The height stored on the node.
        cached: isize,
        /// The height recomputed from its children.
        actual: isize,
    },

    /// A node's children differ in height by more than one.
    #[error("node at depth {depth} has balance factor {balance_factor}")]
    Unbalanced {
        /// Depth of the offending node.
        depth: usize,
        /// `height(left) - height(right)`.
        balance_factor: isize,
    },

    /// The in-order sequence went down.
    #[error("element at in-order position {position} is smaller than the one before it")]
    OutOfOrder {
        /// In-order position of the element that compared less than its predecessor.
        position: usize,
    },

    /// A child's parent link points somewhere other than the node that owns it.
    #[error("node at depth {depth} does not point back at its parent")]
    BrokenParentLink {
        /// Depth of the child with the bad link.
        depth: usize,
    },

    /// The element count the tree keeps doesn't match the number of nodes.
    #[error("tree records {recorded} elements but holds {counted}")]
    CountMismatch {
        /// What [`Tree::len`][crate::Tree::len] reports.
        recorded: usize,
        /// How many nodes were actually reachable from the root.
        counted: usize,
    },
}

/// A `Result` whose error is an [`InvariantError`].
pub type Result<T> = std::result::Result<T, InvariantError>;

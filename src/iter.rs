//! Pre-order, in-order and post-order iteration over a [`Tree`][crate::Tree].
//!
//! The iterator keeps nothing but the next node to yield. After yielding it finds the following
//! node by looking at the current node's children and, when those are exhausted, by climbing the
//! parent links. A full pass touches every edge at most twice, so it costs `O(N)` overall even
//! though a single step may climb `O(height)` nodes.

use std::fmt;
use std::iter::FusedIterator;
use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::tree::{Link, Node};

/// The order in which [`Tree::traverse`][crate::Tree::traverse] visits elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Traversal {
    /// Each node before its left subtree, then its right subtree.
    PreOrder,
    /// The left subtree, then the node, then its right subtree. This is ascending order.
    InOrder,
    /// Both subtrees, left then right, before the node itself.
    PostOrder,
}

/// An iterator over the elements of a [`Tree`][crate::Tree] in a chosen [`Traversal`] order.
///
/// It borrows the tree, so the tree can't change under it. It is one-shot: build a new one with
/// [`Tree::traverse`][crate::Tree::traverse] for a second pass.
pub struct Iter<'a, T> {
    next: Option<NonNull<Node<T>>>,
    order: Traversal,
    remaining: usize,
    marker: PhantomData<&'a Node<T>>,
}

// SAFETY: `Iter` only hands out `&T`, exactly like `&Tree<T>`.
unsafe impl<T: Sync> Send for Iter<'_, T> {}

// SAFETY: See above.
unsafe impl<T: Sync> Sync for Iter<'_, T> {}

impl<'a, T> Iter<'a, T> {
    /// `root` must be the root of a tree holding `len` elements that outlives `'a`.
    pub(crate) fn new(root: Link<T>, len: usize, order: Traversal) -> Self {
        let next = root.0.map(|root| match order {
            Traversal::PreOrder => root,
            Traversal::InOrder => leftmost(root),
            Traversal::PostOrder => first_in_post_order(root),
        });
        Self {
            next,
            order,
            remaining: len,
            marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Iter<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Iter")
            .field("order", &self.order)
            .field("remaining", &self.remaining)
            .finish()
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = match self.order {
            Traversal::PreOrder => pre_order_successor(current),
            Traversal::InOrder => in_order_successor(current),
            Traversal::PostOrder => post_order_successor(current),
        };
        self.remaining = self.remaining.saturating_sub(1);

        // SAFETY: The tree is borrowed for `'a` so the node lives at least that long and nobody
        // can mutate it meanwhile.
        let node: &'a Node<T> = unsafe { current.as_ref() };
        Some(&node.value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> FusedIterator for Iter<'_, T> {}

// All the helpers below dereference node pointers taken from a tree that `Iter` keeps borrowed,
// so every pointer reachable through child or parent links is live.

fn leftmost<T>(mut ptr: NonNull<Node<T>>) -> NonNull<Node<T>> {
    // SAFETY: See above.
    while let Some(left) = unsafe { ptr.as_ref() }.left.0 {
        ptr = left;
    }
    ptr
}

/// The first node of a post-order walk: keep going down, preferring left, until hitting a leaf.
fn first_in_post_order<T>(mut ptr: NonNull<Node<T>>) -> NonNull<Node<T>> {
    loop {
        // SAFETY: See above.
        let node = unsafe { ptr.as_ref() };
        ptr = match (node.left.0, node.right.0) {
            (Some(left), _) => left,
            (None, Some(right)) => right,
            (None, None) => return ptr,
        };
    }
}

fn in_order_successor<T>(ptr: NonNull<Node<T>>) -> Option<NonNull<Node<T>>> {
    // SAFETY: See above.
    let node = unsafe { ptr.as_ref() };
    if let Some(right) = node.right.0 {
        return Some(leftmost(right));
    }

    // Climb until we come up out of a left subtree. That parent is next.
    let mut child = ptr;
    let mut parent = node.parent.0;
    while let Some(up) = parent {
        // SAFETY: See above.
        let up_node = unsafe { up.as_ref() };
        if up_node.left.0 == Some(child) {
            return Some(up);
        }
        child = up;
        parent = up_node.parent.0;
    }
    None
}

fn pre_order_successor<T>(ptr: NonNull<Node<T>>) -> Option<NonNull<Node<T>>> {
    // SAFETY: See above.
    let node = unsafe { ptr.as_ref() };
    if let Some(next) = node.left.0.or(node.right.0) {
        return Some(next);
    }

    // Climb until we come up out of a left subtree whose parent has a right subtree.
    let mut child = ptr;
    let mut parent = node.parent.0;
    while let Some(up) = parent {
        // SAFETY: See above.
        let up_node = unsafe { up.as_ref() };
        if up_node.left.0 == Some(child) {
            if let Some(right) = up_node.right.0 {
                return Some(right);
            }
        }
        child = up;
        parent = up_node.parent.0;
    }
    None
}

fn post_order_successor<T>(ptr: NonNull<Node<T>>) -> Option<NonNull<Node<T>>> {
    // SAFETY: See above.
    let parent = unsafe { ptr.as_ref() }.parent.0?;
    // SAFETY: See above.
    let parent_node = unsafe { parent.as_ref() };
    match parent_node.right.0 {
        Some(right) if parent_node.left.0 == Some(ptr) => Some(first_in_post_order(right)),
        _ => Some(parent),
    }
}

//! A self-balancing Binary Search Tree (specifically, an AVL tree) holding bare elements ordered
//! by their `Ord` implementation.
//!
//! Every node keeps a pointer back to its parent so that [`Iter`] can walk the tree one step at a
//! time without a stack. Those parent pointers are only ever read; ownership flows strictly from
//! the root down through the child links.
//!
//! # Examples
//!
//! ```
//! use avl::Tree;
//!
//! let mut tree = Tree::new();
//!
//! // Nothing in here yet.
//! assert!(!tree.contains(&1));
//!
//! // Ascending inserts would give a plain BST a 9-deep chain.
//! for x in 1..=9 {
//!     tree.insert(x);
//! }
//! assert_eq!(tree.len(), 9);
//! assert_eq!(tree.height(), Some(3));
//!
//! // Removing a value returns it.
//! assert_eq!(tree.remove(&4), Some(4));
//! assert_eq!(tree.remove(&4), None);
//! assert_eq!(tree.len(), 8);
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::mem;
use std::ptr::NonNull;

use tracing::{debug, trace};

use crate::error::{InvariantError, Result};
use crate::iter::{Iter, Traversal};

/// A self-balancing Binary Search Tree (specifically, an AVL tree). This can be used for
/// inserting, finding, and removing elements.
///
/// Equal elements are not rejected: inserting a value equal to one already stored adds a second
/// node. Use the map methods on [`Map`][crate::Map] for one-entry-per-key semantics.
pub struct Tree<T> {
    // This is a `Link` instead of an `Option<Node>` so that it can be moved around with the `Tree`
    // without the children's parent pointers breaking.
    root: Link<T>,
    count: usize,
}

// SAFETY: A `Tree` exclusively owns all of its nodes, so sending it to another thread moves the
// elements along with it and nothing is left behind that could alias them.
unsafe impl<T: Send> Send for Tree<T> {}

// SAFETY: `&Tree` only ever hands out `&T`, so sharing the tree is sharing the elements.
unsafe impl<T: Sync> Sync for Tree<T> {}

impl<T> Default for Tree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for Tree<T> {
    fn drop(&mut self) {
        self.root.take().free();
    }
}

impl<T> Clone for Tree<T>
where
    T: Clone,
{
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone_subtree(Link(None)),
            count: self.count,
        }
    }
}

impl<T> fmt::Debug for Tree<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tree")
            .field("count", &self.count)
            .field("root", &self.root())
            .finish()
    }
}

/// Draws the tree on its side: the right subtree above each node and the left subtree below.
///
/// ```
/// use avl::Tree;
///
/// let tree: Tree<_> = [2, 1, 3].into_iter().collect();
/// assert_eq!(tree.to_string(), "┌──3\n2\n└──1\n");
/// assert_eq!(Tree::<i32>::new().to_string(), "empty tree");
/// ```
impl<T> fmt::Display for Tree<T>
where
    T: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.root.0.is_none() {
            return f.write_str("empty tree");
        }
        self.root.diagram(f, "", "", "")
    }
}

impl<T> Tree<T> {
    /// Generate a new, empty `Tree`.
    pub fn new() -> Self {
        Self {
            root: Link(None),
            count: 0,
        }
    }

    /// The number of elements stored in the tree, counting equal elements separately.
    pub fn len(&self) -> usize {
        self.count
    }

    /// Whether the tree holds no elements at all.
    pub fn is_empty(&self) -> bool {
        self.root.0.is_none()
    }

    /// Removes every element from the tree.
    pub fn clear(&mut self) {
        debug!(count = self.count, "clearing tree");
        self.root.take().free();
        self.count = 0;
    }

    /// The number of edges on the longest path from the root to a leaf, or `None` for an empty
    /// tree. A tree holding a single element has height 0.
    pub fn height(&self) -> Option<usize> {
        self.root().map(|root| root.height as usize)
    }

    /// The smallest element in the tree.
    pub fn min(&self) -> Option<&T> {
        self.root().map(|root| &root.leftmost().value)
    }

    /// The largest element in the tree.
    pub fn max(&self) -> Option<&T> {
        self.root().map(|root| &root.rightmost().value)
    }

    /// Returns an iterator visiting every element once in the given order.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::{Traversal, Tree};
    ///
    /// let tree: Tree<_> = [2, 1, 3].into_iter().collect();
    ///
    /// assert_eq!(tree.traverse(Traversal::PreOrder).collect::<Vec<_>>(), [&2, &1, &3]);
    /// assert_eq!(tree.traverse(Traversal::InOrder).collect::<Vec<_>>(), [&1, &2, &3]);
    /// assert_eq!(tree.traverse(Traversal::PostOrder).collect::<Vec<_>>(), [&1, &3, &2]);
    /// ```
    pub fn traverse(&self, order: Traversal) -> Iter<'_, T> {
        Iter::new(self.root, self.count, order)
    }

    /// Returns an iterator visiting every element in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        self.traverse(Traversal::InOrder)
    }

    /// Inserts the given value into the tree. Values equal to one already in the tree are stored
    /// alongside it rather than replacing it.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::Tree;
    ///
    /// let mut tree = Tree::new();
    ///
    /// tree.insert(1);
    /// tree.insert(1);
    /// assert_eq!(tree.len(), 2);
    /// assert_eq!(tree.iter().collect::<Vec<_>>(), [&1, &1]);
    /// ```
    pub fn insert(&mut self, value: T)
    where
        T: Ord,
    {
        self.root.insert(Link(None), value);
        self.count += 1;
    }

    /// Removes one element equal to `value` from the tree and returns it. If the tree doesn't
    /// contain such an element, nothing happens.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::Tree;
    ///
    /// let mut tree = Tree::new();
    /// tree.insert(1);
    ///
    /// assert_eq!(tree.remove(&1), Some(1));
    /// assert_eq!(tree.remove(&1), None);
    /// assert!(tree.is_empty());
    /// ```
    pub fn remove(&mut self, value: &T) -> Option<T>
    where
        T: Ord,
    {
        self.remove_by(|probe| value.cmp(probe))
    }

    /// Whether the tree holds an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool
    where
        T: Ord,
    {
        self.find_by(|probe| value.cmp(probe)).is_some()
    }

    /// Checks every structural invariant of the tree and reports the first one that doesn't hold.
    ///
    /// This walks the whole tree so it is `O(N)`.
    ///
    /// # Examples
    ///
    /// ```
    /// use avl::Tree;
    ///
    /// let mut tree: Tree<_> = (0..100).collect();
    /// for x in (0..100).step_by(3) {
    ///     tree.remove(&x);
    /// }
    /// assert_eq!(tree.validate(), Ok(()));
    /// ```
    pub fn validate(&self) -> Result<()>
    where
        T: Ord,
    {
        let mut walk = Walk {
            previous: None,
            position: 0,
        };
        self.root.validate(Link(None), 0, &mut walk)?;

        if walk.position != self.count {
            return Err(InvariantError::CountMismatch {
                recorded: self.count,
                counted: walk.position,
            });
        }
        Ok(())
    }

    /// Finds the element for which `cmp` returns `Equal`. `cmp` reports where the target sits
    /// relative to the element it is handed: `Less` means "look left".
    pub(crate) fn find_by<F>(&self, cmp: F) -> Option<&T>
    where
        F: FnMut(&T) -> Ordering,
    {
        // SAFETY: The pointer came from a live node reachable from `self.root` and the returned
        // reference borrows `self`, so the node can't be freed while it is in use.
        self.root
            .find_by(cmp)
            .map(|ptr| unsafe { &(*ptr.as_ptr()).value })
    }

    /// Like [`Tree::find_by`] but hands out a mutable reference. Callers must not change the
    /// element's position in the order through it.
    pub(crate) fn find_by_mut<F>(&mut self, cmp: F) -> Option<&mut T>
    where
        F: FnMut(&T) -> Ordering,
    {
        // SAFETY: As in `find_by`. The returned reference borrows `self` mutably so it is the
        // only reference into the tree while it lives.
        self.root
            .find_by(cmp)
            .map(|ptr| unsafe { &mut (*ptr.as_ptr()).value })
    }

    /// Removes the element for which `cmp` returns `Equal`. See [`Tree::find_by`] for how `cmp`
    /// steers the search.
    pub(crate) fn remove_by<F>(&mut self, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T) -> Ordering,
    {
        let removed = self.root.remove_by(&mut cmp);
        if removed.is_some() {
            self.count -= 1;
        }
        removed
    }

    pub(crate) fn root(&self) -> Option<&Node<T>> {
        self.root.node()
    }
}

impl<T> Extend<T> for Tree<T>
where
    T: Ord,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T> FromIterator<T> for Tree<T>
where
    T: Ord,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut tree = Self::new();
        tree.extend(iter);
        tree
    }
}

impl<'a, T> IntoIterator for &'a Tree<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Bookkeeping for [`Link::validate`]'s in-order walk.
struct Walk<'a, T> {
    previous: Option<&'a T>,
    position: usize,
}

pub(crate) struct Link<T>(pub(crate) Option<NonNull<Node<T>>>);

impl<T> Clone for Link<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for Link<T> {}

impl<T> Link<T> {
    pub(crate) fn node(&self) -> Option<&Node<T>> {
        // SAFETY: If the node is not `None` then it is a valid `Node`. Because we take `&self`
        // here, there can be no aliasing with `self.node_mut()`. There can only be aliasing with
        // `self.0.unwrap().as_mut()`. This code would be unsafe so it'd be the caller's
        // responsibility to ensure there is no existing borrow of the inner pointer.
        unsafe { self.0.as_ref().map(|ptr| ptr.as_ref()) }
    }

    fn node_mut(&mut self) -> Option<&mut Node<T>> {
        // SAFETY: As in `node`, with `&mut self` ruling out aliasing through this link.
        unsafe { self.0.as_mut().map(|ptr| ptr.as_mut()) }
    }

    fn take(&mut self) -> Self {
        Link(self.0.take())
    }

    /// The height of the subtree behind this link. An empty subtree has height -1.
    fn height(&self) -> isize {
        self.node().map_or(-1, |n| n.height)
    }

    /// Frees every node reachable from this link, one node at a time so deep trees can't overflow
    /// the stack.
    fn free(self) {
        let mut stack: Vec<_> = self.0.into_iter().collect();
        while let Some(ptr) = stack.pop() {
            // SAFETY: Every node was allocated with `Box::new` in `Node::new_leaf` and is owned by
            // exactly one link. The caller gave up that link so nothing else frees this node.
            let node = unsafe { Box::from_raw(ptr.as_ptr()) };
            stack.extend(node.left.0);
            stack.extend(node.right.0);
        }
    }

    fn clone_subtree(&self, parent: Link<T>) -> Self
    where
        T: Clone,
    {
        let Some(node) = self.node() else {
            return Link(None);
        };
        let mut copy = Node::new_leaf(node.value.clone(), parent);
        let copy_link = Link(Some(copy));

        // SAFETY: `copy` was just allocated and nothing else points at it yet.
        let copy_node = unsafe { copy.as_mut() };
        copy_node.height = node.height;
        copy_node.left = node.left.clone_subtree(copy_link);
        copy_node.right = node.right.clone_subtree(copy_link);
        copy_link
    }

    fn find_by<F>(&self, mut cmp: F) -> Option<NonNull<Node<T>>>
    where
        F: FnMut(&T) -> Ordering,
    {
        let mut current = self.0;
        while let Some(ptr) = current {
            // SAFETY: Every pointer reachable from a live link points at a live node.
            let node = unsafe { ptr.as_ref() };
            current = match cmp(&node.value) {
                Ordering::Less => node.left.0,
                Ordering::Equal => return Some(ptr),
                Ordering::Greater => node.right.0,
            };
        }
        None
    }

    /// Inserts `value` into the subtree behind this link. `parent` is the node owning this link
    /// (or nothing if this is the root).
    fn insert(&mut self, parent: Link<T>, value: T)
    where
        T: Ord,
    {
        let this = *self;
        match self.node_mut() {
            None => self.0 = Some(Node::new_leaf(value, parent)),
            Some(node) => {
                // Ties go right so equal values pile up instead of being rejected.
                if value < node.value {
                    node.left.insert(this, value);
                } else {
                    node.right.insert(this, value);
                }
                self.rebalance();
            }
        }
    }

    fn remove_by<F>(&mut self, cmp: &mut F) -> Option<T>
    where
        F: FnMut(&T) -> Ordering,
    {
        let node = self.node_mut()?;
        let removed = match cmp(&node.value) {
            Ordering::Less => node.left.remove_by(cmp),
            Ordering::Equal => return Some(self.unlink()),
            Ordering::Greater => node.right.remove_by(cmp),
        };

        if removed.is_some() {
            self.rebalance();
        }
        removed
    }

    /// Removes the node behind this link and returns its value.
    ///
    /// A node with at most one child is replaced by that child. A node with two children stays
    /// where it is and takes over its in-order successor's value instead; the successor's node is
    /// the one that gets freed.
    fn unlink(&mut self) -> T {
        let ptr = self.0.expect("Unlinking requires a node");
        // SAFETY: `ptr` is the live node behind this link. No other reference to it exists while
        // we hold `&mut self`.
        let node = unsafe { &mut *ptr.as_ptr() };

        match (node.left.0, node.right.0) {
            (None, None) => self.0 = None,
            (Some(mut child), None) | (None, Some(mut child)) => {
                // SAFETY: `child` is a live node distinct from `node`.
                unsafe { child.as_mut() }.parent = node.parent;
                self.0 = Some(child);
            }
            (Some(_), Some(_)) => {
                let successor = node.right.remove_min();
                let removed = mem::replace(&mut node.value, successor);
                self.rebalance();
                return removed;
            }
        }

        // SAFETY: The node has been detached above: this link points elsewhere and its only child
        // (if any) now points at the old parent. Nothing references it anymore.
        unsafe { Node::into_value(ptr) }
    }

    /// Removes the smallest node of a non-empty subtree and returns its value.
    fn remove_min(&mut self) -> T {
        let node = self
            .node_mut()
            .expect("Removing a minimum requires a non-empty subtree");
        if node.left.0.is_some() {
            let min = node.left.remove_min();
            self.rebalance();
            min
        } else {
            self.unlink()
        }
    }

    /// Restores the AVL invariant at the node behind this link, assuming both of its subtrees are
    /// already AVL trees, and recomputes its height.
    ///
    /// See https://en.wikipedia.org/wiki/AVL_tree#Rebalancing for terminology.
    fn rebalance(&mut self) {
        let Some(node) = self.node() else {
            return;
        };
        let balance_factor = node.balance_factor();
        match balance_factor {
            2 => {
                if node.left().map_or(false, |left| left.balance_factor() == -1) {
                    trace!(balance_factor, "rotating left-right");
                    self.rotate_left_right();
                } else {
                    trace!(balance_factor, "rotating right");
                    self.rotate_right();
                }
            }
            -2 => {
                if node.right().map_or(false, |right| right.balance_factor() == 1) {
                    trace!(balance_factor, "rotating right-left");
                    self.rotate_right_left();
                } else {
                    trace!(balance_factor, "rotating left");
                    self.rotate_left();
                }
            }
            _ => {}
        }

        if let Some(node) = self.node_mut() {
            node.fix_height();
        }

        if cfg!(debug_assertions) {
            let Some(node) = self.node() else {
                return;
            };
            let left_height = node.left.height();
            let right_height = node.right.height();
            assert_eq!(node.height, left_height.max(right_height) + 1);
            assert!(left_height.abs_diff(right_height) <= 1);
        }
    }

    /// Rotate self to the right. This moves the left child up vertically and self down vertically.
    /// Used to rebalance the tree when the left child is too tall. As such, it must only be called
    /// when there _is_ a left child.
    ///
    /// ## Panics
    ///
    /// When called on a node without a left child.
    ///
    /// # Diagram
    ///
    /// ```text
    ///    Option<parent>            Option<parent>
    ///      /                         /
    ///   old_root (i.e. "self")    new_root
    ///    /     \                  /     \
    /// new_root  z     rotate ->  x    old_root
    ///  / \                               /  \
    /// x   y                             y    z
    /// ```
    fn rotate_right(&mut self) {
        let mut old_root_ptr = self.0.expect("Rotating a tree requires a root");
        // SAFETY: `old_root_ptr` and `new_root_ptr` are distinct live nodes and these are the
        // only references to them for the rest of the function.
        let old_root = unsafe { old_root_ptr.as_mut() };
        let mut new_root_ptr = old_root
            .left
            .0
            .expect("Rotate right => left child (AVL invariant broken)");
        let new_root = unsafe { new_root_ptr.as_mut() };

        old_root.left = new_root.right.take();
        old_root.fix_left_child_parent();
        new_root.parent = old_root.parent;
        old_root.parent = Link(Some(new_root_ptr));
        new_root.right = Link(Some(old_root_ptr));

        // Child first: the new root's height is computed from it.
        old_root.fix_height();
        new_root.fix_height();
        self.0 = Some(new_root_ptr);
    }

    /// The mirror image of [`Link::rotate_right`].
    ///
    /// ## Panics
    ///
    /// When called on a node without a right child.
    fn rotate_left(&mut self) {
        let mut old_root_ptr = self.0.expect("Rotating a tree requires a root");
        // SAFETY: As in `rotate_right`.
        let old_root = unsafe { old_root_ptr.as_mut() };
        let mut new_root_ptr = old_root
            .right
            .0
            .expect("Rotate left => right child (AVL invariant broken)");
        let new_root = unsafe { new_root_ptr.as_mut() };

        old_root.right = new_root.left.take();
        old_root.fix_right_child_parent();
        new_root.parent = old_root.parent;
        old_root.parent = Link(Some(new_root_ptr));
        new_root.left = Link(Some(old_root_ptr));

        old_root.fix_height();
        new_root.fix_height();
        self.0 = Some(new_root_ptr);
    }

    fn rotate_right_left(&mut self) {
        self.node_mut()
            .expect("Rotating a tree requires a root")
            .right
            .rotate_right();
        self.rotate_left();
    }

    fn rotate_left_right(&mut self) {
        self.node_mut()
            .expect("Rotating a tree requires a root")
            .left
            .rotate_left();
        self.rotate_right();
    }

    fn diagram(&self, f: &mut fmt::Formatter<'_>, top: &str, root: &str, bottom: &str) -> fmt::Result
    where
        T: fmt::Display,
    {
        let Some(node) = self.node() else {
            return writeln!(f, "{root}nil");
        };
        if node.left.0.is_none() && node.right.0.is_none() {
            return writeln!(f, "{root}{}", node.value);
        }

        node.right.diagram(
            f,
            &format!("{top} "),
            &format!("{top}┌──"),
            &format!("{top}│ "),
        )?;
        writeln!(f, "{root}{}", node.value)?;
        node.left.diagram(
            f,
            &format!("{bottom}│ "),
            &format!("{bottom}└──"),
            &format!("{bottom} "),
        )
    }

    /// Checks the subtree behind this link and returns its height.
    fn validate<'a>(&'a self, parent: Link<T>, depth: usize, walk: &mut Walk<'a, T>) -> Result<isize>
    where
        T: Ord,
    {
        let Some(node) = self.node() else {
            return Ok(-1);
        };
        if node.parent.0 != parent.0 {
            return Err(InvariantError::BrokenParentLink { depth });
        }

        let left_height = node.left.validate(*self, depth + 1, walk)?;

        if walk.previous.map_or(false, |previous| node.value < *previous) {
            return Err(InvariantError::OutOfOrder {
                position: walk.position,
            });
        }
        walk.previous = Some(&node.value);
        walk.position += 1;

        let right_height = node.right.validate(*self, depth + 1, walk)?;

        let actual = left_height.max(right_height) + 1;
        if node.height != actual {
            return Err(InvariantError::StaleHeight {
                depth,
                cached: node.height,
                actual,
            });
        }
        let balance_factor = left_height - right_height;
        if balance_factor.abs() > 1 {
            return Err(InvariantError::Unbalanced {
                depth,
                balance_factor,
            });
        }
        Ok(actual)
    }
}

pub(crate) struct Node<T> {
    pub(crate) value: T,
    pub(crate) left: Link<T>,
    pub(crate) right: Link<T>,
    /// Only used to walk back up the tree. Never owns anything.
    pub(crate) parent: Link<T>,
    /// Edges on the longest path down to a leaf. Leaves have height 0.
    height: isize,
}

impl<T> fmt::Debug for Node<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("value", &self.value)
            .field("height", &self.height)
            .field("left", &self.left())
            .field("right", &self.right())
            .finish()
    }
}

impl<T> Node<T> {
    fn new_leaf(value: T, parent: Link<T>) -> NonNull<Self> {
        NonNull::from(Box::leak(Box::new(Node {
            value,
            left: Link(None),
            right: Link(None),
            parent,
            height: 0,
        })))
    }

    /// # Safety
    ///
    /// The caller must ensure nothing references the node anymore.
    unsafe fn into_value(ptr: NonNull<Self>) -> T {
        let node = *Box::from_raw(ptr.as_ptr());
        node.value
    }

    pub(crate) fn left(&self) -> Option<&Self> {
        self.left.node()
    }

    pub(crate) fn right(&self) -> Option<&Self> {
        self.right.node()
    }

    fn leftmost(&self) -> &Self {
        let mut node = self;
        while let Some(left) = node.left() {
            node = left;
        }
        node
    }

    fn rightmost(&self) -> &Self {
        let mut node = self;
        while let Some(right) = node.right() {
            node = right;
        }
        node
    }

    fn fix_left_child_parent(&mut self) {
        let self_ptr = NonNull::from(&*self);
        if let Some(left) = self.left.node_mut() {
            left.parent = Link(Some(self_ptr));
        }
    }

    fn fix_right_child_parent(&mut self) {
        let self_ptr = NonNull::from(&*self);
        if let Some(right) = self.right.node_mut() {
            right.parent = Link(Some(self_ptr));
        }
    }

    /// Adjusts the height of `self` to be the max of its children's heights + 1.
    fn fix_height(&mut self) {
        self.height = self.left.height().max(self.right.height()) + 1;
    }

    /// `height(left) - height(right)`. Positive when the node leans left.
    fn balance_factor(&self) -> isize {
        self.left.height() - self.right.height()
    }
}

use avl::{Traversal, Tree};

use std::collections::HashSet;

use crate::Op;

#[quickcheck]
fn contains(xs: Vec<i8>) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();

    xs.iter().all(|x| tree.contains(x))
}

#[quickcheck]
fn contains_not(xs: Vec<i8>, nots: Vec<i8>) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();
    let added: HashSet<_> = xs.into_iter().collect();
    let nots: HashSet<_> = nots.into_iter().collect();
    let mut nots = nots.difference(&added);

    nots.all(|x| !tree.contains(x))
}

#[quickcheck]
fn with_deletions(xs: Vec<i8>, deletes: Vec<i8>) -> bool {
    let mut tree: Tree<_> = xs.iter().copied().collect();
    let mut still_present = xs;
    for delete in &deletes {
        // Equal values are stored separately, so each remove takes out one of them.
        let expected = still_present
            .iter()
            .position(|x| x == delete)
            .map(|pos| still_present.swap_remove(pos));
        if tree.remove(delete) != expected {
            return false;
        }
    }

    tree.len() == still_present.len()
        && deletes
            .iter()
            .all(|x| tree.contains(x) == still_present.contains(x))
        && tree.validate().is_ok()
}

#[quickcheck]
fn sorted_round_trip(xs: HashSet<i16>) -> bool {
    let tree: Tree<_> = xs.iter().copied().collect();
    let mut sorted: Vec<_> = xs.into_iter().collect();
    sorted.sort_unstable();

    tree.len() == sorted.len() && tree.iter().eq(sorted.iter())
}

#[quickcheck]
fn balanced_after_any_ops(ops: Vec<Op<i8, ()>>) -> bool {
    let mut tree = Tree::new();
    for op in ops {
        match op {
            Op::Insert(x, ()) => tree.insert(x),
            Op::Remove(x) => {
                tree.remove(&x);
            }
        }
        if tree.validate().is_err() {
            return false;
        }
    }

    // An AVL tree with N nodes is never taller than about 1.44 * lg(N + 2).
    let bound = (1.45 * ((tree.len() + 2) as f64).log2()) as usize;
    tree.height().map_or(true, |height| height <= bound)
}

#[quickcheck]
fn traversals_are_permutations(xs: Vec<i8>) -> bool {
    let tree: Tree<_> = xs.into_iter().collect();
    let mut in_order: Vec<_> = tree.traverse(Traversal::InOrder).collect();
    let mut pre_order: Vec<_> = tree.traverse(Traversal::PreOrder).collect();
    let mut post_order: Vec<_> = tree.traverse(Traversal::PostOrder).collect();

    let was_sorted = in_order.windows(2).all(|w| w[0] <= w[1]);
    in_order.sort_unstable();
    pre_order.sort_unstable();
    post_order.sort_unstable();

    was_sorted && in_order == pre_order && in_order == post_order && in_order.len() == tree.len()
}

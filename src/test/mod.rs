//! Fixtures and assertions shared by the tests of this crate.

use crate::kdtree::{KDTree, KDTreeIndex, Node};
use crate::r#type::IndexableNum;


/// The nine 2D points used throughout the tests, in insertion order.
pub(crate) fn points_2d() -> Vec<[i32; 2]> {
    vec![
        [10, 5],
        [7, 8],
        [1, 7],
        [12, 1],
        [11, 0],
        [10, 7],
        [11, 3],
        [10, 8],
        [5, 7],
    ]
}

/// Eleven labelled 3D points, in insertion order.
pub(crate) fn points_3d() -> Vec<([i32; 3], &'static str)> {
    vec![
        ([30, 15, 10], "A"),
        ([15, 15, 30], "B"),
        ([20, 10, 30], "C"),
        ([20, 10, 10], "D"),
        ([20, 20, 20], "E"),
        ([20, 10, 45], "F"),
        ([20, 20, 10], "G"),
        ([20, 20, 25], "I"),
        ([45, 10, 10], "J"),
        ([30, 5, 10], "K"),
        ([30, 15, 8], "L"),
    ]
}

/// Build a tree by inserting `points` in order, each valued by its insertion index.
pub(crate) fn tree_from<N: IndexableNum, const K: usize>(points: &[[N; K]]) -> KDTree<N, usize> {
    let mut tree = KDTree::new(K);
    for (i, point) in points.iter().enumerate() {
        tree.insert(point, i).unwrap();
    }
    tree
}

/// The keys of `tree` in in-order sequence.
pub(crate) fn keys<N: IndexableNum, V>(tree: &KDTree<N, V>) -> Vec<Vec<N>> {
    tree.in_order_traversal()
        .into_iter()
        .map(|(key, _)| key.to_vec())
        .collect()
}

/// Assert that every node splits its whole subtree correctly on its axis.
pub(crate) fn assert_kd_property<N: IndexableNum, V>(tree: &KDTree<N, V>) {
    check_subtree(tree.root(), 0, tree.k());
}

fn check_subtree<N: IndexableNum, V>(node: Option<&Node<N, V>>, depth: usize, k: usize) {
    let Some(node) = node else {
        return;
    };
    let axis = depth % k;
    let split = node.key()[axis];

    for_each_key(node.left_child(), &mut |key| {
        assert!(
            key[axis] < split,
            "{:?} is left of {:?} but not below it on axis {}",
            key,
            node.key(),
            axis
        );
    });
    for_each_key(node.right_child(), &mut |key| {
        assert!(
            key[axis] >= split,
            "{:?} is right of {:?} but below it on axis {}",
            key,
            node.key(),
            axis
        );
    });

    check_subtree(node.left_child(), depth + 1, k);
    check_subtree(node.right_child(), depth + 1, k);
}

fn for_each_key<N: IndexableNum, V>(node: Option<&Node<N, V>>, f: &mut impl FnMut(&[N])) {
    if let Some(node) = node {
        f(node.key());
        for_each_key(node.left_child(), f);
        for_each_key(node.right_child(), f);
    }
}

//! Utilities to traverse the KDTree structure.

use std::fmt::Write;

use crate::r#type::IndexableNum;

/// Levels below this depth are left out of [`pretty_print`].
const MAX_PRINT_HEIGHT: usize = 16;

/// A node in the KDTree.
///
/// Each node owns its two subtrees. There is no parent link: a node is only reachable by walking
/// down from the root of its tree.
#[derive(Debug, Clone)]
pub struct Node<N: IndexableNum, V> {
    pub(crate) key: Vec<N>,
    pub(crate) value: V,
    pub(crate) left: Option<Box<Node<N, V>>>,
    pub(crate) right: Option<Box<Node<N, V>>>,
}

impl<N: IndexableNum, V> Node<N, V> {
    pub(crate) fn new(key: Vec<N>, value: V) -> Self {
        Self {
            key,
            value,
            left: None,
            right: None,
        }
    }

    /// Swap in a new point and value, returning the old ones.
    pub(crate) fn replace(&mut self, key: Vec<N>, value: V) -> (Vec<N>, V) {
        (
            std::mem::replace(&mut self.key, key),
            std::mem::replace(&mut self.value, value),
        )
    }

    /// The coordinates of the point stored in this node.
    #[inline]
    pub fn key(&self) -> &[N] {
        &self.key
    }

    /// The value stored alongside this node's point.
    #[inline]
    pub fn value(&self) -> &V {
        &self.value
    }

    /// The subtree holding points strictly below this node on its split axis.
    #[inline]
    pub fn left_child(&self) -> Option<&Node<N, V>> {
        self.left.as_deref()
    }

    /// The subtree holding points greater than or equal to this node on its split axis.
    #[inline]
    pub fn right_child(&self) -> Option<&Node<N, V>> {
        self.right.as_deref()
    }

    /// Returns `true` if this is a leaf node without children.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }

    /// Returns `true` if this is an intermediate node with children.
    #[inline]
    pub fn is_parent(&self) -> bool {
        !self.is_leaf()
    }
}

/// Number of levels in the subtree rooted at `node`.
pub(crate) fn height<N: IndexableNum, V>(node: Option<&Node<N, V>>) -> usize {
    match node {
        None => 0,
        Some(node) => 1 + height(node.left_child()).max(height(node.right_child())),
    }
}

/// Render the subtree rooted at `root` as a grid, one row per level.
///
/// A tree of height `h` is drawn on a grid `2^h - 1` cells wide. Every cell is either the key of
/// the node placed there or three spaces. The root sits in the middle column and each child is
/// offset from its parent by half the remaining width.
pub(crate) fn pretty_print<N: IndexableNum, V>(root: Option<&Node<N, V>>) -> String {
    let Some(root) = root else {
        return String::new();
    };

    let height = height(Some(root)).min(MAX_PRINT_HEIGHT);
    let width = (1usize << height) - 1;
    let mut grid: Vec<Vec<Option<&[N]>>> = vec![vec![None; width]; height];

    fill(&mut grid, root, 0, (width - 1) / 2);

    let mut out = String::new();
    for (i, row) in grid.iter().enumerate() {
        if i > 0 {
            out.push('\n');
        }
        for cell in row {
            match cell {
                Some(key) => {
                    // Writing into a String never fails
                    let _ = write!(out, "{:?}", key);
                }
                None => out.push_str("   "),
            }
        }
    }
    out
}

fn fill<'a, N: IndexableNum, V>(
    grid: &mut [Vec<Option<&'a [N]>>],
    node: &'a Node<N, V>,
    level: usize,
    pos: usize,
) {
    let height = grid.len();
    grid[level][pos] = Some(node.key());
    if level + 1 >= height {
        return;
    }

    let offset = 1usize << (height - level - 2);
    if let Some(left) = node.left_child() {
        fill(grid, left, level + 1, pos - offset);
    }
    if let Some(right) = node.right_child() {
        fill(grid, right, level + 1, pos + offset);
    }
}

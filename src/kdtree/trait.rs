use geo_traits::RectTrait;
use tinyvec::TinyVec;

use crate::error::{KDIndexError, Result};
use crate::kdtree::region::{RectRegion, Region};
use crate::kdtree::traversal::{height, Node};
use crate::kdtree::KDTree;
use crate::r#type::{sq_dist, IndexableNum};

/// A trait for searching and accessing data out of a KDTree.
pub trait KDTreeIndex<N: IndexableNum, V>: Sized {
    /// The number of dimensions of every point in this tree
    fn k(&self) -> usize;

    /// The root node of this tree, for manual traversal
    fn root(&self) -> Option<&Node<N, V>>;

    /// The number of points in this tree
    fn len(&self) -> usize;

    /// Returns `true` if this tree holds no points.
    fn is_empty(&self) -> bool {
        self.root().is_none()
    }

    /// The number of levels in this tree.
    fn height(&self) -> usize {
        height(self.root())
    }

    /// Look up the point at exactly `key`.
    ///
    /// Returns the stored point and its value, or [`KDIndexError::KeyNotFound`].
    fn search(&self, key: &[N]) -> Result<(&[N], &V)> {
        check_key_length(self.k(), key)?;
        let k = self.k();

        let mut current = self.root();
        let mut depth = 0;
        while let Some(node) = current {
            if node.key() == key {
                return Ok((node.key(), node.value()));
            }
            let axis = depth % k;
            current = if key[axis] < node.key[axis] {
                node.left_child()
            } else {
                node.right_child()
            };
            depth += 1;
        }

        Err(KDIndexError::KeyNotFound(format!("{:?}", key)))
    }

    /// Find the point closest to `key` by euclidean distance.
    ///
    /// When several points are equally close, the first one reached wins: the one found in the
    /// subtree on the query's side of a split is preferred over the splitting node itself, and
    /// both over anything on the far side.
    fn search_closest(&self, key: &[N]) -> Result<(&[N], &V)> {
        check_key_length(self.k(), key)?;
        let node = closest(key, self.root(), 0, self.k()).ok_or_else(|| {
            KDIndexError::BadOperation("Need to initialize the tree before searching.".to_string())
        })?;
        Ok((node.key(), node.value()))
    }

    /// Search the index for points inside `region`.
    ///
    /// Points are returned in traversal order: a matching node comes before the matches of its
    /// left subtree, which come before those of its right subtree.
    fn search_range(&self, region: &impl Region<N>) -> Result<Vec<(&[N], &V)>> {
        let Some(root) = self.root() else {
            return Err(KDIndexError::BadOperation(
                "Tree must be initialized before searching an area".to_string(),
            ));
        };

        let mut result = vec![];
        range(region, Some(root), 0, self.k(), &mut result);
        Ok(result)
    }

    /// Search the index for points inside a rectangle.
    ///
    /// Axes of the tree beyond those described by the rectangle are not constrained.
    fn search_range_rect(&self, rect: &impl RectTrait<T = N>) -> Result<Vec<(&[N], &V)>> {
        self.search_range(&RectRegion(rect))
    }

    /// All points in the tree, in in-order sequence (left subtree, node, right subtree).
    fn in_order_traversal(&self) -> Vec<(&[N], &V)> {
        // Use TinyVec to avoid heap allocations
        let mut stack: TinyVec<[Option<&Node<N, V>>; 32]> = TinyVec::new();
        let mut result = Vec::with_capacity(self.len());
        let mut current = self.root();

        loop {
            while let Some(node) = current {
                stack.push(Some(node));
                current = node.left_child();
            }
            let Some(node) = stack.pop().flatten() else {
                break;
            };
            result.push((node.key(), node.value()));
            current = node.right_child();
        }

        result
    }
}

impl<N: IndexableNum, V> KDTreeIndex<N, V> for KDTree<N, V> {
    fn k(&self) -> usize {
        self.k
    }

    fn root(&self) -> Option<&Node<N, V>> {
        self.root.as_deref()
    }

    fn len(&self) -> usize {
        self.num_items
    }
}

/// Reject keys that do not have exactly `k` coordinates.
pub(crate) fn check_key_length<N>(k: usize, key: &[N]) -> Result<()> {
    if key.len() != k {
        return Err(KDIndexError::BadKeyLength {
            expected: k,
            actual: key.len(),
        });
    }
    Ok(())
}

fn closest<'a, N: IndexableNum, V>(
    key: &[N],
    node: Option<&'a Node<N, V>>,
    depth: usize,
    k: usize,
) -> Option<&'a Node<N, V>> {
    let node = node?;
    let axis = depth % k;
    let (near, far) = if key[axis] < node.key[axis] {
        (node.left_child(), node.right_child())
    } else {
        (node.right_child(), node.left_child())
    };

    let mut best = match closest(key, near, depth + 1, k) {
        Some(candidate) if sq_dist(key, candidate.key()) <= sq_dist(key, node.key()) => candidate,
        _ => node,
    };

    // Only cross the splitting plane if the current best radius reaches over it
    let radius2 = sq_dist(key, best.key());
    let plane = key[axis].as_f64() - node.key[axis].as_f64();
    if radius2 >= plane * plane {
        if let Some(candidate) = closest(key, far, depth + 1, k) {
            if sq_dist(key, candidate.key()) < radius2 {
                best = candidate;
            }
        }
    }

    Some(best)
}

fn range<'a, N: IndexableNum, V, R: Region<N>>(
    region: &R,
    node: Option<&'a Node<N, V>>,
    depth: usize,
    k: usize,
    result: &mut Vec<(&'a [N], &'a V)>,
) {
    let Some(node) = node else {
        return;
    };

    if region.is_fully_inside(node.key()) {
        result.push((node.key(), node.value()));
        range(region, node.left_child(), depth + 1, k, result);
        range(region, node.right_child(), depth + 1, k, result);
        return;
    }

    let axis = depth % k;
    let split = node.key[axis];
    if split < region.min_coord(axis) {
        range(region, node.right_child(), depth + 1, k, result);
    } else if split <= region.max_coord(axis) {
        range(region, node.left_child(), depth + 1, k, result);
        range(region, node.right_child(), depth + 1, k, result);
    } else {
        range(region, node.left_child(), depth + 1, k, result);
    }
}

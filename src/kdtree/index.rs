use std::fmt;
use std::mem;
use std::num::NonZeroUsize;

use tracing::{debug, trace};

use crate::error::{KDIndexError, Result};
use crate::kdtree::builder::{flatten, rebuild, Entry};
use crate::kdtree::r#trait::check_key_length;
use crate::kdtree::traversal::{pretty_print, Node};
use crate::kdtree::{KDTreeBuilder, KDTreeIndex};
use crate::r#type::IndexableNum;

/// A mutable KDTree mapping k-dimensional points to values.
///
/// Points are split on axis `depth % k` at every level: everything in a node's left subtree is
/// strictly below the node on that axis, everything in its right subtree is at or above it.
///
/// Insertions and deletions never rebalance the structure locally. Instead the whole tree is
/// rebuilt around per-level medians every `rebalance_factor` structural operations, or on demand
/// through [`rebalance`][KDTree::rebalance].
///
/// Usually this will be created from scratch via [`KDTree::new`] or [`KDTreeBuilder`].
#[derive(Debug, Clone)]
pub struct KDTree<N: IndexableNum, V> {
    pub(crate) k: usize,
    pub(crate) root: Option<Box<Node<N, V>>>,
    pub(crate) num_items: usize,
    pub(crate) ops_count: usize,
    pub(crate) num_rebalances: usize,
    pub(crate) rebalance_factor: Option<NonZeroUsize>,
}

impl<N: IndexableNum, V> KDTree<N, V> {
    /// Create an empty tree of `k` dimensions that never rebalances automatically.
    ///
    /// Panics if `k` is zero.
    pub fn new(k: usize) -> Self {
        KDTreeBuilder::new(k).finish()
    }

    /// Create an empty tree of `k` dimensions that is rebuilt after every `factor` insertions and
    /// deletions. A factor of `0` disables automatic rebalancing.
    ///
    /// Panics if `k` is zero.
    pub fn with_rebalance_factor(k: usize, factor: usize) -> Self {
        KDTreeBuilder::new(k).rebalance_factor(factor).finish()
    }

    /// The number of structural operations after which the tree is rebuilt, if any.
    pub fn rebalance_factor(&self) -> Option<NonZeroUsize> {
        self.rebalance_factor
    }

    /// The number of structural operations (successful insertions and deletions) performed so
    /// far.
    pub fn ops_count(&self) -> usize {
        self.ops_count
    }

    /// The number of times the tree has been rebuilt, automatically or through
    /// [`rebalance`][KDTree::rebalance].
    pub fn num_rebalances(&self) -> usize {
        self.num_rebalances
    }

    /// Insert a new point.
    ///
    /// Fails with [`KDIndexError::BadKeyLength`] if `key` does not have `k` coordinates and with
    /// [`KDIndexError::DuplicateKey`] if the point is already present. The tree is untouched in
    /// both cases.
    pub fn insert(&mut self, key: &[N], value: V) -> Result<()> {
        check_key_length(self.k, key)?;
        insert_at(&mut self.root, key, value, 0, self.k)?;
        self.num_items += 1;
        trace!(?key, num_items = self.num_items, "inserted");
        self.record_structural_op();
        Ok(())
    }

    /// Replace the value stored at `key`, returning the previous value.
    ///
    /// This does not change the shape of the tree, so it never counts towards rebalancing.
    pub fn update(&mut self, key: &[N], value: V) -> Result<V> {
        check_key_length(self.k, key)?;

        let mut current = self.root.as_deref_mut();
        let mut depth = 0;
        while let Some(node) = current {
            if node.key() == key {
                return Ok(mem::replace(&mut node.value, value));
            }
            let axis = depth % self.k;
            current = if key[axis] < node.key[axis] {
                node.left.as_deref_mut()
            } else {
                node.right.as_deref_mut()
            };
            depth += 1;
        }

        Err(KDIndexError::KeyNotFound(format!("{:?}", key)))
    }

    /// Remove the point at `key`, returning its value.
    ///
    /// Deleting a point that is not in the tree is not an error: nothing changes and `None` is
    /// returned.
    pub fn delete(&mut self, key: &[N]) -> Result<Option<V>> {
        check_key_length(self.k, key)?;

        let Some((_, value)) = remove_at(&mut self.root, key, 0, self.k) else {
            return Ok(None);
        };
        self.num_items -= 1;
        trace!(?key, num_items = self.num_items, "deleted");
        self.record_structural_op();
        Ok(Some(value))
    }

    /// Rebuild the whole tree so that every node splits its subtree around the median on its
    /// axis.
    ///
    /// Every node is reallocated; the set of stored points and values is unchanged.
    pub fn rebalance(&mut self) {
        let entries = flatten(self.root.take());
        let num_items = entries.len();
        self.root = rebuild(entries, self.k);
        self.num_rebalances += 1;
        debug!(num_items, height = self.height(), "rebalanced");
    }

    /// Render the tree level by level, for debugging.
    pub fn pretty_print(&self) -> String {
        pretty_print(self.root.as_deref())
    }

    fn record_structural_op(&mut self) {
        self.ops_count += 1;
        if let Some(factor) = self.rebalance_factor {
            if self.ops_count % factor.get() == 0 {
                debug!(
                    ops_count = self.ops_count,
                    factor = factor.get(),
                    "rebalance threshold reached"
                );
                self.rebalance();
            }
        }
    }
}

impl<N: IndexableNum, V> fmt::Display for KDTree<N, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pretty_print())
    }
}

fn insert_at<N: IndexableNum, V>(
    slot: &mut Option<Box<Node<N, V>>>,
    key: &[N],
    value: V,
    depth: usize,
    k: usize,
) -> Result<()> {
    match slot {
        None => {
            *slot = Some(Box::new(Node::new(key.to_vec(), value)));
            Ok(())
        }
        Some(node) => {
            if node.key() == key {
                return Err(KDIndexError::DuplicateKey);
            }
            let axis = depth % k;
            let child = if key[axis] < node.key[axis] {
                &mut node.left
            } else {
                &mut node.right
            };
            insert_at(child, key, value, depth + 1, k)
        }
    }
}

/// Remove `key` from the subtree in `slot`, whose root sits at `depth`, and return the entry that
/// was stored there.
///
/// A matched node with children is not unlinked. It takes over the point of the node closest to
/// it on its split axis from one of its subtrees, and that donor is removed instead:
///
/// - with a right subtree, the donor is the minimum of the right subtree;
/// - otherwise the donor is the minimum of the left subtree, and what remains of the left subtree
///   is moved to the right slot. Every remaining point is at or above the donor on the split axis,
///   so it belongs on the right.
fn remove_at<N: IndexableNum, V>(
    slot: &mut Option<Box<Node<N, V>>>,
    key: &[N],
    depth: usize,
    k: usize,
) -> Option<Entry<N, V>> {
    let node = slot.as_deref_mut()?;
    let axis = depth % k;

    if node.key() != key {
        let child = if key[axis] < node.key[axis] {
            &mut node.left
        } else {
            &mut node.right
        };
        return remove_at(child, key, depth + 1, k);
    }

    if let Some(right) = node.right.as_deref() {
        let donor = find_min_coord_node(axis, depth + 1, right, k).key.clone();
        let (donor_key, donor_value) = remove_at(&mut node.right, &donor, depth + 1, k)?;
        Some(node.replace(donor_key, donor_value))
    } else if let Some(left) = node.left.as_deref() {
        let donor = find_min_coord_node(axis, depth + 1, left, k).key.clone();
        let mut subtree = node.left.take();
        let donated = remove_at(&mut subtree, &donor, depth + 1, k);
        node.right = subtree;
        let (donor_key, donor_value) = donated?;
        Some(node.replace(donor_key, donor_value))
    } else {
        let Node { key, value, .. } = *slot.take()?;
        Some((key, value))
    }
}

/// Find the node with the smallest coordinate on `target_axis` in the subtree rooted at `node`,
/// which sits at `depth`.
///
/// Where the subtree splits on `target_axis` itself only its left side can hold anything
/// smaller. Elsewhere both sides have to be searched.
pub(crate) fn find_min_coord_node<N: IndexableNum, V>(
    target_axis: usize,
    depth: usize,
    node: &Node<N, V>,
    k: usize,
) -> &Node<N, V> {
    if depth % k == target_axis {
        return match node.left_child() {
            Some(left) => find_min_coord_node(target_axis, depth + 1, left, k),
            None => node,
        };
    }

    let mut min = node;
    for child in [node.left_child(), node.right_child()].into_iter().flatten() {
        let candidate = find_min_coord_node(target_axis, depth + 1, child, k);
        if candidate.key[target_axis] < min.key[target_axis] {
            min = candidate;
        }
    }
    min
}

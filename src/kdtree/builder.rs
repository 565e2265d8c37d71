use std::cmp::Ordering;
use std::collections::VecDeque;
use std::num::NonZeroUsize;

use crate::kdtree::traversal::Node;
use crate::kdtree::KDTree;
use crate::r#type::IndexableNum;

/// A point and its value, detached from any tree.
pub(crate) type Entry<N, V> = (Vec<N>, V);

/// A builder to create a [`KDTree`].
#[derive(Debug, Clone, Copy)]
pub struct KDTreeBuilder {
    k: usize,
    rebalance_factor: Option<NonZeroUsize>,
}

impl KDTreeBuilder {
    /// Create a new builder for a tree of `k` dimensions that never rebalances automatically.
    pub fn new(k: usize) -> Self {
        assert!(k > 0, "A KDTree needs at least one dimension.");
        Self {
            k,
            rebalance_factor: None,
        }
    }

    /// Rebuild the tree after every `factor` structural operations (insertions and deletions).
    ///
    /// A factor of `0` disables automatic rebalancing.
    pub fn rebalance_factor(mut self, factor: usize) -> Self {
        self.rebalance_factor = NonZeroUsize::new(factor);
        self
    }

    /// Consume this builder, creating an empty tree.
    pub fn finish<N: IndexableNum, V>(self) -> KDTree<N, V> {
        KDTree {
            k: self.k,
            root: None,
            num_items: 0,
            ops_count: 0,
            num_rebalances: 0,
            rebalance_factor: self.rebalance_factor,
        }
    }
}

/// Tear down the subtree rooted at `root`, returning its entries in in-order sequence.
pub(crate) fn flatten<N: IndexableNum, V>(root: Option<Box<Node<N, V>>>) -> Vec<Entry<N, V>> {
    let mut entries = vec![];
    let mut stack: Vec<Box<Node<N, V>>> = vec![];
    let mut current = root;

    loop {
        while let Some(mut node) = current {
            current = node.left.take();
            stack.push(node);
        }
        let Some(mut node) = stack.pop() else {
            break;
        };
        current = node.right.take();
        let Node { key, value, .. } = *node;
        entries.push((key, value));
    }

    entries
}

/// Work left over from the breadth-first rebuild: the two halves that still have to be placed
/// below the node at `parent`.
struct Pending<N, V> {
    parent: usize,
    left: Vec<Entry<N, V>>,
    right: Vec<Entry<N, V>>,
    depth: usize,
}

/// A freshly built node, linked to its children by position in the build order.
struct Slot<N, V> {
    entry: Entry<N, V>,
    left: Option<usize>,
    right: Option<usize>,
}

/// Build a balanced tree out of `entries`.
///
/// Each level is split around the median on that level's axis. Levels are built breadth-first
/// from an explicit queue.
pub(crate) fn rebuild<N: IndexableNum, V>(
    entries: Vec<Entry<N, V>>,
    k: usize,
) -> Option<Box<Node<N, V>>> {
    if entries.is_empty() {
        return None;
    }

    let mut slots: Vec<Slot<N, V>> = Vec::with_capacity(entries.len());
    let mut queue = VecDeque::new();

    let (median, left, right) = split_at_median(entries, 0, k);
    slots.push(Slot::new(median));
    queue.push_back(Pending {
        parent: 0,
        left,
        right,
        depth: 1,
    });

    while let Some(Pending {
        parent,
        left,
        right,
        depth,
    }) = queue.pop_front()
    {
        if !left.is_empty() {
            let (median, l, r) = split_at_median(left, depth, k);
            slots[parent].left = Some(slots.len());
            queue.push_back(Pending {
                parent: slots.len(),
                left: l,
                right: r,
                depth: depth + 1,
            });
            slots.push(Slot::new(median));
        }
        if !right.is_empty() {
            let (median, l, r) = split_at_median(right, depth, k);
            slots[parent].right = Some(slots.len());
            queue.push_back(Pending {
                parent: slots.len(),
                left: l,
                right: r,
                depth: depth + 1,
            });
            slots.push(Slot::new(median));
        }
    }

    // Children always come after their parent in build order, so linking from the back only ever
    // needs nodes that are already complete.
    let mut built: Vec<Option<Box<Node<N, V>>>> = Vec::with_capacity(slots.len());
    built.resize_with(slots.len(), || None);
    while let Some(slot) = slots.pop() {
        let (key, value) = slot.entry;
        let mut node = Node::new(key, value);
        node.left = slot.left.and_then(|i| built[i].take());
        node.right = slot.right.and_then(|i| built[i].take());
        built[slots.len()] = Some(Box::new(node));
    }
    built.swap_remove(0)
}

impl<N, V> Slot<N, V> {
    fn new(entry: Entry<N, V>) -> Self {
        Self {
            entry,
            left: None,
            right: None,
        }
    }
}

/// Pick the median of `entries` on the axis for `depth`, and split everything else around it.
fn split_at_median<N: IndexableNum, V>(
    mut entries: Vec<Entry<N, V>>,
    depth: usize,
    k: usize,
) -> (Entry<N, V>, Vec<Entry<N, V>>, Vec<Entry<N, V>>) {
    let axis = depth % k;
    let high = entries.len() - 1;
    let target = entries.len() / 2;
    let m = quick_select(&mut entries, 0, high, target, axis);
    get_left_right_nodes(entries, m, axis)
}

/// Lomuto quickselect: reorder `entries[low..=high]` until the entry of rank `target` on `axis`
/// is in place, and return its index.
///
/// When several entries share the median's coordinate, the leftmost of that run is returned so
/// the choice does not depend on where the pivot happened to land.
pub(crate) fn quick_select<N: IndexableNum, V>(
    entries: &mut [Entry<N, V>],
    mut low: usize,
    mut high: usize,
    target: usize,
    axis: usize,
) -> usize {
    loop {
        if low == high {
            return low;
        }

        let pivot = entries[high].0[axis];
        let mut j = low;
        for i in low..high {
            if entries[i].0[axis] < pivot {
                entries.swap(i, j);
                j += 1;
            }
        }
        entries.swap(j, high);

        match j.cmp(&target) {
            Ordering::Equal => {
                while j > 0 && entries[j - 1].0[axis] == entries[j].0[axis] {
                    j -= 1;
                }
                return j;
            }
            Ordering::Less => low = j + 1,
            Ordering::Greater => high = j - 1,
        }
    }
}

/// Take out the entry at `median` and partition the rest into those strictly below it on `axis`
/// and those at or above it. Relative order is kept on both sides.
pub(crate) fn get_left_right_nodes<N: IndexableNum, V>(
    mut entries: Vec<Entry<N, V>>,
    median: usize,
    axis: usize,
) -> (Entry<N, V>, Vec<Entry<N, V>>, Vec<Entry<N, V>>) {
    let median = entries.remove(median);
    let split = median.0[axis];
    let (left, right) = entries
        .into_iter()
        .partition(|(key, _)| key[axis] < split);
    (median, left, right)
}

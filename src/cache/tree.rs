//! AVL Tree Module
//!
//! A self-balancing binary search tree of cache entries. Supports O(log n)
//! point lookups and O(n) predicate scans from the same structure.
//!
//! Mutations are written as ownership-transferring recursive functions: each
//! takes a subtree by value and returns its (possibly new) root, rebalancing
//! on the way back up the mutation path.

use std::cmp::Ordering;

use crate::cache::CacheEntry;
use crate::error::{CacheError, Result};

type Link<V> = Option<Box<Node<V>>>;

#[derive(Debug)]
struct Node<V> {
    entry: CacheEntry<V>,
    /// Height of the subtree rooted here; a leaf is 1
    height: usize,
    left: Link<V>,
    right: Link<V>,
}

impl<V> Node<V> {
    fn leaf(entry: CacheEntry<V>) -> Box<Self> {
        Box::new(Self {
            entry,
            height: 1,
            left: None,
            right: None,
        })
    }
}

// == Query ==
/// Selects the traversal strategy used by [`AvlTree::find`].
pub enum Query<'a, V> {
    /// Binary-search descent to the entry with this key
    Key(i64),
    /// Full traversal collecting every entry that satisfies the predicate
    Scan(&'a dyn Fn(&CacheEntry<V>) -> bool),
}

// == AVL Tree ==
/// Self-balancing binary search tree keyed by `i64`.
///
/// Keys are unique. After every insert or delete, each node's balance factor
/// is in {-1, 0, 1}.
#[derive(Debug)]
pub struct AvlTree<V> {
    root: Link<V>,
    len: usize,
    rotations: u64,
}

impl<V> Default for AvlTree<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V> AvlTree<V> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self {
            root: None,
            len: 0,
            rotations: 0,
        }
    }

    /// Number of entries in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the tree holds no entries.
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        height(&self.root)
    }

    /// Total rotations performed since the tree was created.
    pub fn rotations(&self) -> u64 {
        self.rotations
    }

    // == Insert ==
    /// Inserts an entry.
    ///
    /// Fails with `DuplicateKey` and leaves the tree unchanged if the key is
    /// already present.
    pub fn insert(&mut self, entry: CacheEntry<V>) -> Result<()> {
        if self.get(entry.key).is_some() {
            return Err(CacheError::DuplicateKey(entry.key));
        }

        self.root = Some(insert_node(self.root.take(), entry, &mut self.rotations));
        self.len += 1;
        Ok(())
    }

    // == Find ==
    /// Runs a query against the tree.
    ///
    /// `Query::Key` descends by key comparison and yields at most one entry.
    /// `Query::Scan` visits every node once and yields matches in key order.
    /// An empty tree reports `EmptyStore`.
    pub fn find(&self, query: Query<'_, V>) -> Result<Vec<&CacheEntry<V>>> {
        if self.is_empty() {
            return Err(CacheError::EmptyStore);
        }

        match query {
            Query::Key(key) => Ok(self.get(key).into_iter().collect()),
            Query::Scan(predicate) => {
                let mut matches = Vec::new();
                collect_matches(&self.root, predicate, &mut matches);
                Ok(matches)
            }
        }
    }

    /// Point lookup by key.
    pub fn get(&self, key: i64) -> Option<&CacheEntry<V>> {
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            current = match key.cmp(&node.entry.key) {
                Ordering::Less => node.left.as_deref(),
                Ordering::Greater => node.right.as_deref(),
                Ordering::Equal => return Some(&node.entry),
            };
        }
        None
    }

    /// Point lookup returning a mutable entry.
    ///
    /// Only metadata and value may be changed through the reference; the key
    /// must stay as is to keep the ordering intact.
    pub fn find_mut(&mut self, key: i64) -> Option<&mut CacheEntry<V>> {
        let mut current = self.root.as_deref_mut();
        while let Some(node) = current {
            match key.cmp(&node.entry.key) {
                Ordering::Less => current = node.left.as_deref_mut(),
                Ordering::Greater => current = node.right.as_deref_mut(),
                Ordering::Equal => return Some(&mut node.entry),
            }
        }
        None
    }

    // == Delete ==
    /// Removes the entry with `key`, returning it if it was present.
    ///
    /// Deleting from an empty tree or deleting a missing key is a no-op.
    pub fn delete(&mut self, key: i64) -> Option<CacheEntry<V>> {
        if self.root.is_none() {
            return None;
        }

        let (root, removed) = delete_node(self.root.take(), key, &mut self.rotations);
        self.root = root;
        if removed.is_some() {
            self.len -= 1;
        }
        removed
    }

    /// Deletes each key in turn, rebalancing after every removal.
    ///
    /// Returns the number of entries actually removed.
    pub fn delete_range(&mut self, keys: &[i64]) -> Result<usize> {
        if keys.is_empty() {
            return Err(CacheError::InvalidArgument(
                "Nothing to delete from tree".to_string(),
            ));
        }

        Ok(keys
            .iter()
            .filter(|key| self.delete(**key).is_some())
            .count())
    }

    // == Diagnostics ==
    /// Keys in ascending order.
    pub fn keys(&self) -> Vec<i64> {
        let mut keys = Vec::with_capacity(self.len);
        in_order(&self.root, &mut |node| keys.push(node.entry.key));
        keys
    }

    /// Balance factor of every node, in key order.
    pub fn balance_factors(&self) -> Vec<(i64, isize)> {
        let mut factors = Vec::with_capacity(self.len);
        in_order(&self.root, &mut |node| {
            factors.push((node.entry.key, balance_factor(node)))
        });
        factors
    }

    /// Checks ordering, balance and cached heights across the whole tree.
    pub fn validate(&self) -> Result<()> {
        let (_, count) = validate_node(&self.root, None, None)?;
        if count != self.len {
            return Err(CacheError::Internal(format!(
                "Tree holds {} nodes but tracks {}",
                count, self.len
            )));
        }
        Ok(())
    }
}

// == Structural Helpers ==

fn height<V>(link: &Link<V>) -> usize {
    link.as_ref().map_or(0, |node| node.height)
}

fn update_height<V>(node: &mut Node<V>) {
    node.height = 1 + height(&node.left).max(height(&node.right));
}

fn balance_factor<V>(node: &Node<V>) -> isize {
    height(&node.left) as isize - height(&node.right) as isize
}

fn rotate_left<V>(mut node: Box<Node<V>>, rotations: &mut u64) -> Box<Node<V>> {
    let Some(mut pivot) = node.right.take() else {
        return node;
    };
    node.right = pivot.left.take();
    update_height(&mut node);
    pivot.left = Some(node);
    update_height(&mut pivot);
    *rotations += 1;
    pivot
}

fn rotate_right<V>(mut node: Box<Node<V>>, rotations: &mut u64) -> Box<Node<V>> {
    let Some(mut pivot) = node.left.take() else {
        return node;
    };
    node.left = pivot.right.take();
    update_height(&mut node);
    pivot.right = Some(node);
    update_height(&mut pivot);
    *rotations += 1;
    pivot
}

/// Restores the AVL invariant at `node`, assuming both children are balanced.
fn rebalance<V>(mut node: Box<Node<V>>, rotations: &mut u64) -> Box<Node<V>> {
    update_height(&mut node);
    let factor = balance_factor(&node);

    if factor < -1 {
        // RL case
        if node.right.as_deref().map_or(0, balance_factor) > 0 {
            node.right = node.right.take().map(|right| rotate_right(right, rotations));
        }
        return rotate_left(node, rotations);
    }

    if factor > 1 {
        // LR case
        if node.left.as_deref().map_or(0, balance_factor) < 0 {
            node.left = node.left.take().map(|left| rotate_left(left, rotations));
        }
        return rotate_right(node, rotations);
    }

    node
}

fn insert_node<V>(link: Link<V>, entry: CacheEntry<V>, rotations: &mut u64) -> Box<Node<V>> {
    let Some(mut node) = link else {
        return Node::leaf(entry);
    };

    if entry.key < node.entry.key {
        node.left = Some(insert_node(node.left.take(), entry, rotations));
    } else {
        node.right = Some(insert_node(node.right.take(), entry, rotations));
    }

    rebalance(node, rotations)
}

fn delete_node<V>(
    link: Link<V>,
    key: i64,
    rotations: &mut u64,
) -> (Link<V>, Option<CacheEntry<V>>) {
    let Some(mut node) = link else {
        return (None, None);
    };

    match key.cmp(&node.entry.key) {
        Ordering::Less => {
            let (left, removed) = delete_node(node.left.take(), key, rotations);
            node.left = left;
            (Some(rebalance(node, rotations)), removed)
        }
        Ordering::Greater => {
            let (right, removed) = delete_node(node.right.take(), key, rotations);
            node.right = right;
            (Some(rebalance(node, rotations)), removed)
        }
        Ordering::Equal => match (node.left.take(), node.right.take()) {
            (None, None) => (None, Some(node.entry)),
            (Some(child), None) | (None, Some(child)) => (Some(child), Some(node.entry)),
            (Some(left), Some(right)) => {
                // In-order successor takes this node's place
                let (right, successor) = take_min(right, rotations);
                let removed = std::mem::replace(&mut node.entry, successor);
                node.left = Some(left);
                node.right = right;
                (Some(rebalance(node, rotations)), Some(removed))
            }
        },
    }
}

/// Detaches the minimum entry of a subtree by leftmost descent.
fn take_min<V>(mut node: Box<Node<V>>, rotations: &mut u64) -> (Link<V>, CacheEntry<V>) {
    match node.left.take() {
        None => {
            let Node { entry, right, .. } = *node;
            (right, entry)
        }
        Some(left) => {
            let (left, min) = take_min(left, rotations);
            node.left = left;
            (Some(rebalance(node, rotations)), min)
        }
    }
}

// == Traversal ==

fn collect_matches<'a, V>(
    link: &'a Link<V>,
    predicate: &dyn Fn(&CacheEntry<V>) -> bool,
    matches: &mut Vec<&'a CacheEntry<V>>,
) {
    if let Some(node) = link {
        collect_matches(&node.left, predicate, matches);
        if predicate(&node.entry) {
            matches.push(&node.entry);
        }
        collect_matches(&node.right, predicate, matches);
    }
}

fn in_order<V>(link: &Link<V>, visit: &mut dyn FnMut(&Node<V>)) {
    if let Some(node) = link {
        in_order(&node.left, visit);
        visit(node);
        in_order(&node.right, visit);
    }
}

/// Returns (height, node count) of a valid subtree whose keys lie strictly
/// between `lower` and `upper`.
fn validate_node<V>(
    link: &Link<V>,
    lower: Option<i64>,
    upper: Option<i64>,
) -> Result<(usize, usize)> {
    let Some(node) = link else {
        return Ok((0, 0));
    };
    let key = node.entry.key;

    if lower.is_some_and(|lo| key <= lo) || upper.is_some_and(|hi| key >= hi) {
        return Err(CacheError::Internal(format!(
            "Key {} violates search order",
            key
        )));
    }

    let (left_height, left_count) = validate_node(&node.left, lower, Some(key))?;
    let (right_height, right_count) = validate_node(&node.right, Some(key), upper)?;

    if left_height.abs_diff(right_height) > 1 {
        return Err(CacheError::Internal(format!(
            "Node {} is unbalanced ({} vs {})",
            key, left_height, right_height
        )));
    }

    let actual = 1 + left_height.max(right_height);
    if actual != node.height {
        return Err(CacheError::Internal(format!(
            "Node {} caches height {} but has height {}",
            key, node.height, actual
        )));
    }

    Ok((actual, 1 + left_count + right_count))
}

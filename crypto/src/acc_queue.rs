//! Accumulator queue for trees that are filled in batches.
//!
//! Leaves are gathered into subtrees of `arity^sub_depth` leaves. Each full
//! subtree is reduced to its root as soon as its last leaf arrives, so only
//! one partially filled path is kept per level. When enqueueing is over the
//! subtree roots are merged, optionally over several calls, into a small
//! tree whose root can be extended with zero subtrees to any larger depth.

use std::collections::BTreeMap;

use tracing::debug;

use crate::error::{CryptoError, TreeError};
use crate::tree::{capacity_for, zeros_for, Arity, IncrementalQuinTree};
use crate::Fr;

pub const MAX_DEPTH: usize = 32;

/// Pushes `node` into the bottom level of `levels`, hashing every level that
/// becomes full into the one above. Returns the root once the top level
/// completes.
fn push_node(levels: &mut [Vec<Fr>], arity: Arity, node: Fr) -> Result<Option<Fr>, CryptoError> {
    let mut current = node;
    for level in levels.iter_mut() {
        if level.len() + 1 < arity.width() {
            level.push(current);
            return Ok(None);
        }
        let mut children = level.clone();
        children.push(current);
        current = arity.hash(&children)?;
        level.clear();
    }
    Ok(Some(current))
}

/// Root of the partially filled subtree held in `levels`, with the missing
/// nodes of level `i` taken from `zeros[i]`. Empties `levels`.
fn close_levels(levels: &mut [Vec<Fr>], arity: Arity, zeros: &[Fr]) -> Result<Option<Fr>, CryptoError> {
    let mut carry: Option<Fr> = None;
    for (level, pending) in levels.iter_mut().enumerate() {
        let mut children = std::mem::take(pending);
        children.extend(carry);
        if children.is_empty() {
            continue;
        }
        children.resize(arity.width(), zeros[level]);
        carry = Some(arity.hash(&children)?);
    }
    Ok(carry)
}

/// Smallest `d >= 1` with `arity^d >= num_leaves`.
fn depth_for(arity: Arity, num_leaves: usize) -> usize {
    let mut depth = 1;
    let mut capacity = arity.width();
    while capacity < num_leaves {
        depth += 1;
        capacity = capacity.saturating_mul(arity.width());
    }
    depth
}

#[derive(Clone, Debug)]
pub struct AccQueue {
    sub_depth: usize,
    arity: Arity,
    zero_value: Fr,
    // zeros[i] is the root of an empty subtree of depth i
    zeros: Vec<Fr>,
    num_leaves: usize,
    // pending nodes of the current subtree, one row per level below its root
    leaf_queue: Vec<Vec<Fr>>,
    sub_roots: Vec<Fr>,
    // progress of a batched merge of the subtree roots
    next_sub_root: usize,
    sub_root_queue: Vec<Vec<Fr>>,
    small_root: Option<Fr>,
    main_roots: BTreeMap<usize, Fr>,
}

impl AccQueue {
    pub fn new(sub_depth: usize, arity: Arity, zero_value: Fr) -> Result<Self, CryptoError> {
        if sub_depth == 0 || sub_depth > MAX_DEPTH {
            return Err(TreeError::InvalidDepth(sub_depth).into());
        }
        capacity_for(sub_depth, arity)?;
        let zeros = zeros_for(MAX_DEPTH, zero_value, arity)?;

        Ok(AccQueue {
            sub_depth,
            arity,
            zero_value,
            zeros,
            num_leaves: 0,
            leaf_queue: vec![Vec::new(); sub_depth],
            sub_roots: Vec::new(),
            next_sub_root: 0,
            sub_root_queue: Vec::new(),
            small_root: None,
            main_roots: BTreeMap::new(),
        })
    }

    pub fn sub_depth(&self) -> usize {
        self.sub_depth
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn zero_value(&self) -> Fr {
        self.zero_value
    }

    pub fn zeros(&self) -> &[Fr] {
        &self.zeros
    }

    pub fn num_leaves(&self) -> usize {
        self.num_leaves
    }

    pub fn sub_roots(&self) -> &[Fr] {
        &self.sub_roots
    }

    pub fn sub_root(&self, index: usize) -> Option<Fr> {
        self.sub_roots.get(index).copied()
    }

    /// Root over all subtree roots, once [`merge_sub_roots`](Self::merge_sub_roots) has finished.
    pub fn small_root(&self) -> Option<Fr> {
        self.small_root
    }

    pub fn sub_roots_merged(&self) -> bool {
        self.small_root.is_some()
    }

    pub fn get_root(&self, depth: usize) -> Option<Fr> {
        self.main_roots.get(&depth).copied()
    }

    pub fn has_root(&self, depth: usize) -> bool {
        self.main_roots.contains_key(&depth)
    }

    pub fn hash(&self, children: &[Fr]) -> Result<Fr, CryptoError> {
        self.arity.hash(children)
    }

    fn sub_tree_capacity(&self) -> usize {
        // checked in `new`
        self.arity.width().pow(self.sub_depth as u32)
    }

    fn max_leaves(&self) -> usize {
        self.arity.width().checked_pow(MAX_DEPTH as u32).unwrap_or(usize::MAX)
    }

    // New leaves invalidate any merge done so far.
    fn reset_merge(&mut self) {
        self.next_sub_root = 0;
        self.sub_root_queue.clear();
        self.small_root = None;
    }

    /// Appends a leaf and returns its index.
    pub fn enqueue(&mut self, leaf: Fr) -> Result<usize, CryptoError> {
        if self.num_leaves >= self.max_leaves() {
            return Err(TreeError::TreeFull { capacity: self.max_leaves() }.into());
        }
        let index = self.num_leaves;
        if let Some(sub_root) = push_node(&mut self.leaf_queue, self.arity, leaf)? {
            debug!(subtree = self.sub_roots.len(), "completed subtree");
            self.sub_roots.push(sub_root);
        }
        self.num_leaves += 1;
        self.reset_merge();
        Ok(index)
    }

    /// Completes the current subtree with zero leaves. If the current
    /// subtree is empty a whole zero subtree is appended instead.
    pub fn fill(&mut self) -> Result<(), CryptoError> {
        let capacity = self.sub_tree_capacity();
        let sub_root = if self.num_leaves % capacity == 0 {
            self.zeros[self.sub_depth]
        } else {
            close_levels(&mut self.leaf_queue, self.arity, &self.zeros)?
                .ok_or(TreeError::EmptyQueue)?
        };
        self.sub_roots.push(sub_root);
        self.num_leaves = self.sub_roots.len() * capacity;
        self.reset_merge();
        Ok(())
    }

    /// Appends the root of an already built subtree of depth `sub_depth`.
    /// A partially filled current subtree is completed with zeros first.
    pub fn insert_sub_tree(&mut self, sub_root: Fr) -> Result<(), CryptoError> {
        let capacity = self.sub_tree_capacity();
        if self.num_leaves % capacity != 0 {
            self.fill()?;
        }
        if self.num_leaves + capacity > self.max_leaves() {
            return Err(TreeError::TreeFull { capacity: self.max_leaves() }.into());
        }
        self.sub_roots.push(sub_root);
        self.num_leaves += capacity;
        self.reset_merge();
        Ok(())
    }

    /// Depth of the smallest tree that holds every subtree.
    pub fn calc_srt_depth(&self) -> usize {
        let capacity = self.sub_tree_capacity();
        let needed = self.sub_roots.len().saturating_mul(capacity);
        let mut depth = self.sub_depth;
        let mut width_pow = capacity;
        while width_pow < needed {
            depth += 1;
            width_pow = width_pow.saturating_mul(self.arity.width());
        }
        depth
    }

    /// Hashes up to `num_ops` subtree roots into the small root, all of them
    /// when `num_ops` is 0. Returns whether the merge has completed; call
    /// again with the same queue to continue an unfinished one.
    pub fn merge_sub_roots(&mut self, num_ops: usize) -> Result<bool, CryptoError> {
        if self.small_root.is_some() {
            return Err(TreeError::SubRootsAlreadyMerged.into());
        }
        if self.num_leaves == 0 {
            return Err(TreeError::EmptyQueue.into());
        }
        if self.num_leaves % self.sub_tree_capacity() != 0 {
            self.fill()?;
        }
        if self.sub_roots.len() == 1 {
            self.small_root = Some(self.sub_roots[0]);
            return Ok(true);
        }

        let depth = depth_for(self.arity, self.sub_roots.len());
        if self.next_sub_root == 0 {
            self.sub_root_queue = vec![Vec::new(); depth];
        }

        let limit = if num_ops == 0 { usize::MAX } else { num_ops };
        let mut completed = None;
        for _ in 0..limit {
            let Some(&sub_root) = self.sub_roots.get(self.next_sub_root) else {
                break;
            };
            completed = push_node(&mut self.sub_root_queue, self.arity, sub_root)?;
            self.next_sub_root += 1;
        }
        if self.next_sub_root < self.sub_roots.len() {
            debug!(queued = self.next_sub_root, total = self.sub_roots.len(), "partially merged subtree roots");
            return Ok(false);
        }

        let root = match completed {
            Some(root) => root,
            None => close_levels(&mut self.sub_root_queue, self.arity, &self.zeros[self.sub_depth..])?
                .ok_or(TreeError::EmptyQueue)?,
        };
        self.small_root = Some(root);
        debug!(subtrees = self.sub_roots.len(), "merged subtree roots");
        Ok(true)
    }

    /// Computes the root of the tree of `depth` from the merged small root.
    pub fn merge(&mut self, depth: usize) -> Result<Fr, CryptoError> {
        let small_root = self.small_root.ok_or(TreeError::SubRootsNotMerged)?;
        if depth > MAX_DEPTH {
            return Err(TreeError::InvalidDepth(depth).into());
        }
        let srt_depth = self.calc_srt_depth();
        if depth < srt_depth {
            return Err(TreeError::DepthTooSmall { depth, required: srt_depth }.into());
        }

        let mut root = small_root;
        for level in srt_depth..depth {
            let mut children = vec![self.zeros[level]; self.arity.width()];
            children[0] = root;
            root = self.arity.hash(&children)?;
        }
        self.main_roots.insert(depth, root);
        Ok(root)
    }

    /// Computes the root of the tree of `depth` in one go by inserting every
    /// subtree root into an [`IncrementalQuinTree`].
    pub fn merge_direct(&mut self, depth: usize) -> Result<Fr, CryptoError> {
        if self.num_leaves == 0 {
            return Err(TreeError::EmptyQueue.into());
        }
        if depth > MAX_DEPTH {
            return Err(TreeError::InvalidDepth(depth).into());
        }
        if self.num_leaves % self.sub_tree_capacity() != 0 {
            self.fill()?;
        }
        let srt_depth = self.calc_srt_depth();
        if depth < srt_depth {
            return Err(TreeError::DepthTooSmall { depth, required: srt_depth }.into());
        }

        let root = if depth == self.sub_depth {
            self.sub_roots[0]
        } else {
            let mut tree = IncrementalQuinTree::new(
                depth - self.sub_depth,
                self.zeros[self.sub_depth],
                self.arity,
            )?;
            for sub_root in self.sub_roots.iter() {
                tree.insert(*sub_root)?;
            }
            tree.root()
        };
        self.main_roots.insert(depth, root);
        Ok(root)
    }
}

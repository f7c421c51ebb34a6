//! Append-only incremental Merkle tree with arity 2 or 5.
//!
//! Nodes are cached per level, so inserting or updating a leaf rehashes one
//! path of `depth` nodes. Empty positions take the zero value of their level,
//! which makes the root match a from-scratch computation over the same leaves
//! (see [`calc_root`]).

use ark_ff::{MontFp, Zero};
use tracing::{debug, warn};

use crate::error::{CryptoError, TreeError};
use crate::hashing::{hash5, hash_left_right};
use crate::Fr;

/// `keccak256("Maci") mod r`. Zero leaf of the message trees; nobody can
/// produce a message that hashes to it.
pub const NOTHING_UP_MY_SLEEVE: Fr =
    MontFp!("8370432830353022751713833565135785980866757267633941821328460903436894336785");

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Arity {
    Binary,
    Quinary,
}

impl Arity {
    pub fn from_width(width: usize) -> Result<Self, TreeError> {
        match width {
            2 => Ok(Arity::Binary),
            5 => Ok(Arity::Quinary),
            other => Err(TreeError::InvalidArity(other)),
        }
    }

    pub fn width(&self) -> usize {
        match self {
            Arity::Binary => 2,
            Arity::Quinary => 5,
        }
    }

    /// Hashes one group of sibling nodes into their parent.
    pub fn hash(&self, children: &[Fr]) -> Result<Fr, CryptoError> {
        if children.len() != self.width() {
            return Err(CryptoError::InvalidLength {
                expected: self.width(),
                actual: children.len(),
            });
        }
        match self {
            Arity::Binary => hash_left_right(&children[0], &children[1]),
            Arity::Quinary => hash5(children),
        }
    }
}

/// Siblings and positions from a leaf up to the root.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MerklePath {
    /// `arity - 1` siblings per level, bottom level first.
    pub path_elements: Vec<Vec<Fr>>,
    /// Position of the node among its siblings, per level.
    pub path_indices: Vec<usize>,
}

#[derive(Clone, Debug)]
pub struct IncrementalQuinTree {
    depth: usize,
    arity: Arity,
    zero_value: Fr,
    next_index: usize,
    capacity: usize,
    // zeros[i] is the value of an empty subtree rooted at level i
    zeros: Vec<Fr>,
    // nodes[0] are the leaves, nodes[depth - 1] are the children of the root
    nodes: Vec<Vec<Fr>>,
    root: Fr,
}

pub(crate) fn zeros_for(depth: usize, zero_value: Fr, arity: Arity) -> Result<Vec<Fr>, CryptoError> {
    let mut zeros = Vec::with_capacity(depth + 1);
    zeros.push(zero_value);
    for level in 0..depth {
        let children = vec![zeros[level]; arity.width()];
        zeros.push(arity.hash(&children)?);
    }
    Ok(zeros)
}

pub(crate) fn capacity_for(depth: usize, arity: Arity) -> Result<usize, TreeError> {
    if depth == 0 {
        return Err(TreeError::InvalidDepth(depth));
    }
    u32::try_from(depth)
        .ok()
        .and_then(|d| arity.width().checked_pow(d))
        .ok_or(TreeError::InvalidDepth(depth))
}

impl IncrementalQuinTree {
    pub fn new(depth: usize, zero_value: Fr, arity: Arity) -> Result<Self, CryptoError> {
        let capacity = capacity_for(depth, arity)?;
        let zeros = zeros_for(depth, zero_value, arity)?;
        let root = zeros[depth];
        debug!(depth, width = arity.width(), capacity, "created incremental tree");

        Ok(IncrementalQuinTree {
            depth,
            arity,
            zero_value,
            next_index: 0,
            capacity,
            zeros,
            nodes: vec![Vec::new(); depth],
            root,
        })
    }

    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn arity(&self) -> Arity {
        self.arity
    }

    pub fn zero_value(&self) -> Fr {
        self.zero_value
    }

    pub fn root(&self) -> Fr {
        self.root
    }

    pub fn next_index(&self) -> usize {
        self.next_index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn zeros(&self) -> &[Fr] {
        &self.zeros
    }

    pub fn leaves(&self) -> &[Fr] {
        &self.nodes[0]
    }

    pub fn leaf(&self, index: usize) -> Option<Fr> {
        self.nodes[0].get(index).copied()
    }

    fn node(&self, level: usize, index: usize) -> Fr {
        self.nodes[level]
            .get(index)
            .copied()
            .unwrap_or(self.zeros[level])
    }

    fn set_node(&mut self, level: usize, index: usize, value: Fr) {
        let zero = self.zeros[level];
        let row = &mut self.nodes[level];
        if index >= row.len() {
            row.resize(index + 1, zero);
        }
        row[index] = value;
    }

    // New values of every ancestor of `index` if the leaf there were `leaf`,
    // from level 1 up to the root. Nothing is written.
    fn staged_ancestors(&self, index: usize, leaf: Fr) -> Result<Vec<Fr>, CryptoError> {
        let width = self.arity.width();
        let mut values = Vec::with_capacity(self.depth);
        let mut current = leaf;
        let mut idx = index;

        for level in 0..self.depth {
            let start = (idx / width) * width;
            let children: Vec<Fr> = (start..start + width)
                .map(|i| if i == idx { current } else { self.node(level, i) })
                .collect();
            current = self.arity.hash(&children)?;
            values.push(current);
            idx /= width;
        }
        Ok(values)
    }

    fn commit(&mut self, index: usize, leaf: Fr, ancestors: Vec<Fr>) {
        let width = self.arity.width();
        self.set_node(0, index, leaf);

        let mut idx = index;
        for (i, value) in ancestors.into_iter().enumerate() {
            let level = i + 1;
            idx /= width;
            if level == self.depth {
                self.root = value;
            } else {
                self.set_node(level, idx, value);
            }
        }
    }

    pub fn insert(&mut self, leaf: Fr) -> Result<(), CryptoError> {
        if self.next_index >= self.capacity {
            return Err(TreeError::TreeFull { capacity: self.capacity }.into());
        }
        let index = self.next_index;
        let ancestors = self.staged_ancestors(index, leaf)?;
        self.commit(index, leaf, ancestors);
        self.next_index += 1;
        debug!(index, "inserted leaf");
        Ok(())
    }

    /// Replaces the leaf at `index`, checking the stored path first.
    pub fn update(&mut self, index: usize, leaf: Fr) -> Result<(), CryptoError> {
        let path = self.gen_merkle_path(index)?;
        self.update_with_path(index, leaf, &path)
    }

    /// Replaces the leaf at `index`. The supplied path together with the
    /// current leaf must reproduce the current root and point at `index`,
    /// otherwise the tree is left untouched.
    pub fn update_with_path(
        &mut self,
        index: usize,
        leaf: Fr,
        path: &MerklePath,
    ) -> Result<(), CryptoError> {
        if index >= self.next_index {
            return Err(TreeError::IndexOutOfBounds { index, next_index: self.next_index }.into());
        }

        let current = self.node(0, index);
        let arity = self.arity;
        let hash_fn = move |children: &[Fr]| arity.hash(children);
        let points_at_index = path.path_indices == self.index_digits(index);
        if !points_at_index || !verify_merkle_path(&current, path, hash_fn, self.depth, &self.root) {
            warn!(index, "rejected update with a stale or foreign merkle path");
            return Err(TreeError::PathMismatch { index }.into());
        }

        let ancestors = self.staged_ancestors(index, leaf)?;
        self.commit(index, leaf, ancestors);
        debug!(index, "updated leaf");
        Ok(())
    }

    fn index_digits(&self, index: usize) -> Vec<usize> {
        let width = self.arity.width();
        let mut idx = index;
        (0..self.depth)
            .map(|_| {
                let digit = idx % width;
                idx /= width;
                digit
            })
            .collect()
    }

    pub fn gen_merkle_path(&self, index: usize) -> Result<MerklePath, CryptoError> {
        if index >= self.next_index {
            return Err(TreeError::IndexOutOfBounds { index, next_index: self.next_index }.into());
        }
        let width = self.arity.width();
        let mut path_elements = Vec::with_capacity(self.depth);
        let mut path_indices = Vec::with_capacity(self.depth);
        let mut idx = index;

        for level in 0..self.depth {
            let start = (idx / width) * width;
            let siblings: Vec<Fr> = (start..start + width)
                .filter(|&i| i != idx)
                .map(|i| self.node(level, i))
                .collect();
            path_elements.push(siblings);
            path_indices.push(idx % width);
            idx /= width;
        }

        Ok(MerklePath { path_elements, path_indices })
    }
}

/// Recomputes a root from a leaf and its path.
///
/// At each level the running hash is placed at `path_indices[i]` among that
/// level's siblings. A path of the wrong shape yields `false`.
pub fn verify_merkle_path<H>(
    leaf: &Fr,
    path: &MerklePath,
    hash_fn: H,
    depth: usize,
    expected_root: &Fr,
) -> bool
where
    H: Fn(&[Fr]) -> Result<Fr, CryptoError>,
{
    if path.path_elements.len() != depth || path.path_indices.len() != depth {
        return false;
    }

    let mut current = *leaf;
    for (siblings, &position) in path.path_elements.iter().zip(path.path_indices.iter()) {
        if position > siblings.len() {
            return false;
        }
        let mut children = Vec::with_capacity(siblings.len() + 1);
        children.extend_from_slice(&siblings[..position]);
        children.push(current);
        children.extend_from_slice(&siblings[position..]);

        current = match hash_fn(&children) {
            Ok(h) => h,
            Err(_) => return false,
        };
    }
    current == *expected_root
}

/// Root of a tree holding `leaves`, computed level by level from scratch.
pub fn calc_root(depth: usize, zero_value: Fr, arity: Arity, leaves: &[Fr]) -> Result<Fr, CryptoError> {
    let capacity = capacity_for(depth, arity)?;
    if leaves.len() > capacity {
        return Err(TreeError::TreeFull { capacity }.into());
    }
    let zeros = zeros_for(depth, zero_value, arity)?;
    let width = arity.width();

    let mut level_nodes = leaves.to_vec();
    for level in 0..depth {
        if level_nodes.is_empty() {
            return Ok(zeros[depth]);
        }
        let mut parents = Vec::with_capacity(level_nodes.len().div_ceil(width));
        for chunk in level_nodes.chunks(width) {
            let mut children = chunk.to_vec();
            children.resize(width, zeros[level]);
            parents.push(arity.hash(&children)?);
        }
        level_nodes = parents;
    }
    Ok(level_nodes.first().copied().unwrap_or(zeros[depth]))
}

/// Salted commitment to `leaves`: the root of a quinary tree of `depth`
/// with zero leaves, hashed with `salt`.
pub fn gen_tree_commitment(leaves: &[Fr], salt: &Fr, depth: usize) -> Result<Fr, CryptoError> {
    let root = calc_root(depth, Fr::zero(), Arity::Quinary, leaves)?;
    hash_left_right(&root, salt)
}

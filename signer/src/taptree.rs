// Modern, minimalistic & standard-compliant cold wallet library.
//
// SPDX-License-Identifier: Apache-2.0
//
// Written in 2020-2024 by
//     Dr Maxim Orlovsky <orlovsky@lnp-bp.org>
//
// Copyright (C) 2020-2024 LNP/BP Standards Association. All rights reserved.
// Copyright (C) 2020-2024 Dr Maxim Orlovsky. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Taproot script trees: depth-first leaf builder, merkle root and path computation, output key
//! derivation and control blocks for the tree leaves.

use std::ops::{Deref, Range};
use std::{slice, vec};

use bc::{
    ControlBlock, ErrorKind, InternalPk, LeafScript, OutputPk, Parity, ScriptPubkey,
    TapBranchHash, TapLeafHash, TapMerklePath, TapNodeHash, TapScript, TAPROOT_MAX_DEPTH,
};

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error, From)]
#[display(doc_comments)]
pub enum InvalidTree {
    /// {0}
    #[from]
    Unfinalized(UnfinalizedTree),

    /// tap tree contains too many script leaves which doesn't fit a single Merkle tree.
    #[from(FinalizedTree)]
    MountainRange,

    /// tap tree leaf depth {0} exceeds the maximum depth of 128.
    TooDeep(u8),

    /// tap tree leaf at depth {depth} can't follow a subtree left unfinished at depth {pending};
    /// leaves must be provided in depth-first order.
    Misordered { depth: u8, pending: u8 },

    /// tap tree must contain at least one leaf.
    Empty,
}

impl InvalidTree {
    pub fn kind(&self) -> ErrorKind { ErrorKind::InvalidTree }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display("can't add more leaves to an already finalized tap tree")]
pub struct FinalizedTree;

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display(
    "unfinalized tap tree containing leaves at level {0} which can't commit into a single Merkle \
     root"
)]
pub struct UnfinalizedTree(pub u8);

/// Builder accepting leaves in depth-first order, each with its depth in the tree.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct TapTreeBuilder {
    leaves: Vec<LeafInfo>,
    /// Depths of the subtrees which are not yet merged into their parents.
    buoy: Vec<u8>,
    finalized: bool,
}

impl TapTreeBuilder {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            leaves: Vec::with_capacity(capacity),
            buoy: empty!(),
            finalized: false,
        }
    }

    pub fn is_finalized(&self) -> bool { self.finalized }

    /// Adds next leaf, returning whether the tree became complete.
    pub fn push_leaf(&mut self, leaf: LeafInfo) -> Result<bool, InvalidTree> {
        if self.finalized {
            return Err(FinalizedTree.into());
        }
        let depth = leaf.depth;
        if depth as usize > TAPROOT_MAX_DEPTH {
            return Err(InvalidTree::TooDeep(depth));
        }
        if let Some(&pending) = self.buoy.last() {
            if depth < pending {
                return Err(InvalidTree::Misordered { depth, pending });
            }
        }

        self.leaves.push(leaf);
        let mut level = depth;
        while self.buoy.last() == Some(&level) && level > 0 {
            self.buoy.pop();
            level -= 1;
        }
        self.buoy.push(level);

        if self.buoy == [0] {
            self.finalized = true
        }
        Ok(self.finalized)
    }

    pub fn finish(self) -> Result<TapTree, InvalidTree> {
        if self.leaves.is_empty() {
            return Err(InvalidTree::Empty);
        }
        if !self.finalized {
            let level = self.buoy.last().copied().unwrap_or_default();
            return Err(UnfinalizedTree(level).into());
        }
        Ok(TapTree(self.leaves))
    }
}

/// Non-empty taproot script tree.
///
/// Leaves are kept in depth-first order, which is also the order of their control blocks.
#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(feature = "serde", derive(Serialize), serde(crate = "serde_crate", transparent))]
pub struct TapTree(Vec<LeafInfo>);

impl Deref for TapTree {
    type Target = Vec<LeafInfo>;
    fn deref(&self) -> &Self::Target { &self.0 }
}

impl IntoIterator for TapTree {
    type Item = LeafInfo;
    type IntoIter = vec::IntoIter<LeafInfo>;

    fn into_iter(self) -> Self::IntoIter { self.0.into_iter() }
}

impl<'a> IntoIterator for &'a TapTree {
    type Item = &'a LeafInfo;
    type IntoIter = slice::Iter<'a, LeafInfo>;

    fn into_iter(self) -> Self::IntoIter { self.0.iter() }
}

impl TapTree {
    pub fn with_single_leaf(leaf: impl Into<LeafScript>) -> TapTree {
        Self(vec![LeafInfo {
            depth: 0,
            script: leaf.into(),
        }])
    }

    /// Constructs balanced tree from an ordered list of leaf scripts. With an odd number of
    /// leaves in a subtree the left branch gets the extra leaf.
    pub fn with_leaves<L: Into<LeafScript>>(
        leaves: impl IntoIterator<Item = L>,
    ) -> Result<Self, InvalidTree> {
        let scripts = leaves.into_iter().map(L::into).collect::<Vec<_>>();
        if scripts.is_empty() {
            return Err(InvalidTree::Empty);
        }
        let mut depths = Vec::with_capacity(scripts.len());
        balanced_depths(scripts.len(), 0, &mut depths);
        Self::from_leaves(
            depths.into_iter().zip(scripts).map(|(depth, script)| LeafInfo { depth, script }),
        )
    }

    pub fn from_leaves(leaves: impl IntoIterator<Item = LeafInfo>) -> Result<Self, InvalidTree> {
        let mut builder = TapTreeBuilder::new();
        for leaf in leaves {
            builder.push_leaf(leaf)?;
        }
        builder.finish()
    }

    pub fn from_builder(builder: TapTreeBuilder) -> Result<Self, InvalidTree> { builder.finish() }

    pub fn merkle_root(&self) -> TapNodeHash { self.fold().0 }

    /// Merkle paths for each of the leaves, in the leaf order.
    pub fn merkle_paths(&self) -> Vec<TapMerklePath> {
        self.fold()
            .1
            .into_iter()
            .map(|path| {
                TapMerklePath::try_from(path).expect("tree depth is bounded by the builder")
            })
            .collect()
    }

    /// Position of the leaf in the tree, if present.
    pub fn leaf_position(&self, leaf: &LeafScript) -> Option<usize> {
        self.0.iter().position(|info| &info.script == leaf)
    }

    pub fn into_vec(self) -> Vec<LeafInfo> { self.0 }

    fn fold(&self) -> (TapNodeHash, Vec<Vec<TapNodeHash>>) {
        let mut paths = vec![Vec::<TapNodeHash>::new(); self.0.len()];
        let mut stack: Vec<(u8, TapNodeHash, Range<usize>)> = Vec::with_capacity(self.0.len());

        for (no, leaf) in self.0.iter().enumerate() {
            let (mut depth, mut node, mut range) =
                (leaf.depth, TapNodeHash::from(leaf.script.tap_leaf_hash()), no..no + 1);
            while depth > 0 && matches!(stack.last(), Some((d, ..)) if *d == depth) {
                let Some((_, left, left_range)) = stack.pop() else {
                    unreachable!()
                };
                for path in &mut paths[left_range.clone()] {
                    path.push(node);
                }
                for path in &mut paths[range.clone()] {
                    path.push(left);
                }
                node = TapBranchHash::with_nodes(left, node).into();
                range = left_range.start..range.end;
                depth -= 1;
            }
            stack.push((depth, node, range));
        }

        let (_, root, _) = stack.pop().expect("finalized tree always folds into a single root");
        (root, paths)
    }
}

fn balanced_depths(count: usize, depth: u8, depths: &mut Vec<u8>) {
    if count == 1 {
        depths.push(depth);
        return;
    }
    let left = (count + 1) / 2;
    balanced_depths(left, depth + 1, depths);
    balanced_depths(count - left, depth + 1, depths);
}

#[derive(Clone, Eq, PartialEq, Hash, Debug)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize),
    serde(crate = "serde_crate", rename_all = "camelCase")
)]
pub struct LeafInfo {
    pub depth: u8,
    pub script: LeafScript,
}

impl LeafInfo {
    pub fn tap_script(depth: u8, script: TapScript) -> Self {
        LeafInfo {
            depth,
            script: LeafScript::from_tap_script(script),
        }
    }
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Display, Error)]
#[display("leaf {0} is not a part of the taproot script tree.")]
pub struct LeafNotFound(pub TapLeafHash);

impl LeafNotFound {
    pub fn kind(&self) -> ErrorKind { ErrorKind::LeafNotFound }
}

/// Taproot output: internal key with an optional script tree and the resulting tweaked key.
#[derive(Getters, Clone, Eq, PartialEq, Debug)]
pub struct TapOutput {
    #[getter(as_copy)]
    internal_pk: InternalPk,
    #[getter(skip)]
    tree: Option<TapTree>,
    #[getter(as_copy)]
    merkle_root: Option<TapNodeHash>,
    #[getter(as_copy)]
    output_pk: OutputPk,
    #[getter(as_copy)]
    parity: Parity,
}

impl TapOutput {
    pub fn key_only(internal_pk: InternalPk) -> Self { Self::with(internal_pk, None) }

    pub fn with_tree(internal_pk: InternalPk, tree: TapTree) -> Self {
        Self::with(internal_pk, Some(tree))
    }

    pub fn with(internal_pk: InternalPk, tree: Option<TapTree>) -> Self {
        let merkle_root = tree.as_ref().map(TapTree::merkle_root);
        let (output_pk, parity) = internal_pk.to_output_pk(merkle_root);
        TapOutput {
            internal_pk,
            tree,
            merkle_root,
            output_pk,
            parity,
        }
    }

    pub fn tree(&self) -> Option<&TapTree> { self.tree.as_ref() }

    pub fn script_pubkey(&self) -> ScriptPubkey { ScriptPubkey::p2tr_tweaked(self.output_pk) }

    /// Control block proving that `leaf` is committed into the output key.
    pub fn control_block(&self, leaf: &LeafScript) -> Result<ControlBlock, LeafNotFound> {
        let not_found = || LeafNotFound(leaf.tap_leaf_hash());
        let tree = self.tree.as_ref().ok_or_else(not_found)?;
        let pos = tree.leaf_position(leaf).ok_or_else(not_found)?;
        let merkle_branch = tree.merkle_paths().swap_remove(pos);
        Ok(ControlBlock::with(leaf.version, self.internal_pk, self.parity, merkle_branch))
    }

    /// Iterator over control blocks for all leaves of the tree.
    pub fn control_blocks(&self) -> ControlBlockFactory {
        match &self.tree {
            Some(tree) => ControlBlockFactory::with(self.internal_pk, tree.clone()),
            None => ControlBlockFactory {
                internal_pk: self.internal_pk,
                output_pk: self.output_pk,
                parity: self.parity,
                merkle_root: None,
                remaining_leaves: empty!(),
            },
        }
    }
}

#[derive(Getters, Clone, Debug)]
pub struct ControlBlockFactory {
    #[getter(as_copy)]
    internal_pk: InternalPk,
    #[getter(as_copy)]
    output_pk: OutputPk,
    #[getter(as_copy)]
    parity: Parity,
    #[getter(as_copy)]
    merkle_root: Option<TapNodeHash>,

    #[getter(skip)]
    remaining_leaves: vec::IntoIter<(LeafInfo, TapMerklePath)>,
}

impl ControlBlockFactory {
    #[inline]
    pub fn with(internal_pk: InternalPk, tap_tree: TapTree) -> Self {
        let merkle_root = tap_tree.merkle_root();
        let (output_pk, parity) = internal_pk.to_output_pk(Some(merkle_root));
        let paths = tap_tree.merkle_paths();
        ControlBlockFactory {
            internal_pk,
            output_pk,
            parity,
            merkle_root: Some(merkle_root),
            remaining_leaves: tap_tree
                .into_vec()
                .into_iter()
                .zip(paths)
                .collect::<Vec<_>>()
                .into_iter(),
        }
    }

    #[inline]
    pub fn into_remaining_leaves(self) -> Vec<LeafInfo> {
        self.remaining_leaves.map(|(leaf, _)| leaf).collect()
    }
}

impl Iterator for ControlBlockFactory {
    type Item = (ControlBlock, LeafScript);

    fn next(&mut self) -> Option<Self::Item> {
        let (leaf, merkle_path) = self.remaining_leaves.next()?;
        let leaf_script = leaf.script;
        let control_block =
            ControlBlock::with(leaf_script.version, self.internal_pk, self.parity, merkle_path);
        Some((control_block, leaf_script))
    }
}

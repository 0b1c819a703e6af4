//! Cut enumeration and cut functions.

use std::collections::HashMap;

use itertools::Itertools;

use crate::network::Network;
use crate::traits::LogicNetwork;
use crate::truth::TruthTable;

/// A set of leaves separating a node from the primary inputs.
///
/// Leaves are kept sorted. The constant node is never a leaf.
#[derive(Clone, Debug, Hash, Eq, PartialEq)]
pub struct Cut {
    leaves: Vec<usize>,
}

impl Cut {
    /// The cut consisting of the node itself.
    #[must_use]
    pub fn trivial(node: usize) -> Self {
        if node == 0 {
            Self { leaves: Vec::new() }
        } else {
            Self { leaves: vec![node] }
        }
    }

    /// The union of three cuts.
    #[must_use]
    pub fn union(x: &Self, y: &Self, z: &Self) -> Self {
        let leaves = x.leaves.iter().merge(&y.leaves).merge(&z.leaves).dedup().copied().collect::<Vec<_>>();
        Self { leaves }
    }

    /// Returns true if every leaf of `self` is also a leaf of `rhs`.
    #[must_use]
    pub fn dominates(&self, rhs: &Self) -> bool {
        self.leaves.iter().all(|leaf| rhs.leaves.binary_search(leaf).is_ok())
    }

    /// The leaves of this cut.
    #[must_use]
    pub fn leaves(&self) -> &[usize] {
        &self.leaves
    }

    /// Number of leaves.
    #[must_use]
    pub fn len(&self) -> usize {
        self.leaves.len()
    }

    /// Returns true for the cut of the constant.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.leaves.is_empty()
    }
}

/// Enumerate up to `max_cuts` cuts of at most `max_leaves` leaves for every node.
///
/// The trivial cut of each node is always kept, last.
#[must_use]
pub fn enumerate_cuts(ntk: &Network, max_leaves: usize, max_cuts: usize) -> Vec<Vec<Cut>> {
    let mut cuts: Vec<Vec<Cut>> = Vec::with_capacity(ntk.size());

    for node in 0..ntk.size() {
        let children = match ntk.fanins(node) {
            Some(children) => children,
            None => {
                cuts.push(vec![Cut::trivial(node)]);
                continue;
            }
        };
        let [x, y, z] = children.map(|child| child.index());

        let candidates = cuts[x]
            .iter()
            .cartesian_product(&cuts[y])
            .cartesian_product(&cuts[z])
            .map(|((x_cut, y_cut), z_cut)| Cut::union(x_cut, y_cut, z_cut))
            .filter(|candidate| candidate.len() <= max_leaves)
            .unique()
            .collect::<Vec<Cut>>();

        // Drop cuts that a smaller cut makes redundant.
        let mut node_cuts = candidates
            .iter()
            .filter(|candidate| !candidates.iter().any(|cut| cut != *candidate && cut.dominates(candidate)))
            .sorted_by_key(|cut| cut.len())
            .take(max_cuts)
            .cloned()
            .collect::<Vec<Cut>>();

        node_cuts.push(Cut::trivial(node));
        cuts.push(node_cuts);
    }

    cuts
}

/// The function of `root` over `leaves`, with leaf `i` as variable `i`.
///
/// Returns `None` if the cone of `root` reaches a primary input that is not a leaf.
#[must_use]
pub fn cut_function(ntk: &Network, root: usize, leaves: &[usize]) -> Option<TruthTable> {
    fn visit(
        ntk: &Network,
        node: usize,
        vars: usize,
        tables: &mut HashMap<usize, TruthTable>,
    ) -> Option<TruthTable> {
        if let Some(table) = tables.get(&node) {
            return Some(table.clone());
        }
        if ntk.is_constant(node) {
            return Some(TruthTable::zero(vars));
        }
        let children = ntk.fanins(node)?;
        let mut inputs = Vec::with_capacity(3);
        for child in &children {
            inputs.push(visit(ntk, child.index(), vars, tables)?.complement_if(child.is_complemented()));
        }
        let table = TruthTable::maj(&inputs[0], &inputs[1], &inputs[2]);
        tables.insert(node, table.clone());
        Some(table)
    }

    let vars = leaves.len();
    let mut tables = leaves
        .iter()
        .enumerate()
        .map(|(var, leaf)| (*leaf, TruthTable::var(vars, var)))
        .collect::<HashMap<_, _>>();
    visit(ntk, root, vars, &mut tables)
}

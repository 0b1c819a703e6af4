//! Graph-rewriting optimisation passes.
//!
//! The facade talks to passes through [`Optimizer`], so another synthesis engine can be slotted in. [`Axioms`] is
//! the bundled engine, built from the majority axioms:
//! - Ω.A (associativity): `M(x, u, M(y, u, z)) = M(z, u, M(y, u, x))`, used to pull late signals up (balancing).
//! - Ω.M (majority): `M(x, x, y) = x` and `M(x, x', y) = y`, applied by every gate constructor.
//! - Ω.R (relevance): `M(x, y, z) = M(x, y, z[x/y'])`, used to expose Ω.M redexes (refactoring).
//!
//! Cut rewriting and resubstitution match truth tables of small cuts and windows instead.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::network::{Network, Signal};
use crate::traits::LogicNetwork;
use crate::truth::TruthTable;

mod balance;
pub mod cut;
mod refactor;
mod resub;
mod rewrite;

/// Parameters for balancing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BalanceParams {
    /// Only rebalance nodes on a longest path.
    pub critical_path_only: bool,
    /// Maximum number of rebalancing sweeps.
    pub cut_size: usize,
}

impl Default for BalanceParams {
    fn default() -> Self {
        Self {
            critical_path_only: false,
            cut_size: 4,
        }
    }
}

/// Parameters for cut rewriting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RewriteParams {
    /// Accept rewrites that keep the gate count unchanged.
    pub allow_zero_gain: bool,
    /// Use don't-cares when matching.
    pub use_dont_cares: bool,
    /// Reject rewrites that increase the level of a node.
    pub preserve_depth: bool,
    /// Smallest cut that may be replaced by a new gate.
    pub min_cut_size: usize,
}

impl Default for RewriteParams {
    fn default() -> Self {
        Self {
            allow_zero_gain: false,
            use_dont_cares: false,
            preserve_depth: false,
            min_cut_size: 3,
        }
    }
}

/// Parameters for refactoring.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RefactorParams {
    /// Accept refactorings that keep the gate count unchanged.
    pub allow_zero_gain: bool,
    /// Use don't-cares when matching.
    pub use_dont_cares: bool,
}

/// Parameters for resubstitution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ResubParams {
    /// Maximum number of window leaves.
    pub max_inputs: usize,
    /// Maximum number of gates inserted per substitution.
    pub max_insertions: usize,
    /// Use don't-cares when matching.
    pub use_dont_cares: bool,
    /// Maximum number of divisors considered per window.
    pub window_size: usize,
    /// Reject substitutions that increase the level of a node.
    pub preserve_depth: bool,
}

impl Default for ResubParams {
    fn default() -> Self {
        Self {
            max_inputs: 8,
            max_insertions: 2,
            use_dont_cares: false,
            window_size: 12,
            preserve_depth: false,
        }
    }
}

/// A pass and its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Pass {
    /// Depth-oriented balancing.
    Balance(BalanceParams),
    /// Cut rewriting.
    Rewrite(RewriteParams),
    /// Refactoring.
    Refactor(RefactorParams),
    /// Resubstitution.
    Resubstitute(ResubParams),
}

/// What a pass did.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PassStats {
    /// Time the pass took.
    pub time_total: Duration,
    /// Gates before the pass.
    pub gates_before: usize,
    /// Gates after the pass.
    pub gates_after: usize,
    /// Depth before the pass.
    pub depth_before: usize,
    /// Depth after the pass.
    pub depth_after: usize,
    /// Number of local rewrites applied.
    pub rewrites: usize,
}

/// An engine that optimises a network in place.
pub trait Optimizer {
    /// Reduce depth.
    fn balance(&mut self, ntk: &mut Network, ps: &BalanceParams) -> PassStats;
    /// Replace small cuts with cheaper implementations.
    fn cut_rewrite(&mut self, ntk: &mut Network, ps: &RewriteParams) -> PassStats;
    /// Restructure fanout-free cones.
    fn refactor(&mut self, ntk: &mut Network, ps: &RefactorParams) -> PassStats;
    /// Re-express nodes with signals that already exist.
    fn resubstitute(&mut self, ntk: &mut Network, ps: &ResubParams) -> PassStats;

    /// Run the pass described by `pass`.
    fn run(&mut self, ntk: &mut Network, pass: &Pass) -> PassStats {
        match pass {
            Pass::Balance(ps) => self.balance(ntk, ps),
            Pass::Rewrite(ps) => self.cut_rewrite(ntk, ps),
            Pass::Refactor(ps) => self.refactor(ntk, ps),
            Pass::Resubstitute(ps) => self.resubstitute(ntk, ps),
        }
    }
}

/// The bundled optimiser, built on the majority axioms.
#[derive(Clone, Copy, Debug, Default)]
pub struct Axioms;

impl Optimizer for Axioms {
    fn balance(&mut self, ntk: &mut Network, ps: &BalanceParams) -> PassStats {
        timed("balance", ntk, |mig| balance::balance(mig, ps))
    }

    fn cut_rewrite(&mut self, ntk: &mut Network, ps: &RewriteParams) -> PassStats {
        timed("rewrite", ntk, |mig| {
            let (next, rewrites) = rewrite::cut_rewrite(mig, ps);
            keep_if_smaller(mig, next, rewrites, ps.allow_zero_gain)
        })
    }

    fn refactor(&mut self, ntk: &mut Network, ps: &RefactorParams) -> PassStats {
        timed("refactor", ntk, |mig| {
            let (next, rewrites) = refactor::refactor(mig, ps);
            keep_if_smaller(mig, next, rewrites, ps.allow_zero_gain)
        })
    }

    fn resubstitute(&mut self, ntk: &mut Network, ps: &ResubParams) -> PassStats {
        timed("resub", ntk, |mig| {
            let (next, rewrites) = resub::resubstitute(mig, ps);
            keep_if_smaller(mig, next, rewrites, false)
        })
    }
}

fn timed<F>(name: &str, ntk: &mut Network, pass: F) -> PassStats
where
    F: FnOnce(&Network) -> (Network, usize),
{
    let start = Instant::now();
    let gates_before = ntk.num_gates();
    let depth_before = ntk.depth();

    let (next, rewrites) = pass(ntk);
    *ntk = next;

    let stats = PassStats {
        time_total: start.elapsed(),
        gates_before,
        gates_after: ntk.num_gates(),
        depth_before,
        depth_after: ntk.depth(),
        rewrites,
    };
    info!(
        "{}: {} rewrites, gates {} -> {}, depth {} -> {} in {:?}",
        name, rewrites, stats.gates_before, stats.gates_after, stats.depth_before, stats.depth_after, stats.time_total
    );
    stats
}

/// Keep the rewritten network only if it is smaller, or no larger when zero-gain results are allowed.
fn keep_if_smaller(old: &Network, next: Network, rewrites: usize, allow_zero_gain: bool) -> (Network, usize) {
    let next = next.cleanup_dangling();
    let (before, after) = (old.num_gates(), next.num_gates());
    if after < before || (after == before && allow_zero_gain) {
        (next, rewrites)
    } else {
        (old.cleanup_dangling(), 0)
    }
}

/// What a gate becomes, in terms of nodes of the network being rewritten.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Replacement {
    /// An existing node, possibly inverted. Node 0 stands for both constants.
    Literal(usize, bool),
    /// One new majority gate over existing nodes.
    Majority([(usize, bool); 3]),
}

impl Replacement {
    /// Number of gates the replacement adds, ignoring structural hashing.
    const fn cost(self) -> usize {
        match self {
            Self::Literal(..) => 0,
            Self::Majority(_) => 1,
        }
    }

    /// Level of the replacement in `mig`, where `map` translates old nodes.
    fn level(self, mig: &Network, map: &[Signal]) -> usize {
        match self {
            Self::Literal(node, _) => mig.level(map[node].index()),
            Self::Majority(inputs) => inputs.iter().map(|(node, _)| mig.level(map[*node].index())).max().unwrap_or(0) + 1,
        }
    }

    fn build(self, mig: &mut Network, map: &[Signal]) -> Signal {
        match self {
            Self::Literal(node, complement) => map[node].complement_if(complement),
            Self::Majority(inputs) => {
                let [a, b, c] = inputs.map(|(node, complement)| map[node].complement_if(complement));
                mig.create_maj(a, b, c)
            }
        }
    }
}

/// Every literal among `bases` equal to `target`.
fn literal_matches<'a>(bases: &'a [(usize, TruthTable)], target: &'a TruthTable) -> impl Iterator<Item = Replacement> + 'a {
    bases.iter().flat_map(move |(node, table)| {
        [false, true]
            .into_iter()
            .filter(move |complement| table.clone().complement_if(*complement) == *target)
            .map(move |complement| Replacement::Literal(*node, complement))
    })
}

/// Every majority of three distinct `bases`, under any polarity, equal to `target`.
fn majority_matches<'a>(bases: &'a [(usize, TruthTable)], target: &'a TruthTable) -> impl Iterator<Item = Replacement> + 'a {
    (0..bases.len()).combinations(3).flat_map(move |triple| {
        (0..8_u8).filter_map(move |polarity| {
            let inputs = [0, 1, 2].map(|position| (triple[position], (polarity >> position) & 1 == 1));
            let [x, y, z] = inputs.map(|(base, complement)| bases[base].1.clone().complement_if(complement));
            if TruthTable::maj(&x, &y, &z) == *target {
                Some(Replacement::Majority(inputs.map(|(base, complement)| (bases[base].0, complement))))
            } else {
                None
            }
        })
    })
}

/// The maximum fanout-free cone of `root`, stopping at `leaves`.
///
/// Returns the gates that would become dangling if `root` were removed, `root` included.
pub(crate) fn mffc(ntk: &Network, root: usize, leaves: &[usize]) -> Vec<usize> {
    let mut references: HashMap<usize, usize> = HashMap::new();
    let mut cone = vec![root];
    let mut stack = vec![root];

    while let Some(node) = stack.pop() {
        let children = match ntk.fanins(node) {
            Some(children) => children,
            None => continue,
        };
        for child in children.iter().map(|child| child.index()) {
            if !ntk.is_maj(child) || leaves.contains(&child) {
                continue;
            }
            let count = references.entry(child).or_insert_with(|| ntk.fanout_size(child));
            *count -= 1;
            if *count == 0 {
                cone.push(child);
                stack.push(child);
            }
        }
    }

    cone
}

/// Marks every node lying on a longest path from an input to an output.
pub(crate) fn critical_nodes(ntk: &Network) -> Vec<bool> {
    let depth = ntk.depth();
    let mut critical = vec![false; ntk.size()];
    let mut stack = ntk
        .pos()
        .iter()
        .map(|output| output.index())
        .filter(|node| ntk.level(*node) == depth)
        .collect::<Vec<_>>();

    while let Some(node) = stack.pop() {
        if critical[node] {
            continue;
        }
        critical[node] = true;
        if let Some(children) = ntk.fanins(node) {
            let level = ntk.level(node);
            stack.extend(
                children
                    .iter()
                    .map(|child| child.index())
                    .filter(|child| ntk.level(*child) + 1 == level),
            );
        }
    }

    critical
}

#[cfg(test)]
pub(crate) mod tests {
    use super::{critical_nodes, mffc, Axioms, BalanceParams, Optimizer, Pass, RefactorParams, ResubParams, RewriteParams};
    use crate::network::Network;
    use crate::traits::LogicNetwork;

    /// A network of redundant logic over four inputs.
    pub(crate) fn redundant() -> Network {
        let mut mig = Network::new();
        let a = mig.create_pi();
        let b = mig.create_pi();
        let c = mig.create_pi();
        let d = mig.create_pi();
        let ab = mig.create_and(a, b);
        let abc = mig.create_and(ab, c);
        // (a & b & c) | (a & b) == a & b
        let absorbed = mig.create_or(abc, ab);
        let cd = mig.create_or(c, d);
        let m = mig.create_maj(a, b, cd);
        // M(a, b, M(a, b, cd)) == M(a, b, cd)
        let mm = mig.create_maj(a, b, m);
        let out = mig.create_xor(absorbed, mm);
        mig.create_po(out);
        mig.create_po(!absorbed);
        mig
    }

    /// A chain of ANDs, the deepest possible shape for its function.
    pub(crate) fn and_chain(length: usize) -> Network {
        let mut mig = Network::new();
        let first = mig.create_pi();
        let mut acc = first;
        for _ in 1..length {
            let x = mig.create_pi();
            acc = mig.create_and(acc, x);
        }
        mig.create_po(acc);
        mig
    }

    #[test]
    fn mffc_stops_at_shared_nodes() {
        let mut mig = Network::new();
        let a = mig.create_pi();
        let b = mig.create_pi();
        let c = mig.create_pi();
        let shared = mig.create_and(a, b);
        let private = mig.create_or(b, c);
        let root = mig.create_maj(shared, private, c);
        mig.create_po(root);
        mig.create_po(shared);

        let cone = mffc(&mig, root.index(), &[]);
        assert_eq!(cone.len(), 2);
        assert!(cone.contains(&private.index()));
        assert!(!cone.contains(&shared.index()));

        assert_eq!(mffc(&mig, root.index(), &[private.index()]), vec![root.index()]);
    }

    #[test]
    fn critical_path_of_chain() {
        let mig = and_chain(4);
        let critical = critical_nodes(&mig);
        let last = mig.pos()[0].index();
        assert!(critical[last]);
        // The first two inputs sit at the bottom of the longest path.
        assert!(critical[1]);
        assert!(critical[2]);
    }

    #[test]
    fn every_pass_preserves_function() {
        let passes = [
            Pass::Balance(BalanceParams::default()),
            Pass::Rewrite(RewriteParams::default()),
            Pass::Rewrite(RewriteParams {
                allow_zero_gain: true,
                preserve_depth: true,
                min_cut_size: 2,
                ..RewriteParams::default()
            }),
            Pass::Refactor(RefactorParams::default()),
            Pass::Resubstitute(ResubParams::default()),
            Pass::Resubstitute(ResubParams {
                max_insertions: 0,
                preserve_depth: true,
                ..ResubParams::default()
            }),
        ];

        for network in [redundant(), and_chain(6)] {
            let expected = network.simulate();
            for pass in &passes {
                let mut mig = network.clone();
                let stats = Axioms.run(&mut mig, pass);
                assert_eq!(mig.simulate(), expected, "{:?} changed the function", pass);
                assert_eq!(stats.gates_after, mig.num_gates());
                if !matches!(pass, Pass::Balance(_)) {
                    assert!(stats.gates_after <= stats.gates_before, "{:?} grew the network", pass);
                }
            }
        }
    }

    #[test]
    fn passes_deserialize_with_defaults() {
        let pass: Pass = serde_json::from_str(r#"{"kind": "resubstitute", "max_inputs": 6}"#).unwrap();
        assert_eq!(
            pass,
            Pass::Resubstitute(ResubParams {
                max_inputs: 6,
                ..ResubParams::default()
            })
        );

        let pass: Pass = serde_json::from_str(r#"{"kind": "balance"}"#).unwrap();
        assert_eq!(pass, Pass::Balance(BalanceParams::default()));
    }
}

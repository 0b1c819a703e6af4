use tracing::trace;

use super::cut::{cut_function, enumerate_cuts, Cut};
use super::{literal_matches, majority_matches, mffc, Replacement, RewriteParams};
use crate::network::{Network, Signal};
use crate::truth::TruthTable;

const CUT_SIZE: usize = 4;
const CUT_LIMIT: usize = 8;

/// Pick the replacement with the largest gain over every non-trivial cut of `node`.
///
/// `children` are the fanins of `node` already translated into `mig`.
fn best_replacement(
    ntk: &Network,
    node: usize,
    cuts: &[Cut],
    mig: &Network,
    map: &[Signal],
    children: [Signal; 3],
    ps: &RewriteParams,
) -> Option<(Replacement, usize)> {
    let limit = children.iter().map(|child| mig.level(child.index())).max().unwrap_or(0) + 1;
    let mut own = children.map(Signal::index);
    own.sort_unstable();

    let mut best: Option<(Replacement, usize)> = None;

    for cut in cuts.iter().filter(|cut| cut.leaves() != [node]) {
        let leaves = cut.leaves();
        let function = match cut_function(ntk, node, leaves) {
            Some(function) => function,
            None => continue,
        };
        let saved = mffc(ntk, node, leaves).len();

        let vars = leaves.len();
        let bases = std::iter::once((0, TruthTable::zero(vars)))
            .chain(leaves.iter().enumerate().map(|(var, leaf)| (*leaf, TruthTable::var(vars, var))))
            .collect::<Vec<_>>();

        let gates = if vars >= ps.min_cut_size {
            Some(majority_matches(&bases, &function))
        } else {
            None
        };

        let candidates = literal_matches(&bases, &function).chain(gates.into_iter().flatten());
        for replacement in candidates {
            let cost = replacement.cost();
            if cost > saved || (cost == saved && !ps.allow_zero_gain) {
                continue;
            }
            if let Replacement::Majority(inputs) = replacement {
                // Rebuilding the gate from its own fanins changes nothing.
                let mut fanins = inputs.map(|(base, _)| map[base].index());
                fanins.sort_unstable();
                if fanins == own {
                    continue;
                }
            }
            if ps.preserve_depth && replacement.level(mig, map) > limit {
                continue;
            }

            let gain = saved - cost;
            if best.map_or(true, |(_, best_gain)| gain > best_gain) {
                best = Some((replacement, gain));
            }
            // Later candidates of this cut cost at least as much.
            break;
        }
    }

    best
}

/// Replace nodes whose 4-input cut function has a cheaper implementation than their fanout-free cone.
pub(super) fn cut_rewrite(ntk: &Network, ps: &RewriteParams) -> (Network, usize) {
    let cuts = enumerate_cuts(ntk, CUT_SIZE, CUT_LIMIT);
    let mut rewrites = 0;

    let next = ntk.rebuild_with(|mig, node, children, map| {
        match best_replacement(ntk, node, &cuts[node], mig, map, children, ps) {
            Some((replacement, gain)) => {
                trace!("node {} => {:?} (gain {})", node, replacement, gain);
                rewrites += 1;
                replacement.build(mig, map)
            }
            None => mig.create_maj(children[0], children[1], children[2]),
        }
    });

    (next, rewrites)
}

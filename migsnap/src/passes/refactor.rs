use std::collections::HashMap;

use tracing::trace;

use super::{mffc, RefactorParams};
use crate::network::{Network, Signal};
use crate::traits::LogicNetwork;

/// Gates rebuilt per substitution before giving up.
const SUBSTITUTION_BUDGET: usize = 16;

/// Rebuild the cone of `root` with every reference to `target` replaced by `value`.
///
/// Returns the signal of the uncomplemented `root`. Nodes no deeper than `target` cannot contain it and are returned
/// untouched, as is everything past the budget.
fn substitute(
    mig: &mut Network,
    root: usize,
    target: usize,
    value: Signal,
    budget: &mut usize,
    memo: &mut HashMap<usize, Signal>,
) -> Signal {
    if root == target {
        return value;
    }
    if let Some(signal) = memo.get(&root) {
        return *signal;
    }
    let children = match mig.fanins(root) {
        Some(children) if mig.level(root) > mig.level(target) && *budget > 0 => children,
        _ => return Signal::new(root, false),
    };
    *budget -= 1;

    let replaced = children
        .map(|child| substitute(mig, child.index(), target, value, budget, memo).complement_if(child.is_complemented()));
    let signal = if replaced == children {
        Signal::new(root, false)
    } else {
        mig.create_maj(replaced[0], replaced[1], replaced[2])
    };
    memo.insert(root, signal);
    signal
}

/// Try `M(x, y, z) = M(x, y, z[x/y'])` for every choice of `z`, keeping the cheapest result.
fn relevance(mig: &mut Network, children: [Signal; 3], freed: usize, allow_zero_gain: bool) -> Option<Signal> {
    let mut best: Option<(usize, Signal)> = None;

    for [x, y, z] in [[0, 1, 2], [1, 0, 2], [0, 2, 1], [2, 0, 1], [1, 2, 0], [2, 1, 0]].map(|order| order.map(|position| children[position])) {
        if !mig.is_maj(z.index()) || mig.is_constant(x.index()) {
            continue;
        }

        let before = mig.size();
        let mut budget = SUBSTITUTION_BUDGET;
        let mut memo = HashMap::new();
        // Replacing x by y' inside z: a node n with x = n' becomes y.
        let value = (!y).complement_if(x.is_complemented());
        let substituted = substitute(mig, z.index(), x.index(), value, &mut budget, &mut memo).complement_if(z.is_complemented());
        if substituted == z {
            continue;
        }

        let root = mig.create_maj(x, y, substituted);
        let added = mig.size() - before;
        if added > freed || (added == freed && !allow_zero_gain) {
            continue;
        }
        if best.map_or(true, |(best_added, _)| added < best_added) {
            trace!("M({:?}, {:?}, {:?}) => {:?} (Ω.R, {} new gates)", x, y, z, root, added);
            best = Some((added, root));
        }
    }

    best.map(|(_, root)| root)
}

/// Apply relevance wherever it shrinks the network.
pub(super) fn refactor(ntk: &Network, ps: &RefactorParams) -> (Network, usize) {
    let mut rewrites = 0;

    let next = ntk.rebuild_with(|mig, node, [a, b, c], _| {
        let freed = mffc(ntk, node, &[]).len();
        match relevance(mig, [a, b, c], freed, ps.allow_zero_gain) {
            Some(signal) => {
                rewrites += 1;
                signal
            }
            None => mig.create_maj(a, b, c),
        }
    });

    (next, rewrites)
}

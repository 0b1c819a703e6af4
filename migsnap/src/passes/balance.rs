use tracing::trace;

use super::{critical_nodes, BalanceParams};
use crate::network::{Network, Signal};
use crate::traits::LogicNetwork;

/// Transform `M(x, u, M(y, u, z))` to `M(z, u, M(y, u, x))` when that lowers the node, pulling the late signal `z`
/// towards the output.
fn transform_associativity(mig: &mut Network, children: [Signal; 3]) -> Option<Signal> {
    let level = |mig: &Network, signal: Signal| mig.level(signal.index());
    let current = children.iter().map(|child| level(mig, *child)).max().unwrap_or(0) + 1;

    let mut best: Option<(usize, Signal, Signal, Signal, Signal)> = None;

    for (g_position, u_position) in [(0, 1), (0, 2), (1, 0), (1, 2), (2, 0), (2, 1)] {
        let g = children[g_position];
        let u = children[u_position];
        let x = children[3 - g_position - u_position];

        // M(a, b, c)' = M(a', b', c'), so an inverted child exposes inverted grandchildren.
        let grandchildren = match mig.fanins(g.index()) {
            Some(grandchildren) => grandchildren.map(|grandchild| grandchild.complement_if(g.is_complemented())),
            None => continue,
        };
        let shared = match grandchildren.iter().position(|grandchild| *grandchild == u) {
            Some(shared) => shared,
            None => continue,
        };
        let (mut y, mut z) = match shared {
            0 => (grandchildren[1], grandchildren[2]),
            1 => (grandchildren[0], grandchildren[2]),
            _ => (grandchildren[0], grandchildren[1]),
        };
        if level(mig, y) > level(mig, z) {
            std::mem::swap(&mut y, &mut z);
        }

        let inner = level(mig, y).max(level(mig, u)).max(level(mig, x)) + 1;
        let rotated = level(mig, z).max(level(mig, u)).max(inner) + 1;
        if rotated < current && best.map_or(true, |(best_level, ..)| rotated < best_level) {
            best = Some((rotated, x, u, y, z));
        }
    }

    let (_, x, u, y, z) = best?;
    trace!("M({x:?}, {u:?}, M({y:?}, {u:?}, {z:?})) => M({z:?}, {u:?}, M({y:?}, {u:?}, {x:?})) (Ω.A)");
    let inner = mig.create_maj(y, u, x);
    Some(mig.create_maj(z, u, inner))
}

/// Rebalance until the depth stops improving or `cut_size` sweeps have run.
pub(super) fn balance(ntk: &Network, ps: &BalanceParams) -> (Network, usize) {
    let mut current = ntk.cleanup_dangling();
    let mut total = 0;

    for sweep in 0..ps.cut_size.max(1) {
        let critical = if ps.critical_path_only {
            Some(critical_nodes(&current))
        } else {
            None
        };

        let mut rotations = 0;
        let next = current
            .rebuild_with(|mig, node, [a, b, c], _| {
                if critical.as_ref().map_or(true, |critical| critical[node]) {
                    if let Some(signal) = transform_associativity(mig, [a, b, c]) {
                        rotations += 1;
                        return signal;
                    }
                }
                mig.create_maj(a, b, c)
            })
            .cleanup_dangling();

        trace!("sweep {}: {} rotations, depth {} -> {}", sweep, rotations, current.depth(), next.depth());
        if next.depth() >= current.depth() {
            break;
        }
        current = next;
        total += rotations;
    }

    (current, total)
}

#[cfg(test)]
mod tests {
    use super::balance;
    use crate::network::Network;
    use crate::passes::tests::and_chain;
    use crate::passes::BalanceParams;
    use crate::traits::LogicNetwork;

    #[test]
    fn associativity_noop() {
        // A single gate has nothing to rotate.
        let mut mig = Network::new();
        let x = mig.create_pi();
        let y = mig.create_pi();
        let z = mig.create_pi();
        let m = mig.create_maj(x, y, z);
        mig.create_po(m);

        let (balanced, rotations) = balance(&mig, &BalanceParams::default());
        assert_eq!(rotations, 0);
        assert_eq!(balanced, mig);
    }

    #[test]
    fn chain_gets_shallower() {
        let mig = and_chain(8);
        assert_eq!(mig.depth(), 7);

        let (balanced, rotations) = balance(&mig, &BalanceParams::default());
        assert!(rotations > 0);
        assert!(balanced.depth() < mig.depth());
        assert_eq!(balanced.simulate(), mig.simulate());
    }

    #[test]
    fn critical_path_only_still_improves_chain() {
        let mig = and_chain(6);
        let ps = BalanceParams {
            critical_path_only: true,
            cut_size: 8,
        };
        let (balanced, _) = balance(&mig, &ps);
        assert!(balanced.depth() < mig.depth());
        assert_eq!(balanced.simulate(), mig.simulate());
    }

    #[test]
    fn single_sweep_is_bounded() {
        let mig = and_chain(16);
        let one = balance(&mig, &BalanceParams { critical_path_only: false, cut_size: 1 }).0;
        let many = balance(&mig, &BalanceParams { critical_path_only: false, cut_size: 8 }).0;
        assert!(many.depth() <= one.depth());
        assert_eq!(many.simulate(), mig.simulate());
    }
}

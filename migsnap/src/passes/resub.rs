use std::cmp::Reverse;
use std::collections::HashMap;

use itertools::Itertools;
use tracing::trace;

use super::{literal_matches, majority_matches, mffc, Replacement, ResubParams};
use crate::network::{Network, Signal};
use crate::traits::LogicNetwork;
use crate::truth::TruthTable;

/// Windows never grow past this many leaves, whatever `max_inputs` asks for.
const MAX_LEAVES: usize = 12;

/// The neighbourhood of one node that resubstitution works in.
struct Window {
    /// Candidate nodes with their functions over the window leaves, the constant first.
    divisors: Vec<(usize, TruthTable)>,
    /// Function of the root over the window leaves.
    function: TruthTable,
    /// Size of the root's fanout-free cone inside the window.
    freed: usize,
}

fn gate_function(ntk: &Network, node: usize, tables: &HashMap<usize, TruthTable>) -> Option<TruthTable> {
    let children = ntk.fanins(node)?;
    let mut inputs = Vec::with_capacity(3);
    for child in &children {
        inputs.push(tables.get(&child.index())?.clone().complement_if(child.is_complemented()));
    }
    Some(TruthTable::maj(&inputs[0], &inputs[1], &inputs[2]))
}

fn gate_children(ntk: &Network, node: usize) -> impl Iterator<Item = usize> {
    ntk.fanins(node)
        .into_iter()
        .flatten()
        .map(Signal::index)
        .filter(|child| *child != 0)
}

/// Grow the leaves of `root` by repeatedly expanding the gate leaf that adds the fewest new leaves.
fn window_leaves(ntk: &Network, root: usize, max_inputs: usize) -> Vec<usize> {
    let mut leaves = gate_children(ntk, root).sorted().dedup().collect::<Vec<_>>();

    loop {
        let expansion = leaves
            .iter()
            .filter(|leaf| ntk.is_maj(**leaf))
            .map(|&leaf| {
                let fresh = gate_children(ntk, leaf).unique().filter(|child| !leaves.contains(child)).count();
                (fresh, leaf)
            })
            .min_by_key(|&(fresh, leaf)| (fresh, Reverse(leaf)));

        let (fresh, leaf) = match expansion {
            Some(expansion) => expansion,
            None => break,
        };
        if leaves.len() - 1 + fresh > max_inputs {
            break;
        }

        leaves.retain(|other| *other != leaf);
        leaves.extend(gate_children(ntk, leaf));
        leaves.sort_unstable();
        leaves.dedup();
    }

    leaves
}

/// The gates between `root` and `leaves`, `root` included, in topological order.
fn window_cone(ntk: &Network, root: usize, leaves: &[usize]) -> Vec<usize> {
    let mut cone = Vec::new();
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node == 0 || leaves.contains(&node) || cone.contains(&node) {
            continue;
        }
        cone.push(node);
        stack.extend(gate_children(ntk, node));
    }
    cone.sort_unstable();
    cone
}

fn build_window(ntk: &Network, fanouts: &[Vec<usize>], root: usize, ps: &ResubParams) -> Option<Window> {
    let leaves = window_leaves(ntk, root, ps.max_inputs.min(MAX_LEAVES));
    if leaves.len() > MAX_LEAVES {
        return None;
    }

    let vars = leaves.len();
    let mut tables = HashMap::new();
    tables.insert(0, TruthTable::zero(vars));
    for (var, leaf) in leaves.iter().enumerate() {
        tables.insert(*leaf, TruthTable::var(vars, var));
    }

    let cone = window_cone(ntk, root, &leaves);
    for &node in &cone {
        let function = gate_function(ntk, node, &tables)?;
        tables.insert(node, function);
    }

    let freed = mffc(ntk, root, &leaves);
    let limit = ps.window_size.max(leaves.len());
    let mut divisors = leaves.clone();
    divisors.extend(cone.iter().copied().filter(|node| *node != root && !freed.contains(node)));
    divisors.truncate(limit);

    // Side divisors: nodes outside the cone computed entirely from what the window already knows.
    let mut next = 0;
    while next < divisors.len() && divisors.len() < limit {
        for &fanout in &fanouts[divisors[next]] {
            if divisors.len() >= limit {
                break;
            }
            if fanout >= root || tables.contains_key(&fanout) {
                continue;
            }
            if let Some(function) = gate_function(ntk, fanout, &tables) {
                tables.insert(fanout, function);
                divisors.push(fanout);
            }
        }
        next += 1;
    }

    let function = tables.get(&root)?.clone();
    let divisors = std::iter::once(0)
        .chain(divisors)
        .filter_map(|node| tables.get(&node).map(|table| (node, table.clone())))
        .collect();

    Some(Window {
        divisors,
        function,
        freed: freed.len(),
    })
}

fn fanout_lists(ntk: &Network) -> Vec<Vec<usize>> {
    let mut fanouts = vec![Vec::new(); ntk.size()];
    for node in 0..ntk.size() {
        for child in gate_children(ntk, node).unique() {
            fanouts[child].push(node);
        }
    }
    fanouts
}

/// Re-express each node with existing divisors, adding at most one gate.
pub(super) fn resubstitute(ntk: &Network, ps: &ResubParams) -> (Network, usize) {
    let fanouts = fanout_lists(ntk);
    let mut rewrites = 0;

    let next = ntk.rebuild_with(|mig, node, children, map| {
        let limit = children.iter().map(|child| mig.level(child.index())).max().unwrap_or(0) + 1;

        let replacement = build_window(ntk, &fanouts, node, ps).and_then(|window| {
            let gates = if ps.max_insertions >= 1 && window.freed >= 2 {
                Some(majority_matches(&window.divisors, &window.function))
            } else {
                None
            };
            literal_matches(&window.divisors, &window.function)
                .chain(gates.into_iter().flatten())
                .find(|replacement| !ps.preserve_depth || replacement.level(mig, map) <= limit)
        });

        match replacement {
            Some(replacement) => {
                trace!("node {} => {:?}", node, replacement);
                rewrites += 1;
                replacement.build(mig, map)
            }
            None => mig.create_maj(children[0], children[1], children[2]),
        }
    });

    (next, rewrites)
}

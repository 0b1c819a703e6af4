//! Mapping a node's raw fanins and structural role to a [`NodeRecord`].

use crate::network::Signal;
use crate::node::{NodeRecord, NodeType};

/// The structural role a node plays in the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Role {
    /// A majority gate that drives no primary output.
    Internal,
    /// The constant node.
    Constant,
    /// A primary input.
    PrimaryInput,
    /// A node driving a primary output.
    PrimaryOutput,
    /// A primary input that also drives a primary output.
    PrimaryInputOutput,
    /// The constant node driving a primary output.
    ConstantOutput,
}

/// Classify one node.
///
/// `fanins` are the raw fanin signals in stored position order. Internal gates are tagged by their inversion
/// pattern, with the fanin slots swapped so inverted fanins come first:
///
/// | inverted | type | reorder |
/// |---|---|---|
/// | none | `NoNoNo` | none |
/// | 2 | `InvNoNo` | swap 0 and 2 |
/// | 1 | `InvNoNo` | swap 0 and 1 |
/// | 1, 2 | `InvInvNo` | swap 0 and 2 |
/// | 0 | `InvNoNo` | none |
/// | 0, 2 | `InvInvNo` | swap 1 and 2 |
/// | 0, 1 | `InvInvNo` | none |
/// | all | `InvInvInv` | none |
///
/// Outputs and the constant keep their raw slots unchanged; inputs and the dual roles carry no fanins.
#[must_use]
pub fn classify(fanins: [Option<Signal>; 3], fanout_count: usize, role: Role) -> NodeRecord {
    let raw = fanins.map(|fanin| fanin.map(Signal::index));
    let (fanins, node_type) = match role {
        Role::Internal => classify_gate(fanins),
        Role::Constant => (raw, NodeType::Constant),
        Role::PrimaryOutput => (raw, NodeType::PrimaryOutput),
        Role::PrimaryInput => ([None; 3], NodeType::PrimaryInput),
        Role::PrimaryInputOutput => ([None; 3], NodeType::PrimaryInputOutput),
        Role::ConstantOutput => ([None; 3], NodeType::ConstantOutput),
    };

    NodeRecord {
        fanins,
        fanout_count: Some(fanout_count),
        node_type,
    }
}

fn classify_gate(fanins: [Option<Signal>; 3]) -> ([Option<usize>; 3], NodeType) {
    let mut slots = fanins.map(|fanin| fanin.map(Signal::index));
    let inverted = fanins.map(|fanin| fanin.map_or(false, Signal::is_complemented));

    let node_type = match inverted {
        [false, false, false] => NodeType::NoNoNo,
        [false, false, true] => {
            slots.swap(0, 2);
            NodeType::InvNoNo
        }
        [false, true, false] => {
            slots.swap(0, 1);
            NodeType::InvNoNo
        }
        [false, true, true] => {
            slots.swap(0, 2);
            NodeType::InvInvNo
        }
        [true, false, false] => NodeType::InvNoNo,
        [true, false, true] => {
            slots.swap(1, 2);
            NodeType::InvInvNo
        }
        [true, true, false] => NodeType::InvInvNo,
        [true, true, true] => NodeType::InvInvInv,
    };

    (slots, node_type)
}

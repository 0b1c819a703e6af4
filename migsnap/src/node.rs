//! Snapshot node records.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// The classification of a snapshot node.
///
/// Internal gates are tagged by how many of their fanins are inverted; the classifier reorders fanins so the
/// inverted ones come first. The discriminants are part of the host interface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum NodeType {
    /// The constant node.
    Constant = 0,
    /// A primary input.
    PrimaryInput = 1,
    /// A node driving a primary output.
    PrimaryOutput = 2,
    /// A gate with no inverted fanin.
    NoNoNo = 3,
    /// A gate whose fanin 0 is inverted.
    InvNoNo = 4,
    /// A gate whose fanins 0 and 1 are inverted.
    InvInvNo = 5,
    /// A gate with all three fanins inverted.
    InvInvInv = 6,
    /// A primary input that also drives a primary output.
    PrimaryInputOutput = 7,
    /// The constant driving a primary output.
    ConstantOutput = 8,
    /// Not classified yet.
    Unknown = 9,
}

impl NodeType {
    /// Returns the interface code of this type.
    #[must_use]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Number of inverted fanins implied by this type, for internal gates.
    #[must_use]
    pub const fn inverted_fanins(self) -> Option<usize> {
        match self {
            Self::NoNoNo => Some(0),
            Self::InvNoNo => Some(1),
            Self::InvInvNo => Some(2),
            Self::InvInvInv => Some(3),
            _ => None,
        }
    }

    /// Returns true for the four internal gate types.
    #[must_use]
    pub const fn is_gate(self) -> bool {
        self.inverted_fanins().is_some()
    }
}

impl Default for NodeType {
    fn default() -> Self {
        Self::Unknown
    }
}

/// One node of a snapshot: its fanins after canonical reordering, its fanout count and its type.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRecord {
    pub(crate) fanins: [Option<usize>; 3],
    pub(crate) fanout_count: Option<usize>,
    pub(crate) node_type: NodeType,
}

impl NodeRecord {
    /// Whether fanin `slot` (0, 1 or 2) is present.
    #[must_use]
    pub fn has_fanin(&self, slot: usize) -> bool {
        self.fanins.get(slot).copied().flatten().is_some()
    }

    /// The node index in fanin `slot`.
    ///
    /// # Errors
    ///
    /// Fails if the node has no such fanin.
    pub fn fanin(&self, slot: usize) -> Result<usize> {
        self.fanins
            .get(slot)
            .copied()
            .flatten()
            .ok_or(Error::MissingFanin { slot })
    }

    /// All three fanin slots.
    #[must_use]
    pub const fn fanins(&self) -> [Option<usize>; 3] {
        self.fanins
    }

    /// Number of references to this node, or `None` if it was never computed.
    #[must_use]
    pub const fn fanout_count(&self) -> Option<usize> {
        self.fanout_count
    }

    /// The node type, which must have been classified.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::Unclassified`] for a record the snapshot never reached; `index` names the record in
    /// the error.
    pub fn node_type(&self, index: usize) -> Result<NodeType> {
        match self.node_type {
            NodeType::Unknown => Err(Error::Unclassified { index }),
            node_type => Ok(node_type),
        }
    }

    /// The node type without the classification check.
    #[must_use]
    pub const fn raw_node_type(&self) -> NodeType {
        self.node_type
    }
}

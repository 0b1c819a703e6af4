//! Traits for networks.

use crate::network::Signal;

/// The read-only capabilities a network must offer to be snapshotted.
///
/// Node indices run from `0` to `size() - 1`, with the constant at index 0.
pub trait LogicNetwork {
    /// Returns the number of nodes, including the constant and the primary inputs.
    fn size(&self) -> usize;
    /// Returns the fanin in position `slot` (0, 1 or 2) of a node, if it has one.
    fn fanin(&self, node: usize, slot: usize) -> Option<Signal>;
    /// Returns true if this node is a primary input.
    fn is_pi(&self, node: usize) -> bool;
    /// Returns the number of references to this node from gates and primary outputs.
    fn fanout_size(&self, node: usize) -> usize;
    /// Returns the primary input nodes in creation order.
    fn pis(&self) -> &[usize];
    /// Returns the signals driving the primary outputs in creation order.
    fn pos(&self) -> &[Signal];
    /// Returns the number of gates on the longest input-to-output path.
    fn depth(&self) -> usize;

    /// Returns true if this node drives a primary output, in either polarity.
    fn is_po(&self, node: usize) -> bool {
        self.pos().iter().any(|output| output.index() == node)
    }

    /// Returns true if this node is the constant.
    fn is_constant(&self, node: usize) -> bool {
        node == 0
    }

    /// Returns all three fanin positions of a node.
    fn fanins_of(&self, node: usize) -> [Option<Signal>; 3] {
        [self.fanin(node, 0), self.fanin(node, 1), self.fanin(node, 2)]
    }
}

//! Flat, index-addressable snapshots of a live network.

use tracing::debug;

use crate::classify::{classify, Role};
use crate::error::{Error, Result};
use crate::node::{NodeRecord, NodeType};
use crate::traits::LogicNetwork;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Visit {
    Unvisited,
    Output,
    Input,
    InputOutput,
    Internal,
}

/// One [`NodeRecord`] per node index, built in a single pass over a network.
///
/// A snapshot is not updated when the network changes; build a new one instead.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Snapshot {
    records: Vec<NodeRecord>,
}

impl Snapshot {
    /// Classify every node of `ntk`.
    ///
    /// Nodes driving primary outputs are visited first, then primary inputs, then everything else. The first role
    /// a node is given wins, so output beats input beats constant beats internal gate.
    pub fn build<N: LogicNetwork>(ntk: &N) -> Self {
        let size = ntk.size();
        let mut records = vec![NodeRecord::default(); size];
        let mut visited = vec![Visit::Unvisited; size];

        for output in ntk.pos() {
            let node = output.index();
            let role = if ntk.is_constant(node) {
                Role::ConstantOutput
            } else {
                Role::PrimaryOutput
            };
            records[node] = classify(ntk.fanins_of(node), ntk.fanout_size(node), role);
            visited[node] = Visit::Output;
        }

        for &node in ntk.pis() {
            debug_assert!(ntk.is_pi(node));
            if visited[node] == Visit::Unvisited {
                records[node] = classify([None; 3], ntk.fanout_size(node), Role::PrimaryInput);
                visited[node] = Visit::Input;
            } else {
                records[node] = classify([None; 3], ntk.fanout_size(node), Role::PrimaryInputOutput);
                visited[node] = Visit::InputOutput;
            }
        }

        for node in 0..size {
            if visited[node] != Visit::Unvisited {
                continue;
            }
            if ntk.is_constant(node) {
                records[node] = classify(ntk.fanins_of(node), ntk.fanout_size(node), Role::Constant);
            } else {
                debug_assert!(!ntk.is_pi(node) && !ntk.is_po(node));
                records[node] = classify(ntk.fanins_of(node), ntk.fanout_size(node), Role::Internal);
                visited[node] = Visit::Internal;
            }
        }

        debug!("snapshot of {} nodes", size);
        Self { records }
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns true if the snapshot holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The record for node `index`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::StaleSnapshot`] if the snapshot has no such record.
    pub fn get(&self, index: usize) -> Result<&NodeRecord> {
        self.records.get(index).ok_or(Error::StaleSnapshot {
            index,
            len: self.records.len(),
        })
    }

    /// All records, indexed by node.
    #[must_use]
    pub fn records(&self) -> &[NodeRecord] {
        &self.records
    }

    /// Number of records of each type, indexed by type code.
    #[must_use]
    pub fn type_histogram(&self) -> [usize; 10] {
        let mut histogram = [0; 10];
        for record in &self.records {
            histogram[record.raw_node_type().code() as usize] += 1;
        }
        histogram
    }

    /// Number of records classified as internal gates.
    #[must_use]
    pub fn num_gates(&self) -> usize {
        self.records.iter().filter(|record| record.raw_node_type().is_gate()).count()
    }

    /// Returns true if no record is left unclassified.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.records.iter().all(|record| record.raw_node_type() != NodeType::Unknown)
    }
}

#[cfg(test)]
mod tests {
    use super::Snapshot;
    use crate::network::Network;
    use crate::node::NodeType;
    use crate::traits::LogicNetwork;

    fn full_adder() -> Network {
        let mut mig = Network::new();
        let a = mig.create_pi();
        let b = mig.create_pi();
        let cin = mig.create_pi();
        let carry = mig.create_maj(a, b, cin);
        let half = mig.create_xor(a, b);
        let sum = mig.create_xor(half, cin);
        mig.create_po(sum);
        mig.create_po(carry);
        mig
    }

    #[test]
    fn every_node_is_classified() {
        let mig = full_adder();
        let snapshot = Snapshot::build(&mig);
        assert_eq!(snapshot.len(), mig.size());
        assert!(snapshot.is_complete());
        for index in 0..snapshot.len() {
            assert!(snapshot.get(index).unwrap().node_type(index).is_ok());
        }
    }

    #[test]
    fn roles_follow_priority() {
        let mig = full_adder();
        let snapshot = Snapshot::build(&mig);
        let type_of = |index: usize| snapshot.get(index).unwrap().node_type(index).unwrap();

        assert_eq!(type_of(0), NodeType::Constant);
        for &pi in mig.pis() {
            assert_eq!(type_of(pi), NodeType::PrimaryInput);
        }
        for output in mig.pos() {
            assert_eq!(type_of(output.index()), NodeType::PrimaryOutput);
        }
        let histogram = snapshot.type_histogram();
        assert_eq!(histogram[NodeType::PrimaryInput.code() as usize], 3);
        assert_eq!(histogram[NodeType::PrimaryOutput.code() as usize], 2);
        assert_eq!(snapshot.num_gates(), mig.num_gates() - 2);
    }

    #[test]
    fn constant_output_gets_dual_tag() {
        let mut mig = Network::new();
        let a = mig.create_pi();
        mig.create_po(mig.get_constant(true));
        mig.create_po(a);
        let snapshot = Snapshot::build(&mig);
        assert_eq!(snapshot.get(0).unwrap().node_type(0).unwrap(), NodeType::ConstantOutput);
        assert_eq!(
            snapshot.get(a.index()).unwrap().node_type(a.index()).unwrap(),
            NodeType::PrimaryInputOutput
        );
    }

    #[test]
    fn output_keeps_stored_fanin_order() {
        let mut mig = Network::new();
        let a = mig.create_pi();
        let b = mig.create_pi();
        let c = mig.create_pi();
        let m = mig.create_maj(a, !b, c);
        let inner = mig.create_maj(a, !b, !m);
        mig.create_po(inner);

        let snapshot = Snapshot::build(&mig);
        let record = snapshot.get(m.index()).unwrap();
        // m is internal: its stored fanins (a, b', c) reorder to (b, a, c).
        assert_eq!(record.node_type(m.index()).unwrap(), NodeType::InvNoNo);
        assert_eq!(record.fanins(), [Some(b.index()), Some(a.index()), Some(c.index())]);

        let record = snapshot.get(inner.index()).unwrap();
        assert_eq!(record.node_type(inner.index()).unwrap(), NodeType::PrimaryOutput);
        let stored = mig.fanins(inner.index()).unwrap();
        assert_eq!(record.fanins(), stored.map(|signal| Some(signal.index())));
    }

    #[test]
    fn fanout_counts_match_edges() {
        let mig = full_adder();
        let snapshot = Snapshot::build(&mig);
        let fanouts: usize = snapshot.records().iter().map(|r| r.fanout_count().unwrap()).sum();
        let edges: usize = snapshot
            .records()
            .iter()
            .map(|r| (0..3).filter(|slot| r.has_fanin(*slot)).count())
            .sum();
        assert_eq!(fanouts, edges + mig.num_pos());
    }

    #[test]
    fn missing_record_is_stale() {
        let snapshot = Snapshot::default();
        assert!(snapshot.is_empty());
        assert!(snapshot.get(0).is_err());
    }
}

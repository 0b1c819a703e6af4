//! Exporting snapshots as `petgraph` graphs and Graphviz dot files.

use std::io::{self, Write};
use std::path::Path;

use petgraph::stable_graph::StableGraph;

use crate::node::NodeType;
use crate::snapshot::Snapshot;

impl Snapshot {
    /// One vertex per record and one edge per present fanin, pointing from the fanin to its consumer.
    ///
    /// Edge weights mark inverted fanins, as far as the record type tells: the first `n` slots of a gate with `n`
    /// inverted fanins. Output records carry raw fanins and report no inversion.
    #[must_use]
    pub fn to_graph(&self) -> StableGraph<NodeType, bool> {
        let mut graph = StableGraph::with_capacity(self.len(), 3 * self.len());
        let vertices = self
            .records()
            .iter()
            .map(|record| graph.add_node(record.raw_node_type()))
            .collect::<Vec<_>>();

        for (vertex, record) in vertices.iter().zip(self.records()) {
            let inverted = record.raw_node_type().inverted_fanins().unwrap_or(0);
            for (slot, fanin) in record.fanins().iter().enumerate() {
                if let Some(source) = fanin.and_then(|fanin| vertices.get(fanin)) {
                    graph.add_edge(*source, *vertex, slot < inverted);
                }
            }
        }

        graph
    }

    /// Render the snapshot in Graphviz dot syntax.
    ///
    /// # Errors
    ///
    /// Fails if writing to `f` fails.
    pub fn write_graphviz<W: Write>(&self, f: &mut W) -> io::Result<()> {
        let graph = self.to_graph();

        writeln!(f, "strict digraph {{")?;

        for node in graph.node_indices() {
            let (shape, color, label) = match graph[node] {
                NodeType::Constant => ("point", "black", "Zero"),
                NodeType::PrimaryInput => ("box", "blue", "Input"),
                NodeType::PrimaryOutput => ("box", "green", "Output"),
                NodeType::PrimaryInputOutput => ("box", "cyan", "Input/Output"),
                NodeType::ConstantOutput => ("box", "gray", "Zero/Output"),
                NodeType::NoNoNo | NodeType::InvNoNo | NodeType::InvInvNo | NodeType::InvInvInv => {
                    ("ellipse", "black", "Majority")
                }
                NodeType::Unknown => ("diamond", "red", "Unknown"),
            };
            writeln!(f, "{} [shape={},color={},label=\"{} {0}\"];", node.index(), shape, color, label)?;
        }

        for edge in graph.edge_indices() {
            if let Some((from, to)) = graph.edge_endpoints(edge) {
                write!(f, "{} -> {}", from.index(), to.index())?;
                writeln!(f, " {};", if graph[edge] { "[dir=both,arrowtail=odot]" } else { "" })?;
            }
        }

        writeln!(f, "}}")
    }

    /// Write the snapshot as a dot file at `path`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be created or written.
    pub fn to_graphviz<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut f = io::BufWriter::new(std::fs::File::create(path)?);
        self.write_graphviz(&mut f)?;
        f.flush()
    }
}

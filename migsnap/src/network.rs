//! The majority-inverter graph itself, and reading it from AIGER files.

use std::collections::HashMap;
use std::ops::Not;
use std::path::Path;

use tracing::debug;

use crate::error::{Error, Result};
use crate::reader::AigerFile;
use crate::traits::LogicNetwork;
use crate::truth::TruthTable;

/// A reference to a node, possibly inverted.
///
/// The least significant bit signifies inversion state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signal(usize);

impl Signal {
    /// Create a signal pointing at `index`, inverted if `complement` is set.
    #[must_use]
    pub const fn new(index: usize, complement: bool) -> Self {
        Self(index << 1 | complement as usize)
    }

    /// The constant signal with the given value.
    #[must_use]
    pub const fn constant(value: bool) -> Self {
        Self::new(0, value)
    }

    /// Index of the node this signal points at.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 >> 1
    }

    /// Returns true if this signal is inverted.
    #[must_use]
    pub const fn is_complemented(self) -> bool {
        self.0 & 1 == 1
    }

    /// Invert the signal if `complement` is set.
    #[must_use]
    pub const fn complement_if(self, complement: bool) -> Self {
        Self(self.0 ^ complement as usize)
    }
}

impl Not for Signal {
    type Output = Self;

    fn not(self) -> Self {
        Self(self.0 ^ 1)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Kind {
    Zero,
    Input(usize),
    Majority([Signal; 3]),
}

#[derive(Clone, Debug, PartialEq)]
struct Node {
    kind: Kind,
    fanout: usize,
    level: usize,
}

/// A majority-inverter graph.
///
/// Node 0 is the constant zero. Every other node is either a primary input or a three-input majority gate whose
/// fanins are stored in position order. Primary outputs are signals, not nodes.
#[derive(Clone, Debug, PartialEq)]
pub struct Network {
    nodes: Vec<Node>,
    inputs: Vec<usize>,
    outputs: Vec<Signal>,
    strash: HashMap<[Signal; 3], usize>,
    input_names: HashMap<usize, String>,
    output_names: HashMap<usize, String>,
}

impl Default for Network {
    fn default() -> Self {
        Self::new()
    }
}

impl Network {
    /// Create an empty network holding only the constant node.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: vec![Node {
                kind: Kind::Zero,
                fanout: 0,
                level: 0,
            }],
            inputs: Vec::new(),
            outputs: Vec::new(),
            strash: HashMap::new(),
            input_names: HashMap::new(),
            output_names: HashMap::new(),
        }
    }

    /// Read an AIGER file, ASCII or binary, turning every AND gate into `M(0, a, b)`.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be opened or parsed, declares latches, or defines gates cyclically.
    pub fn from_aiger<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_aiger_bytes(&bytes)
    }

    /// Parse the contents of an AIGER file held in memory.
    ///
    /// # Errors
    ///
    /// Fails if the bytes do not parse, declare latches, or define gates cyclically.
    pub fn from_aiger_bytes(bytes: &[u8]) -> Result<Self> {
        let file = AigerFile::parse(bytes)?;
        let max_variable = file.max_variable;

        let mut mig = Self::new();
        let mut variables: Vec<Option<Signal>> = vec![None; max_variable + 1];
        variables[0] = Some(mig.get_constant(false));

        for variable in file.inputs {
            if variable == 0 || variable > max_variable {
                return Err(Error::UndefinedLiteral(variable));
            }
            variables[variable] = Some(mig.create_pi());
        }

        for literal in &file.outputs {
            mig.build_aiger_cone(literal.variable(), &file.gates, &mut variables)?;
        }

        for literal in file.outputs {
            let driver = variables
                .get(literal.variable())
                .copied()
                .flatten()
                .ok_or_else(|| Error::UndefinedLiteral(literal.variable()))?;
            mig.create_po(driver.complement_if(literal.is_inverted()));
        }

        mig.input_names.extend(file.input_symbols);
        mig.output_names.extend(file.output_symbols);

        debug!(
            "read AIGER with {} inputs, {} outputs, {} gates",
            mig.num_pis(),
            mig.num_pos(),
            mig.num_gates()
        );

        Ok(mig)
    }

    /// Build every AND gate the variable depends on, in dependency order.
    fn build_aiger_cone(
        &mut self,
        root: usize,
        gates: &[Option<[aiger::Literal; 2]>],
        variables: &mut [Option<Signal>],
    ) -> Result<()> {
        if root >= variables.len() {
            return Err(Error::UndefinedLiteral(root));
        }

        let mut in_progress = vec![false; variables.len()];
        let mut stack = vec![(root, false)];

        while let Some((variable, expanded)) = stack.pop() {
            if variables[variable].is_some() {
                continue;
            }
            let [lhs, rhs] = gates[variable].ok_or(Error::UndefinedLiteral(variable))?;

            if expanded {
                let literal_signal = |literal: aiger::Literal| {
                    variables[literal.variable()]
                        .map(|signal| signal.complement_if(literal.is_inverted()))
                        .ok_or(Error::UndefinedLiteral(literal.variable()))
                };
                let a = literal_signal(lhs)?;
                let b = literal_signal(rhs)?;
                variables[variable] = Some(self.create_and(a, b));
                in_progress[variable] = false;
                continue;
            }

            // Only a descendant of this variable could have pushed it again while it is open.
            if in_progress[variable] {
                return Err(Error::Cycle(variable));
            }
            in_progress[variable] = true;
            stack.push((variable, true));

            for literal in [lhs, rhs] {
                let child = literal.variable();
                if child >= variables.len() {
                    return Err(Error::UndefinedLiteral(child));
                }
                if variables[child].is_none() {
                    if in_progress[child] {
                        return Err(Error::Cycle(child));
                    }
                    stack.push((child, false));
                }
            }
        }

        Ok(())
    }

    /// The constant signal with the given value.
    #[must_use]
    pub const fn get_constant(&self, value: bool) -> Signal {
        Signal::constant(value)
    }

    /// Append a primary input, returning its signal.
    pub fn create_pi(&mut self) -> Signal {
        let index = self.nodes.len();
        self.nodes.push(Node {
            kind: Kind::Input(self.inputs.len()),
            fanout: 0,
            level: 0,
        });
        self.inputs.push(index);
        Signal::new(index, false)
    }

    /// Drive a new primary output from `signal`, returning the output position.
    pub fn create_po(&mut self, signal: Signal) -> usize {
        self.nodes[signal.index()].fanout += 1;
        self.outputs.push(signal);
        self.outputs.len() - 1
    }

    /// Create `M(a, b, c)`.
    ///
    /// Fanins are ordered by node index, trivial majorities collapse to one of their inputs, gates with two or more
    /// inverted fanins are stored with all fanins and the output inverted, and structurally identical gates are
    /// shared.
    pub fn create_maj(&mut self, a: Signal, b: Signal, c: Signal) -> Signal {
        let mut children = [a, b, c];
        children.sort_unstable_by_key(|signal| signal.index());
        let [a, b, c] = children;

        // M(x, x, y) => x, M(x, x', y) => y
        if a.index() == b.index() {
            return if a == b { a } else { c };
        }
        if b.index() == c.index() {
            return if b == c { b } else { a };
        }

        let complement = children.iter().filter(|signal| signal.is_complemented()).count() >= 2;
        if complement {
            for child in &mut children {
                *child = !*child;
            }
        }

        if let Some(&index) = self.strash.get(&children) {
            return Signal::new(index, complement);
        }

        let index = self.nodes.len();
        let level = children.iter().map(|child| self.nodes[child.index()].level).max().unwrap_or(0) + 1;
        for child in &children {
            self.nodes[child.index()].fanout += 1;
        }
        self.nodes.push(Node {
            kind: Kind::Majority(children),
            fanout: 0,
            level,
        });
        self.strash.insert(children, index);
        Signal::new(index, complement)
    }

    /// Invert a signal. Inverters live on edges, so this adds nothing to the network.
    #[must_use]
    pub fn create_not(&self, a: Signal) -> Signal {
        !a
    }

    /// Create `a & b` as `M(0, a, b)`.
    pub fn create_and(&mut self, a: Signal, b: Signal) -> Signal {
        self.create_maj(self.get_constant(false), a, b)
    }

    /// Create `a | b` as `M(1, a, b)`.
    pub fn create_or(&mut self, a: Signal, b: Signal) -> Signal {
        self.create_maj(self.get_constant(true), a, b)
    }

    /// Create `a ^ b` from three majority gates.
    pub fn create_xor(&mut self, a: Signal, b: Signal) -> Signal {
        let either = self.create_or(a, b);
        let both = self.create_and(a, b);
        self.create_and(either, !both)
    }

    /// Number of primary inputs.
    #[must_use]
    pub fn num_pis(&self) -> usize {
        self.inputs.len()
    }

    /// Number of primary outputs.
    #[must_use]
    pub fn num_pos(&self) -> usize {
        self.outputs.len()
    }

    /// Number of majority gates.
    #[must_use]
    pub fn num_gates(&self) -> usize {
        self.nodes.len() - 1 - self.inputs.len()
    }

    /// Returns true if this node is a majority gate.
    #[must_use]
    pub fn is_maj(&self, node: usize) -> bool {
        matches!(self.nodes[node].kind, Kind::Majority(_))
    }

    /// The fanins of a majority gate, in position order.
    #[must_use]
    pub fn fanins(&self, node: usize) -> Option<[Signal; 3]> {
        match self.nodes[node].kind {
            Kind::Majority(children) => Some(children),
            Kind::Zero | Kind::Input(_) => None,
        }
    }

    /// Logic level of a node: zero for inputs and the constant.
    #[must_use]
    pub fn level(&self, node: usize) -> usize {
        self.nodes[node].level
    }

    /// The position of a primary input node in the input list.
    #[must_use]
    pub fn pi_position(&self, node: usize) -> Option<usize> {
        match self.nodes[node].kind {
            Kind::Input(position) => Some(position),
            Kind::Zero | Kind::Majority(_) => None,
        }
    }

    /// The name of the primary input at `position`, if the file named it.
    #[must_use]
    pub fn input_name(&self, position: usize) -> Option<&str> {
        self.input_names.get(&position).map(String::as_str)
    }

    /// The name of the primary output at `position`, if the file named it.
    #[must_use]
    pub fn output_name(&self, position: usize) -> Option<&str> {
        self.output_names.get(&position).map(String::as_str)
    }

    /// Rebuild the network node by node, letting `gate` decide what each majority gate becomes.
    ///
    /// `gate` receives the new network, the old node index, the old fanins translated into the new network and the
    /// translation of every node already visited. Inputs, outputs and their names are carried over.
    pub fn rebuild_with<F>(&self, mut gate: F) -> Self
    where
        F: FnMut(&mut Self, usize, [Signal; 3], &[Signal]) -> Signal,
    {
        let mut mig = Self::new();
        let mut map = vec![Signal::constant(false); self.nodes.len()];

        for (index, node) in self.nodes.iter().enumerate() {
            map[index] = match node.kind {
                Kind::Zero => Signal::constant(false),
                Kind::Input(_) => mig.create_pi(),
                Kind::Majority(children) => {
                    let translated = children.map(|child| map[child.index()].complement_if(child.is_complemented()));
                    gate(&mut mig, index, translated, &map)
                }
            };
        }

        for output in &self.outputs {
            mig.create_po(map[output.index()].complement_if(output.is_complemented()));
        }
        mig.input_names = self.input_names.clone();
        mig.output_names = self.output_names.clone();
        mig
    }

    /// Remove every gate outside the transitive fanin of the primary outputs.
    #[must_use]
    pub fn cleanup_dangling(&self) -> Self {
        let mut live = vec![false; self.nodes.len()];
        let mut stack = self.outputs.iter().map(|output| output.index()).collect::<Vec<_>>();
        while let Some(node) = stack.pop() {
            if live[node] {
                continue;
            }
            live[node] = true;
            if let Some(children) = self.fanins(node) {
                stack.extend(children.iter().map(|child| child.index()));
            }
        }

        let mut mig = Self::new();
        let mut map = vec![Signal::constant(false); self.nodes.len()];
        for (index, node) in self.nodes.iter().enumerate() {
            match node.kind {
                Kind::Zero => {}
                Kind::Input(_) => map[index] = mig.create_pi(),
                Kind::Majority([a, b, c]) => {
                    if live[index] {
                        let [a, b, c] = [a, b, c].map(|child| map[child.index()].complement_if(child.is_complemented()));
                        map[index] = mig.create_maj(a, b, c);
                    }
                }
            }
        }
        for output in &self.outputs {
            mig.create_po(map[output.index()].complement_if(output.is_complemented()));
        }
        mig.input_names = self.input_names.clone();
        mig.output_names = self.output_names.clone();
        mig
    }

    /// Compute the truth table of every node over the primary inputs.
    ///
    /// Returns `None` for networks with more than 16 inputs.
    #[must_use]
    pub fn simulate_nodes(&self) -> Option<Vec<TruthTable>> {
        let vars = self.num_pis();
        if vars > 16 {
            return None;
        }
        let mut tables: Vec<TruthTable> = Vec::with_capacity(self.nodes.len());
        for node in &self.nodes {
            let table = match node.kind {
                Kind::Zero => TruthTable::zero(vars),
                Kind::Input(position) => TruthTable::var(vars, position),
                Kind::Majority(children) => {
                    let [a, b, c] = children.map(|child| tables[child.index()].clone().complement_if(child.is_complemented()));
                    TruthTable::maj(&a, &b, &c)
                }
            };
            tables.push(table);
        }
        Some(tables)
    }

    /// Compute the truth table of every primary output over the primary inputs.
    ///
    /// Returns `None` for networks with more than 16 inputs.
    #[must_use]
    pub fn simulate(&self) -> Option<Vec<TruthTable>> {
        let tables = self.simulate_nodes()?;
        Some(
            self.outputs
                .iter()
                .map(|output| tables[output.index()].clone().complement_if(output.is_complemented()))
                .collect(),
        )
    }
}

impl LogicNetwork for Network {
    fn size(&self) -> usize {
        self.nodes.len()
    }

    fn fanin(&self, node: usize, slot: usize) -> Option<Signal> {
        self.fanins(node).map(|children| children[slot])
    }

    fn is_pi(&self, node: usize) -> bool {
        matches!(self.nodes[node].kind, Kind::Input(_))
    }

    fn fanout_size(&self, node: usize) -> usize {
        self.nodes[node].fanout
    }

    fn pis(&self) -> &[usize] {
        &self.inputs
    }

    fn pos(&self) -> &[Signal] {
        &self.outputs
    }

    fn depth(&self) -> usize {
        self.outputs.iter().map(|output| self.nodes[output.index()].level).max().unwrap_or(0)
    }
}

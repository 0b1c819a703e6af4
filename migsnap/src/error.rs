//! Crate error type.

use thiserror::Error;

/// Errors produced while loading, optimising or inspecting a network.
#[derive(Debug, Error)]
pub enum Error {
    /// The interface was used before `start()` or after `end()`.
    #[error("the interface is not active; call start() first")]
    Inactive,

    /// A node index past the end of the network.
    #[error("access node out of range {index} / {count}")]
    OutOfRange {
        /// Requested index.
        index: usize,
        /// Number of nodes in the network.
        count: usize,
    },

    /// A node record that was never classified.
    #[error("node {index} has an unknown type; the snapshot was not refreshed")]
    Unclassified {
        /// Index of the offending record.
        index: usize,
    },

    /// The network grew since the last snapshot and the record does not exist yet.
    #[error("node {index} is not in the current snapshot of {len} nodes; refresh first")]
    StaleSnapshot {
        /// Requested index.
        index: usize,
        /// Number of records in the snapshot.
        len: usize,
    },

    /// A fanin slot that holds no node.
    #[error("node has no fanin {slot}")]
    MissingFanin {
        /// Fanin position (0, 1 or 2).
        slot: usize,
    },

    /// The circuit file could not be opened.
    #[error("failed to open circuit file: {0}")]
    Io(#[from] std::io::Error),

    /// The AIGER parser rejected the file.
    #[error("malformed AIGER file: {0}")]
    Aiger(String),

    /// The AIGER file declares latches, which a combinational network cannot hold.
    #[error("AIGER file has {0} latches; only combinational networks are supported")]
    Latches(usize),

    /// An AND gate depends on itself.
    #[error("AIGER variable {0} is defined cyclically")]
    Cycle(usize),

    /// A literal refers to a variable that is never defined.
    #[error("AIGER variable {0} is used but never defined")]
    UndefinedLiteral(usize),
}

/// Result alias for this crate.
pub type Result<T> = std::result::Result<T, Error>;

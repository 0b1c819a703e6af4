//! Snapshots of majority-inverter graphs for scripting hosts.
//!
//! Majority-inverter graphs represent boolean logic graphs as a combination of three-input majority gates and
//! inverters (NOT gates). A majority gate `M(x, y, z)` is an AND of two of its inputs when the third is zero and an
//! OR when the third is one, so the pair is universal. The inversion of `x` is written `x'`.
//!
//! This crate keeps one live [`Network`] behind a [`MigInterface`]. A host loads a circuit, runs optimisation passes
//! over it and then reads back a [`Snapshot`]: one flat [`NodeRecord`] per node index, with the node's role and,
//! for internal gates, its fanin inversion pattern in a canonical order:
//!
//! ```
//! use migsnap::{MigInterface, Network, NodeType, Snapshot};
//!
//! let mut mig = Network::new();
//! let a = mig.create_pi();
//! let b = mig.create_pi();
//! let c = mig.create_pi();
//! let m = mig.create_maj(a, !b, c);
//! let out = mig.create_and(m, c);
//! mig.create_po(out);
//!
//! let snapshot = Snapshot::build(&mig);
//! let record = snapshot.get(m.index()).unwrap();
//! assert_eq!(record.node_type(m.index()).unwrap(), NodeType::InvNoNo);
//! assert_eq!(record.fanin(0).unwrap(), b.index());
//!
//! let mut interface = MigInterface::new();
//! interface.start();
//! assert_eq!(interface.node_count().unwrap(), 1);
//! ```
//!
//! With the `python` feature the crate builds as a Python extension module exposing the same interface.

#![forbid(unsafe_code)]
#![warn(clippy::pedantic, clippy::nursery)]
#![warn(missing_docs)]

pub mod classify;
pub mod error;
pub mod graphviz;
pub mod interface;
pub mod network;
pub mod node;
pub mod passes;
mod reader;
pub mod sentinel;
pub mod snapshot;
pub mod traits;
pub mod truth;

#[cfg(feature = "python")]
mod python;

pub use classify::{classify, Role};
pub use error::{Error, Result};
pub use interface::{MigInterface, MigStats};
pub use network::{Network, Signal};
pub use node::{NodeRecord, NodeType};
pub use passes::{Axioms, BalanceParams, Optimizer, Pass, PassStats, RefactorParams, ResubParams, RewriteParams};
pub use snapshot::Snapshot;
pub use traits::LogicNetwork;
pub use truth::TruthTable;

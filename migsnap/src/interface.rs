//! The facade a scripting host drives: lifecycle, loading, optimisation passes and structural queries.

use std::path::Path;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::network::Network;
use crate::node::NodeRecord;
use crate::passes::{Axioms, BalanceParams, Optimizer, Pass, PassStats, RefactorParams, ResubParams, RewriteParams};
use crate::snapshot::Snapshot;
use crate::traits::LogicNetwork;

/// Network-level aggregates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigStats {
    /// Number of primary inputs.
    pub num_inputs: usize,
    /// Number of primary outputs.
    pub num_outputs: usize,
    /// Number of latches. Always zero: sequential files are rejected on load.
    pub num_latches: usize,
    /// Number of nodes, counting the constant and the primary inputs.
    pub num_nodes: usize,
    /// Gates on the longest input-to-output path.
    pub depth: usize,
}

/// Owns one live network and the most recent snapshot of it.
///
/// Every operation fails with [`Error::Inactive`] outside a `start()`/`end()` bracket. Passes mutate the network
/// without refreshing the snapshot; [`stats`](Self::stats), [`load`](Self::load) and [`refresh`](Self::refresh) do.
#[derive(Debug)]
pub struct MigInterface<O: Optimizer = Axioms> {
    mig: Network,
    optimizer: O,
    snapshot: Snapshot,
    active: bool,
}

impl MigInterface<Axioms> {
    /// An inactive interface using the bundled optimiser.
    #[must_use]
    pub fn new() -> Self {
        Self::with_optimizer(Axioms)
    }
}

impl Default for MigInterface<Axioms> {
    fn default() -> Self {
        Self::new()
    }
}

impl<O: Optimizer> MigInterface<O> {
    /// An inactive interface running passes through `optimizer`.
    pub fn with_optimizer(optimizer: O) -> Self {
        Self {
            mig: Network::new(),
            optimizer,
            snapshot: Snapshot::default(),
            active: false,
        }
    }

    /// Discard any network and start over with an empty one.
    pub fn start(&mut self) {
        self.mig = Network::new();
        self.snapshot = Snapshot::default();
        self.active = true;
        debug!("interface started");
    }

    /// Deactivate the interface until the next `start()`.
    pub fn end(&mut self) {
        self.active = false;
        debug!("interface ended");
    }

    /// Returns true between `start()` and `end()`.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    fn ensure_active(&self) -> Result<()> {
        if self.active {
            Ok(())
        } else {
            Err(Error::Inactive)
        }
    }

    /// Replace the network with the contents of an AIGER file, ASCII or binary, and refresh the snapshot.
    ///
    /// Returns the time spent reading. A failed load leaves the previous network in place.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive or the file cannot be read.
    pub fn load<P: AsRef<Path>>(&mut self, path: P) -> Result<Duration> {
        self.ensure_active()?;
        let start = Instant::now();
        let mig = Network::from_aiger(path.as_ref()).map_err(|err| {
            warn!("failed to load {}: {}", path.as_ref().display(), err);
            err
        })?;
        let elapsed = start.elapsed();

        self.mig = mig;
        self.refresh()?;
        info!(
            "loaded {} in {:?}: {} inputs, {} outputs, {} gates",
            path.as_ref().display(),
            elapsed,
            self.mig.num_pis(),
            self.mig.num_pos(),
            self.mig.num_gates()
        );
        Ok(elapsed)
    }

    /// Run one optimisation pass. The snapshot is left as it was.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn run_pass(&mut self, pass: &Pass) -> Result<PassStats> {
        self.ensure_active()?;
        Ok(self.optimizer.run(&mut self.mig, pass))
    }

    /// Balance the network, returning the time the pass reported.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn balance(&mut self, ps: &BalanceParams) -> Result<Duration> {
        self.run_pass(&Pass::Balance(*ps)).map(|stats| stats.time_total)
    }

    /// Cut-rewrite the network, returning the time the pass reported.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn rewrite(&mut self, ps: &RewriteParams) -> Result<Duration> {
        self.run_pass(&Pass::Rewrite(*ps)).map(|stats| stats.time_total)
    }

    /// Refactor the network, returning the time the pass reported.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn refactor(&mut self, ps: &RefactorParams) -> Result<Duration> {
        self.run_pass(&Pass::Refactor(*ps)).map(|stats| stats.time_total)
    }

    /// Resubstitute the network, returning the time the pass reported.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn resubstitute(&mut self, ps: &ResubParams) -> Result<Duration> {
        self.run_pass(&Pass::Resubstitute(*ps)).map(|stats| stats.time_total)
    }

    /// Rebuild the snapshot from the live network.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn refresh(&mut self) -> Result<&Snapshot> {
        self.ensure_active()?;
        self.snapshot = Snapshot::build(&self.mig);
        Ok(&self.snapshot)
    }

    /// Refresh the snapshot and summarise the network.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn stats(&mut self) -> Result<MigStats> {
        let num_nodes = self.refresh()?.len();
        Ok(MigStats {
            num_inputs: self.mig.num_pis(),
            num_outputs: self.mig.num_pos(),
            num_latches: 0,
            num_nodes,
            depth: self.mig.depth(),
        })
    }

    /// Number of nodes in the live network, counting the constant and the primary inputs.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn node_count(&self) -> Result<usize> {
        self.ensure_active()?;
        Ok(self.mig.size())
    }

    /// The snapshot record of node `index`.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive, with [`Error::OutOfRange`] past the end of the live network, and with
    /// [`Error::StaleSnapshot`] for nodes added since the last refresh.
    pub fn node(&self, index: usize) -> Result<&NodeRecord> {
        self.ensure_active()?;
        let count = self.mig.size();
        if index >= count {
            return Err(Error::OutOfRange { index, count });
        }
        self.snapshot.get(index)
    }

    /// The most recent snapshot.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn snapshot(&self) -> Result<&Snapshot> {
        self.ensure_active()?;
        Ok(&self.snapshot)
    }

    /// The live network.
    ///
    /// # Errors
    ///
    /// Fails if the interface is inactive.
    pub fn network(&self) -> Result<&Network> {
        self.ensure_active()?;
        Ok(&self.mig)
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::{MigInterface, MigStats};
    use crate::error::Error;
    use crate::network::Network;
    use crate::passes::{BalanceParams, Optimizer, PassStats, RefactorParams, ResubParams, RewriteParams};

    /// Counts calls and leaves the network alone.
    #[derive(Default)]
    struct Recorder {
        calls: Vec<&'static str>,
    }

    impl Optimizer for Recorder {
        fn balance(&mut self, _: &mut Network, _: &BalanceParams) -> PassStats {
            self.calls.push("balance");
            PassStats::default()
        }

        fn cut_rewrite(&mut self, _: &mut Network, _: &RewriteParams) -> PassStats {
            self.calls.push("rewrite");
            PassStats::default()
        }

        fn refactor(&mut self, _: &mut Network, _: &RefactorParams) -> PassStats {
            self.calls.push("refactor");
            PassStats::default()
        }

        fn resubstitute(&mut self, ntk: &mut Network, _: &ResubParams) -> PassStats {
            // Grow the network so the snapshot goes stale.
            let a = ntk.create_pi();
            let b = ntk.create_pi();
            let g = ntk.create_and(a, b);
            ntk.create_po(g);
            self.calls.push("resub");
            PassStats {
                time_total: Duration::from_millis(5),
                ..PassStats::default()
            }
        }
    }

    #[test]
    fn inactive_until_started() {
        let mut interface = MigInterface::new();
        assert!(!interface.is_active());
        assert!(matches!(interface.stats(), Err(Error::Inactive)));
        assert!(matches!(interface.node_count(), Err(Error::Inactive)));
        assert!(matches!(interface.balance(&BalanceParams::default()), Err(Error::Inactive)));

        interface.start();
        assert_eq!(interface.node_count().unwrap(), 1);
        assert_eq!(
            interface.stats().unwrap(),
            MigStats {
                num_nodes: 1,
                ..MigStats::default()
            }
        );
    }

    #[test]
    fn end_fails_fast() {
        let mut interface = MigInterface::new();
        interface.start();
        interface.end();
        assert!(matches!(interface.node(0), Err(Error::Inactive)));
        assert!(matches!(interface.load("missing.aag"), Err(Error::Inactive)));
        assert!(matches!(interface.refactor(&RefactorParams::default()), Err(Error::Inactive)));

        assert!(matches!(interface.snapshot(), Err(Error::Inactive)));
        assert!(matches!(interface.network(), Err(Error::Inactive)));
        assert!(matches!(interface.refresh(), Err(Error::Inactive)));

        interface.start();
        assert!(matches!(interface.node(0), Err(Error::StaleSnapshot { index: 0, len: 0 })));
        interface.refresh().unwrap();
        assert!(interface.node(0).is_ok());
        assert_eq!(interface.snapshot().unwrap().len(), 1);
    }

    #[test]
    fn ended_interface_hides_its_network() {
        let mut interface = MigInterface::new();
        interface.start();
        let mut mig = Network::new();
        let a = mig.create_pi();
        mig.create_po(a);
        interface.mig = mig;
        interface.refresh().unwrap();
        assert_eq!(interface.network().unwrap().num_pis(), 1);

        interface.end();
        assert!(matches!(interface.network(), Err(Error::Inactive)));
        assert!(matches!(interface.snapshot(), Err(Error::Inactive)));

        // start() begins from an empty network, not the one left behind.
        interface.start();
        assert_eq!(interface.network().unwrap().num_pis(), 0);
        assert!(interface.snapshot().unwrap().is_empty());
    }

    #[test]
    fn passes_go_through_the_optimizer() {
        let mut interface = MigInterface::with_optimizer(Recorder::default());
        interface.start();
        interface.balance(&BalanceParams::default()).unwrap();
        interface.rewrite(&RewriteParams::default()).unwrap();
        interface.refactor(&RefactorParams::default()).unwrap();
        let elapsed = interface.resubstitute(&ResubParams::default()).unwrap();
        assert_eq!(elapsed, Duration::from_millis(5));
        assert_eq!(interface.optimizer.calls, ["balance", "rewrite", "refactor", "resub"]);
    }

    #[test]
    fn passes_leave_snapshot_stale() {
        let mut interface = MigInterface::with_optimizer(Recorder::default());
        interface.start();
        interface.refresh().unwrap();
        interface.resubstitute(&ResubParams::default()).unwrap();

        assert_eq!(interface.node_count().unwrap(), 4);
        assert!(matches!(interface.node(3), Err(Error::StaleSnapshot { index: 3, len: 1 })));
        assert!(matches!(interface.node(4), Err(Error::OutOfRange { index: 4, count: 4 })));

        let stats = interface.stats().unwrap();
        assert_eq!(stats.num_nodes, 4);
        assert_eq!(stats.depth, 1);
        assert!(interface.node(3).is_ok());
    }

    #[test]
    fn stats_serialize() {
        let stats = MigStats {
            num_inputs: 3,
            num_outputs: 2,
            num_latches: 0,
            num_nodes: 9,
            depth: 3,
        };
        let json = serde_json::to_value(stats).unwrap();
        assert_eq!(json["num_nodes"], 9);
        assert_eq!(serde_json::from_value::<MigStats>(json).unwrap(), stats);
    }
}

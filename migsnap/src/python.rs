//! Python bindings.
//!
//! Inactive interfaces and unreadable files answer with `-1.0` (or `-1`, or `None`) instead of raising, so scripts
//! can check the interface cheaply. Indices past the end raise `IndexError`. Reading a record the snapshot does not
//! hold yet, or one never classified, raises `RuntimeError`.

use pyo3::exceptions::{PyIndexError, PyRuntimeError};
use pyo3::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::error::Error;
use crate::interface::{MigInterface, MigStats};
use crate::node::NodeRecord;
use crate::passes::{BalanceParams, RefactorParams, ResubParams, RewriteParams};
use crate::sentinel::{count, seconds, unless_inactive};

fn to_py_err(err: Error) -> PyErr {
    match err {
        Error::OutOfRange { .. } => PyIndexError::new_err(err.to_string()),
        _ => PyRuntimeError::new_err(err.to_string()),
    }
}

/// Network-level aggregates, as returned by `MigInterface.stats()`.
#[pyclass(name = "MigStats")]
#[derive(Clone, Copy)]
pub struct PyMigStats {
    #[pyo3(get, name = "numInputs")]
    num_inputs: usize,
    #[pyo3(get, name = "numOutputs")]
    num_outputs: usize,
    #[pyo3(get, name = "numLatches")]
    num_latches: usize,
    #[pyo3(get, name = "numNodes")]
    num_nodes: usize,
    #[pyo3(get)]
    depth: usize,
}

impl From<MigStats> for PyMigStats {
    fn from(stats: MigStats) -> Self {
        Self {
            num_inputs: stats.num_inputs,
            num_outputs: stats.num_outputs,
            num_latches: stats.num_latches,
            num_nodes: stats.num_nodes,
            depth: stats.depth,
        }
    }
}

#[pymethods]
impl PyMigStats {
    fn __repr__(&self) -> String {
        format!(
            "MigStats(numInputs={}, numOutputs={}, numLatches={}, numNodes={}, depth={})",
            self.num_inputs, self.num_outputs, self.num_latches, self.num_nodes, self.depth
        )
    }
}

/// One snapshot record.
#[pyclass(name = "MigNode")]
#[derive(Clone, Copy)]
pub struct PyMigNode {
    index: usize,
    record: NodeRecord,
}

impl PyMigNode {
    fn fanin_or_sentinel(&self, slot: usize) -> i64 {
        self.record
            .fanin(slot)
            .ok()
            .and_then(|fanin| i64::try_from(fanin).ok())
            .unwrap_or(-1)
    }
}

#[pymethods]
impl PyMigNode {
    #[pyo3(name = "hasFanin0")]
    fn has_fanin0(&self) -> bool {
        self.record.has_fanin(0)
    }

    #[pyo3(name = "hasFanin1")]
    fn has_fanin1(&self) -> bool {
        self.record.has_fanin(1)
    }

    #[pyo3(name = "hasFanin2")]
    fn has_fanin2(&self) -> bool {
        self.record.has_fanin(2)
    }

    /// Node index of fanin 0, or -1.
    fn fanin0(&self) -> i64 {
        self.fanin_or_sentinel(0)
    }

    /// Node index of fanin 1, or -1.
    fn fanin1(&self) -> i64 {
        self.fanin_or_sentinel(1)
    }

    /// Node index of fanin 2, or -1.
    fn fanin2(&self) -> i64 {
        self.fanin_or_sentinel(2)
    }

    /// Number of fanouts, or -1 if never computed.
    #[pyo3(name = "fanoutCount")]
    fn fanout_count(&self) -> i64 {
        self.record
            .fanout_count()
            .and_then(|count| i64::try_from(count).ok())
            .unwrap_or(-1)
    }

    #[pyo3(name = "numFanouts")]
    fn num_fanouts(&self) -> i64 {
        self.fanout_count()
    }

    /// The type code: 0 constant, 1 PI, 2 PO, 3 abc, 4 ~abc, 5 ~a~bc, 6 ~a~b~c, 7 PI and PO, 8 PO and constant.
    #[pyo3(name = "nodeType")]
    fn node_type(&self) -> PyResult<u8> {
        self.record.node_type(self.index).map(|node_type| node_type.code()).map_err(to_py_err)
    }

    fn __repr__(&self) -> String {
        format!(
            "MigNode(index={}, fanins={:?}, fanouts={:?}, type={:?})",
            self.index,
            self.record.fanins(),
            self.record.fanout_count(),
            self.record.raw_node_type()
        )
    }
}

/// A live network and its snapshot.
#[pyclass(name = "MigInterface")]
pub struct PyMigInterface {
    inner: MigInterface,
}

#[pymethods]
impl PyMigInterface {
    #[new]
    fn new() -> Self {
        Self {
            inner: MigInterface::new(),
        }
    }

    fn start(&mut self) {
        self.inner.start();
    }

    fn end(&mut self) {
        self.inner.end();
    }

    #[pyo3(name = "isActive")]
    fn is_active(&self) -> bool {
        self.inner.is_active()
    }

    /// Load an ASCII AIGER file, returning the seconds spent or -1.0.
    fn load(&mut self, path: &str) -> f64 {
        seconds(self.inner.load(path))
    }

    fn read(&mut self, path: &str) -> f64 {
        self.load(path)
    }

    #[pyo3(signature = (critical_path_only = false, cut_size = 4))]
    fn balance(&mut self, critical_path_only: bool, cut_size: usize) -> f64 {
        seconds(self.inner.balance(&BalanceParams {
            critical_path_only,
            cut_size,
        }))
    }

    #[pyo3(signature = (allow_zero_gain = false, use_dont_cares = false, preserve_depth = false, min_cut_size = 3))]
    fn rewrite(&mut self, allow_zero_gain: bool, use_dont_cares: bool, preserve_depth: bool, min_cut_size: usize) -> f64 {
        seconds(self.inner.rewrite(&RewriteParams {
            allow_zero_gain,
            use_dont_cares,
            preserve_depth,
            min_cut_size,
        }))
    }

    #[pyo3(signature = (allow_zero_gain = false, use_dont_cares = false))]
    fn refactor(&mut self, allow_zero_gain: bool, use_dont_cares: bool) -> f64 {
        seconds(self.inner.refactor(&RefactorParams {
            allow_zero_gain,
            use_dont_cares,
        }))
    }

    #[pyo3(signature = (max_inputs = 8, max_insertions = 2, use_dont_cares = false, window_size = 12, preserve_depth = false))]
    fn resubstitute(
        &mut self,
        max_inputs: usize,
        max_insertions: usize,
        use_dont_cares: bool,
        window_size: usize,
        preserve_depth: bool,
    ) -> f64 {
        seconds(self.inner.resubstitute(&ResubParams {
            max_inputs,
            max_insertions,
            use_dont_cares,
            window_size,
            preserve_depth,
        }))
    }

    /// Rebuild the snapshot. Returns false on an inactive interface.
    fn refresh(&mut self) -> bool {
        self.inner.refresh().is_ok()
    }

    fn stats(&mut self) -> PyResult<Option<PyMigStats>> {
        let stats = unless_inactive(self.inner.stats()).map_err(to_py_err)?;
        Ok(stats.map(PyMigStats::from))
    }

    #[pyo3(name = "nodeCount")]
    fn node_count(&self) -> i64 {
        count(self.inner.node_count())
    }

    fn node(&self, index: i64) -> PyResult<Option<PyMigNode>> {
        if !self.inner.is_active() {
            return Ok(None);
        }
        let index = usize::try_from(index).map_err(|_| PyIndexError::new_err(format!("negative node index {}", index)))?;
        let record = self.inner.node(index).map_err(to_py_err)?;
        Ok(Some(PyMigNode { index, record: *record }))
    }

    /// The symbol of primary input `position`, if the file named it. `None` when inactive.
    #[pyo3(name = "inputName")]
    fn input_name(&self, position: usize) -> PyResult<Option<String>> {
        let mig = unless_inactive(self.inner.network()).map_err(to_py_err)?;
        Ok(mig.and_then(|mig| mig.input_name(position)).map(str::to_owned))
    }

    /// The symbol of primary output `position`, if the file named it. `None` when inactive.
    #[pyo3(name = "outputName")]
    fn output_name(&self, position: usize) -> PyResult<Option<String>> {
        let mig = unless_inactive(self.inner.network()).map_err(to_py_err)?;
        Ok(mig.and_then(|mig| mig.output_name(position)).map(str::to_owned))
    }

    /// Write the current snapshot as a Graphviz dot file. Returns false on an inactive interface.
    #[pyo3(name = "toGraphviz")]
    fn to_graphviz(&self, path: &str) -> PyResult<bool> {
        match unless_inactive(self.inner.snapshot()).map_err(to_py_err)? {
            Some(snapshot) => snapshot
                .to_graphviz(path)
                .map(|()| true)
                .map_err(|err| PyRuntimeError::new_err(err.to_string())),
            None => Ok(false),
        }
    }
}

/// Send log records to stderr, filtered by `RUST_LOG` or else by `filter`.
#[pyfunction]
#[pyo3(signature = (filter = "info"))]
fn enable_logging(filter: &str) -> PyResult<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| PyRuntimeError::new_err(err.to_string()))
}

#[pymodule]
fn migsnap(_py: Python, m: &PyModule) -> PyResult<()> {
    m.add_class::<PyMigInterface>()?;
    m.add_class::<PyMigStats>()?;
    m.add_class::<PyMigNode>()?;
    m.add_function(wrap_pyfunction!(enable_logging, m)?)?;
    Ok(())
}

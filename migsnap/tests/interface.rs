use migsnap::{
    BalanceParams, Error, LogicNetwork, MigInterface, MigStats, NodeType, RefactorParams, ResubParams, RewriteParams,
};

const HALF_ADDER: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/half_adder.aag");
const HALF_ADDER_BINARY: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/half_adder.aig");
const PASSTHROUGH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/passthrough.aag");
const REDUNDANT: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/redundant.aag");
const LATCH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/latch.aag");
const MALFORMED: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/data/malformed.aag");

fn started() -> MigInterface {
    let mut interface = MigInterface::new();
    interface.start();
    interface
}

#[test]
fn load_half_adder() {
    let mut interface = started();
    interface.load(HALF_ADDER).unwrap();

    let stats = interface.stats().unwrap();
    assert_eq!(
        stats,
        MigStats {
            num_inputs: 2,
            num_outputs: 2,
            num_latches: 0,
            num_nodes: 6,
            depth: 2,
        }
    );

    // Outputs are signals, not nodes: the count is the constant, the inputs and the gates.
    let mig = interface.network().unwrap();
    assert_eq!(interface.node_count().unwrap(), 1 + mig.num_pis() + mig.num_gates());

    let type_of = |index| interface.node(index).unwrap().node_type(index).unwrap();
    assert_eq!(type_of(0), NodeType::Constant);
    assert_eq!(type_of(1), NodeType::PrimaryInput);
    assert_eq!(type_of(2), NodeType::PrimaryInput);
    // carry = M(0, a, b)
    assert_eq!(type_of(3), NodeType::PrimaryOutput);
    // a | b is stored as M(1, a, b) = M(0', a, b), feeding only the sum
    assert_eq!(type_of(4), NodeType::InvNoNo);
    assert_eq!(type_of(5), NodeType::PrimaryOutput);

    let carry = interface.node(3).unwrap();
    assert_eq!(carry.fanins(), [Some(0), Some(1), Some(2)]);
    assert_eq!(carry.fanout_count(), Some(2));

    assert!(matches!(interface.node(6), Err(Error::OutOfRange { index: 6, count: 6 })));
}

#[test]
fn binary_matches_ascii() {
    let mut ascii = started();
    ascii.load(HALF_ADDER).unwrap();
    let mut binary = started();
    binary.load(HALF_ADDER_BINARY).unwrap();

    assert_eq!(binary.stats().unwrap(), ascii.stats().unwrap());
    assert_eq!(binary.snapshot().unwrap(), ascii.snapshot().unwrap());
    let mig = binary.network().unwrap();
    assert_eq!(mig.simulate(), ascii.network().unwrap().simulate());
    assert_eq!(mig.input_name(1), Some("b"));
    assert_eq!(mig.output_name(0), Some("carry"));
}

#[test]
fn symbols_are_kept() {
    let mut interface = started();
    interface.load(HALF_ADDER).unwrap();
    let mig = interface.network().unwrap();
    assert_eq!(mig.input_name(0), Some("a"));
    assert_eq!(mig.input_name(1), Some("b"));
    assert_eq!(mig.output_name(0), Some("carry"));
    assert_eq!(mig.output_name(1), Some("sum"));
    assert_eq!(mig.output_name(2), None);
}

#[test]
fn stats_are_idempotent() {
    let mut interface = started();
    interface.load(REDUNDANT).unwrap();
    let first = interface.stats().unwrap();
    let snapshot = interface.snapshot().unwrap().clone();
    let second = interface.stats().unwrap();
    assert_eq!(first, second);
    assert_eq!(&snapshot, interface.snapshot().unwrap());
}

#[test]
fn every_node_classified_and_fanouts_consistent() {
    let mut interface = started();
    interface.load(REDUNDANT).unwrap();

    let count = interface.node_count().unwrap();
    let mut fanouts = 0;
    let mut edges = 0;
    for index in 0..count {
        let record = interface.node(index).unwrap();
        assert_ne!(record.node_type(index).unwrap(), NodeType::Unknown);
        fanouts += record.fanout_count().unwrap();
        edges += (0..3).filter(|slot| record.has_fanin(*slot)).count();
    }
    assert_eq!(fanouts, edges + interface.network().unwrap().num_pos());
}

#[test]
fn dual_roles() {
    let mut interface = started();
    interface.load(PASSTHROUGH).unwrap();

    let constant = interface.node(0).unwrap();
    assert_eq!(constant.node_type(0).unwrap(), NodeType::ConstantOutput);
    let input = interface.node(1).unwrap();
    assert_eq!(input.node_type(1).unwrap(), NodeType::PrimaryInputOutput);
    assert!((0..3).all(|slot| !input.has_fanin(slot)));
}

#[test]
fn failed_load_keeps_network() {
    let mut interface = started();
    interface.load(HALF_ADDER).unwrap();

    assert!(matches!(interface.load(LATCH), Err(Error::Latches(1))));
    assert!(interface.load(MALFORMED).is_err());
    assert!(matches!(interface.load("/nonexistent/circuit.aag"), Err(Error::Io(_))));

    assert_eq!(interface.node_count().unwrap(), 6);
    assert_eq!(interface.stats().unwrap().num_inputs, 2);
    assert!(interface.node(5).is_ok());
}

#[test]
fn load_replaces_network() {
    let mut interface = started();
    interface.load(REDUNDANT).unwrap();
    interface.load(HALF_ADDER).unwrap();
    assert_eq!(interface.node_count().unwrap(), 6);
}

#[test]
fn passes_preserve_function() {
    let mut interface = started();
    interface.load(REDUNDANT).unwrap();
    let expected = interface.network().unwrap().simulate();
    let gates = interface.network().unwrap().num_gates();

    // The only cut worth rewriting has two leaves, below the default minimum.
    interface.rewrite(&RewriteParams::default()).unwrap();
    assert_eq!(interface.network().unwrap().num_gates(), gates);
    interface.refactor(&RefactorParams::default()).unwrap();
    assert!(interface.network().unwrap().num_gates() < gates);
    interface.balance(&BalanceParams::default()).unwrap();
    interface.resubstitute(&ResubParams::default()).unwrap();
    assert_eq!(interface.network().unwrap().simulate(), expected);

    let stats = interface.stats().unwrap();
    assert_eq!(stats.num_nodes, interface.node_count().unwrap());
    assert_eq!(stats.depth, interface.network().unwrap().depth());
    assert!(interface.snapshot().unwrap().is_complete());
}

#[test]
fn queries_after_end_fail() {
    let mut interface = started();
    interface.load(HALF_ADDER).unwrap();
    interface.end();

    assert!(matches!(interface.load(HALF_ADDER), Err(Error::Inactive)));
    assert!(matches!(interface.balance(&BalanceParams::default()), Err(Error::Inactive)));
    assert!(matches!(interface.stats(), Err(Error::Inactive)));
    assert!(matches!(interface.node_count(), Err(Error::Inactive)));
    assert!(matches!(interface.node(0), Err(Error::Inactive)));
    assert!(matches!(interface.network(), Err(Error::Inactive)));
    assert!(matches!(interface.snapshot(), Err(Error::Inactive)));
    assert!(matches!(interface.refresh(), Err(Error::Inactive)));

    interface.start();
    assert_eq!(interface.node_count().unwrap(), 1);
}

//! Probe protocol layer: scenarios, handshake inspection, and verdicts.

pub mod negotiation;
pub mod scenario;
pub mod verdict;

pub use negotiation::{count_resources, ServerHandshake};
pub use scenario::{
    IdSequence, ProbeMessage, ReadMode, Scenario, ScenarioKind, INITIALIZE_METHOD,
    RESOURCES_LIST_METHOD,
};
pub use verdict::{RunState, Verdict};

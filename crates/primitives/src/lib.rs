//! This crate contains the types shared between the dispute graph, the chain observer and the
//! dispute reactor: hashes and addresses, graph positions, detected opportunities, contract call
//! arguments and the events emitted by the rollup contract.
//!
//! It lies at the bottom of the crate-hierarchy in this workspace i.e., it does not depend on any
//! other crate in this workspace.

pub mod buf;
pub mod errors;
pub mod events;
pub mod node;
pub mod opportunity;
pub mod params;
pub mod types;

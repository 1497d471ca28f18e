//! This crate implements the reactive decision layer of a rollup validator. It watches the rollup
//! contract's staking and challenge events together with the opportunities found in the dispute
//! graph, and decides which locally controlled staker, if any, should act on them.
//!
//! Every on-chain action is submitted on a detached task. Actions that only need to happen once
//! per node or leaf are de-duplicated by the [`reactor::ProtocolReactor`], and each staker's
//! submissions are serialized by its [`staker_agent::StakerAgent`].

pub mod config;
pub mod constants;
pub mod dedup;
pub mod errors;
pub mod events;
pub mod interfaces;
pub mod reactor;
pub mod service;
pub mod staker_agent;
pub mod submissions;

#[cfg(test)]
mod test_utils;

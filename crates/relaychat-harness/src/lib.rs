//! Deterministic simulation harness for relaychat.
//!
//! Runs the production [`relaychat_app::Runtime`] against a [`SimDriver`]
//! with a virtual clock, so timing-dependent behavior (notice expiry) is
//! tested without sleeping.
//!
//! # Invariant Testing
//!
//! The `invariants` module provides behavioral testing through invariant
//! checks. Invariants verify WHAT must be true across all execution paths,
//! not specific scenarios. Use [`InvariantRegistry::standard()`] for the
//! common App invariants; [`SimDriver`] checks them on every render.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod invariants;
pub mod sim_clock;
pub mod sim_driver;
pub mod simulation;

pub use invariants::{
    AppSnapshot, EstablishedHasUsername, Invariant, InvariantRegistry, InvariantResult,
    NoticeDeadlineConsistent, OutboundRequiresEstablished, ScrollWithinBounds,
    VisibleSubsetOfStored, Violation,
};
pub use sim_clock::SimInstant;
pub use sim_driver::{SimDriver, SimDriverError};
pub use simulation::Simulation;

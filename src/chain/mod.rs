//! The state-chain execution engine.
//!
//! A chain is an ordered list of steps sharing a mutable [`StateBag`].
//! Registration order IS the dependency order: later steps read what
//! earlier steps wrote, and no reordering or parallel execution is ever
//! performed. A step may raise a response to short-circuit the chain, in
//! which case execution jumps forward to the finalization tail.

pub mod executor;
pub mod state;

pub use executor::{Chain, Step, StepFlow};
pub use state::{SlotId, StateBag, User};

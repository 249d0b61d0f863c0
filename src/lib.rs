//! Deterministic Ethereum Virtual Machine execution engine.
//!
//! The interpreter and its capability set live in the runtime crate and the
//! gas rules in the gasometer. This crate adds the world state they run
//! against and the executor that nests frames over checkpoints.

#![forbid(unsafe_code, unused_variables)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub use evm_engine_gasometer as gasometer;
pub use evm_engine_runtime::*;

#[cfg(feature = "tracing")]
pub mod tracing;

#[cfg(feature = "tracing")]
macro_rules! event {
	($x:expr) => {
		use crate::tracing::Event::*;
		crate::tracing::with(|listener| listener.event($x));
	};
}

#[cfg(not(feature = "tracing"))]
macro_rules! event {
	($x:expr) => {};
}

pub mod backend;
pub mod executor;

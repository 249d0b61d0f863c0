//! Runtime layer for EVM. Wraps the core machine with the capability set and
//! the handler the external opcodes go through.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

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

mod config;
mod context;
mod eval;
mod handler;

pub use evm_engine_core::*;

pub use crate::config::{Config, ConfigError, Hardfork, OpcodeCost, OPTIONAL_EIPS};
pub use crate::context::{CallScheme, Context, CreateScheme};
pub use crate::handler::{Handler, Transfer};

use alloc::rc::Rc;
use alloc::vec::Vec;

/// EVM runtime. This is the interpreter of one frame: the core machine, the
/// frame context and the return data of the last child frame.
pub struct Runtime<'config> {
	machine: Machine,
	status: Result<(), ExitReason>,
	return_data_buffer: Vec<u8>,
	context: Context,
	config: &'config Config,
	/// Account the frame acts for after a successful `AUTH`.
	authorized: Option<primitive_types::H160>,
}

impl<'config> Runtime<'config> {
	/// Create a new runtime with given code and data.
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		context: Context,
		config: &'config Config,
	) -> Self {
		Self {
			machine: Machine::new(code, data, config.stack_limit, config.memory_limit),
			status: Ok(()),
			return_data_buffer: Vec::new(),
			context,
			config,
			authorized: None,
		}
	}

	/// Get a reference to the machine.
	pub fn machine(&self) -> &Machine {
		&self.machine
	}

	/// Get a reference to the execution context.
	pub fn context(&self) -> &Context {
		&self.context
	}

	/// Return data of the last call or create.
	pub fn return_data_buffer(&self) -> &[u8] {
		&self.return_data_buffer
	}

	/// Account authorized by the last `AUTH` of this frame, if any.
	pub fn authorized(&self) -> Option<primitive_types::H160> {
		self.authorized
	}

	fn exit(&mut self, reason: ExitReason) -> ExitReason {
		self.machine.exit(reason.clone());
		self.status = Err(reason.clone());
		reason
	}

	/// Step the runtime by one opcode. The handler is charged first.
	pub fn step<H: Handler>(&mut self, handler: &mut H) -> Result<(), ExitReason> {
		if let Err(reason) = &self.status {
			return Err(reason.clone());
		}

		if let Some((opcode, stack)) = self.machine.inspect() {
			event!(Step {
				context: &self.context,
				opcode,
				position: self.machine.position(),
				stack,
				memory: self.machine.memory()
			});

			if let Err(error) = handler.pre_validate(&self.context, opcode, stack) {
				return Err(self.exit(error.into()));
			}
		}

		let result = match self.machine.step() {
			Ok(()) => Ok(()),
			Err(Capture::Exit(reason)) => Err(self.exit(reason)),
			Err(Capture::Trap(opcode)) => match eval::eval(self, opcode, handler) {
				eval::Control::Continue => Ok(()),
				eval::Control::Exit(reason) => Err(self.exit(reason)),
			},
		};

		event!(StepResult {
			result: &result,
			return_value: &self.machine.return_value()
		});

		result
	}

	/// Loop stepping the runtime until it stops.
	pub fn run<H: Handler>(&mut self, handler: &mut H) -> ExitReason {
		loop {
			if let Err(reason) = self.step(handler) {
				return reason;
			}
		}
	}
}

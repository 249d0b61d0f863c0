//! Core layer for the EVM. Holds the stack machine and every opcode that
//! does not need to consult the outside world.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod eof;
mod error;
mod eval;
mod memory;
mod opcode;
mod stack;
mod utils;
mod valids;

pub use crate::error::{Capture, ExitError, ExitFatal, ExitReason, ExitRevert, ExitSucceed, Trap};
pub use crate::memory::Memory;
pub use crate::opcode::Opcode;
pub use crate::stack::Stack;
pub use crate::utils::USIZE_MAX;
pub use crate::valids::Valids;

use crate::eval::{eval, Control};
use alloc::rc::Rc;
use alloc::vec::Vec;
use core::ops::Range;
use primitive_types::U256;

/// Maximum depth of the subroutine return stack.
pub const RETURN_STACK_LIMIT: usize = 1023;

/// Core execution layer for EVM.
pub struct Machine {
	/// Program data.
	data: Rc<Vec<u8>>,
	/// Program code.
	code: Rc<Vec<u8>>,
	/// Program counter.
	position: Result<usize, ExitReason>,
	/// Return value.
	return_range: Range<U256>,
	/// Code validity maps, computed on the first jump.
	valids: Option<Valids>,
	/// Memory.
	memory: Memory,
	/// Stack.
	stack: Stack,
	/// Subroutine return positions.
	return_stack: Vec<usize>,
}

impl Machine {
	/// Reference of machine stack.
	pub fn stack(&self) -> &Stack {
		&self.stack
	}
	/// Mutable reference of machine stack.
	pub fn stack_mut(&mut self) -> &mut Stack {
		&mut self.stack
	}
	/// Reference of machine memory.
	pub fn memory(&self) -> &Memory {
		&self.memory
	}
	/// Mutable reference of machine memory.
	pub fn memory_mut(&mut self) -> &mut Memory {
		&mut self.memory
	}
	/// Return a reference of the program counter.
	pub fn position(&self) -> &Result<usize, ExitReason> {
		&self.position
	}
	/// Program code.
	pub fn code(&self) -> &[u8] {
		&self.code
	}
	/// Program input data.
	pub fn data(&self) -> &[u8] {
		&self.data
	}

	/// Create a new machine with given code and data.
	pub fn new(
		code: Rc<Vec<u8>>,
		data: Rc<Vec<u8>>,
		stack_limit: usize,
		memory_limit: usize,
	) -> Self {
		Self {
			data,
			code,
			position: Ok(0),
			return_range: U256::zero()..U256::zero(),
			valids: None,
			memory: Memory::new(memory_limit),
			stack: Stack::new(stack_limit),
			return_stack: Vec::new(),
		}
	}

	/// Explicit exit of the machine. Further step will return error.
	pub fn exit(&mut self, reason: ExitReason) {
		self.position = Err(reason);
	}

	/// Jump destination analysis of the code. Runs once per machine.
	pub fn valids(&mut self) -> &Valids {
		self.valids.get_or_insert_with(|| Valids::new(&self.code))
	}

	/// Whether the jump destination analysis has already run.
	pub fn is_analyzed(&self) -> bool {
		self.valids.is_some()
	}

	/// Inspect the machine's next opcode and current stack.
	pub fn inspect(&self) -> Option<(Opcode, &Stack)> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return None,
		};
		self.code.get(position).map(|v| (Opcode(*v), &self.stack))
	}

	/// Copy and get the return value of the machine, if any.
	pub fn return_value(&self) -> Vec<u8> {
		let Range { start, end } = self.return_range;
		if end <= start {
			return Vec::new();
		}

		if start > USIZE_MAX || end > USIZE_MAX {
			// Never reachable with a metered memory; keep the length but do
			// not touch memory.
			let len = end - start;
			if len > USIZE_MAX {
				return Vec::new();
			}
			let mut ret = Vec::new();
			ret.resize(len.as_usize(), 0);
			return ret;
		}

		self.memory
			.get(start.as_usize(), (end - start).as_usize())
	}

	/// Enter the subroutine at `location`. The current position becomes
	/// the return address.
	pub fn enter_subroutine(&mut self, location: U256) -> Result<(), ExitError> {
		let position = match self.position {
			Ok(position) => position,
			Err(_) => return Err(ExitError::InvalidJumpSub),
		};
		if location > USIZE_MAX {
			return Err(ExitError::InvalidJumpSub);
		}
		let location = location.as_usize();
		if !self.valids().is_beginsub(location) {
			return Err(ExitError::InvalidJumpSub);
		}
		if self.return_stack.len() >= RETURN_STACK_LIMIT {
			return Err(ExitError::StackOverflow);
		}

		self.return_stack.push(position);
		self.position = Ok(location + 1);
		Ok(())
	}

	/// Return to the position saved by the innermost `enter_subroutine`.
	pub fn return_from_subroutine(&mut self) -> Result<(), ExitError> {
		let position = self.return_stack.pop().ok_or(ExitError::InvalidReturnSub)?;
		self.position = Ok(position);
		Ok(())
	}

	/// Loop stepping the machine, until it stops.
	pub fn run(&mut self) -> Capture<ExitReason, Trap> {
		loop {
			match self.step() {
				Ok(()) => (),
				Err(res) => return res,
			}
		}
	}

	#[inline]
	/// Step the machine, executing one opcode. It then returns.
	pub fn step(&mut self) -> Result<(), Capture<ExitReason, Trap>> {
		let position = match &self.position {
			Ok(position) => *position,
			Err(reason) => return Err(Capture::Exit(reason.clone())),
		};

		match self.code.get(position).map(|v| Opcode(*v)) {
			Some(opcode) => match eval(self, opcode, position) {
				Control::Continue(p) => {
					self.position = Ok(position + p);
					Ok(())
				}
				Control::Exit(e) => {
					self.position = Err(e.clone());
					Err(Capture::Exit(e))
				}
				Control::Jump(p) => {
					self.position = Ok(p);
					Ok(())
				}
				Control::Trap(opcode) => {
					self.position = Ok(position + 1);
					Err(Capture::Trap(opcode))
				}
			},
			None => {
				self.position = Err(ExitSucceed::Stopped.into());
				Err(Capture::Exit(ExitSucceed::Stopped.into()))
			}
		}
	}
}

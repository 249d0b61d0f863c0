//! Interpreter events: one `Step` before every opcode, one `StepResult`
//! after it, and the storage accesses in between.

use crate::{Context, ExitReason, Memory, Opcode, Stack};
use primitive_types::{H160, H256};

environmental::environmental!(listener: dyn EventListener + 'static);

pub trait EventListener {
	fn event(&mut self, event: Event);
}

#[derive(Debug, Copy, Clone)]
pub enum Event<'a> {
	Step {
		context: &'a Context,
		opcode: Opcode,
		position: &'a Result<usize, ExitReason>,
		stack: &'a Stack,
		memory: &'a Memory,
	},
	StepResult {
		result: &'a Result<(), ExitReason>,
		return_value: &'a [u8],
	},
	/// Persistent read.
	SLoad {
		address: H160,
		index: H256,
		value: H256,
	},
	/// Persistent write of `value`.
	SStore {
		address: H160,
		index: H256,
		value: H256,
	},
}

pub(crate) fn with<F: FnOnce(&mut (dyn EventListener + 'static))>(f: F) {
	listener::with(f);
}

/// Run `f` with `new` receiving the interpreter events it triggers.
pub fn using<R, F: FnOnce() -> R>(new: &mut (dyn EventListener + 'static), f: F) -> R {
	listener::using(new, f)
}

//! Message-level events. Listeners observe frames and self-destructs and
//! cannot change their outcome.

use crate::executor::stack::{ExecResult, Message};
use primitive_types::{H160, U256};

environmental::environmental!(listener: dyn EventListener + 'static);

pub trait EventListener {
	fn event(&mut self, event: Event);
}

#[derive(Debug, Copy, Clone)]
pub enum Event<'a> {
	/// A frame is about to run `message`.
	BeforeMessage { message: &'a Message },
	/// A frame finished and its checkpoint was folded.
	AfterMessage { result: &'a ExecResult },
	/// `address` self-destructed in favour of `target`.
	Suicide {
		address: H160,
		target: H160,
		balance: U256,
	},
}

pub(crate) fn with<F: FnOnce(&mut (dyn EventListener + 'static))>(f: F) {
	listener::with(f);
}

/// Run `f` with `new` receiving every message event it triggers.
pub fn using<R, F: FnOnce() -> R>(new: &mut (dyn EventListener + 'static), f: F) -> R {
	listener::using(new, f)
}

//! Gas accounting events, each carrying the meter state before the charge
//! when one is available.

use super::Snapshot;

environmental::environmental!(listener: dyn EventListener + 'static);

pub trait EventListener {
	fn event(&mut self, event: Event);
}

#[derive(Debug, Copy, Clone)]
pub enum Event {
	RecordCost {
		cost: u64,
		snapshot: Option<Snapshot>,
	},
	RecordRefund {
		refund: i64,
		snapshot: Option<Snapshot>,
	},
	/// Stipend credited back to a callee.
	RecordStipend {
		stipend: u64,
		snapshot: Option<Snapshot>,
	},
	/// Combined dynamic charge of one opcode, memory expansion included.
	RecordDynamicCost {
		gas_cost: u64,
		memory_gas: u64,
		gas_refund: i64,
		snapshot: Option<Snapshot>,
	},
}

pub(crate) fn with<F: FnOnce(&mut (dyn EventListener + 'static))>(f: F) {
	listener::with(f);
}

/// Run `f` with `new` receiving the gas events it triggers.
pub fn using<R, F: FnOnce() -> R>(new: &mut (dyn EventListener + 'static), f: F) -> R {
	listener::using(new, f)
}

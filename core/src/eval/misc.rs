use super::Control;
use crate::utils::USIZE_MAX;
use crate::{ExitError, ExitReason, ExitRevert, ExitSucceed, Machine};
use primitive_types::{H256, U256};

fn to_usize(value: U256, error: ExitError) -> Result<usize, ExitError> {
	if value > USIZE_MAX {
		Err(error)
	} else {
		Ok(value.as_usize())
	}
}

#[derive(Clone, Copy)]
enum Source {
	Code,
	Data,
}

/// `CODECOPY` and `CALLDATACOPY`: bytes past the end of the source are
/// written as zero.
fn copy_to_memory(state: &mut Machine, source: Source) -> Control {
	pop_u256!(state, memory_offset, source_offset, len);
	try_or_fail!(state.memory.resize_offset(memory_offset, len));
	if len.is_zero() {
		return Control::Continue(1);
	}

	let bytes = match source {
		Source::Code => &state.code[..],
		Source::Data => &state.data[..],
	};
	try_or_fail!(state
		.memory
		.copy_large(memory_offset, source_offset, len, bytes));
	Control::Continue(1)
}

#[inline]
pub fn codesize(state: &mut Machine) -> Control {
	push_u256!(state, U256::from(state.code.len()));
	Control::Continue(1)
}

#[inline]
pub fn codecopy(state: &mut Machine) -> Control {
	copy_to_memory(state, Source::Code)
}

/// 32 bytes of call data from `index`, zero-extended.
#[inline]
pub fn calldataload(state: &mut Machine) -> Control {
	pop_u256!(state, index);

	let mut word = H256::zero();
	if let Some(tail) = to_usize(index, ExitError::OutOfRange)
		.ok()
		.and_then(|index| state.data.get(index..))
	{
		let n = tail.len().min(32);
		word.as_bytes_mut()[..n].copy_from_slice(&tail[..n]);
	}

	try_or_fail!(state.stack.push_h256(word));
	Control::Continue(1)
}

#[inline]
pub fn calldatasize(state: &mut Machine) -> Control {
	push_u256!(state, U256::from(state.data.len()));
	Control::Continue(1)
}

#[inline]
pub fn calldatacopy(state: &mut Machine) -> Control {
	copy_to_memory(state, Source::Data)
}

#[inline]
pub fn pop(state: &mut Machine) -> Control {
	try_or_fail!(state.stack.pop());
	Control::Continue(1)
}

#[inline]
pub fn mload(state: &mut Machine) -> Control {
	pop_u256!(state, index);
	try_or_fail!(state.memory.resize_offset(index, U256::from(32)));
	let index = try_or_fail!(to_usize(index, ExitError::OutOfRange));
	let word = H256::from_slice(&state.memory.get(index, 32));
	try_or_fail!(state.stack.push_h256(word));
	Control::Continue(1)
}

#[inline]
pub fn mstore(state: &mut Machine) -> Control {
	pop_u256!(state, index);
	pop_h256!(state, word);
	try_or_fail!(state.memory.resize_offset(index, U256::from(32)));
	let index = try_or_fail!(to_usize(index, ExitError::OutOfRange));
	try_or_fail!(state.memory.set(index, word.as_bytes(), Some(32)));
	Control::Continue(1)
}

#[inline]
pub fn mstore8(state: &mut Machine) -> Control {
	pop_u256!(state, index, value);
	try_or_fail!(state.memory.resize_offset(index, U256::one()));
	let index = try_or_fail!(to_usize(index, ExitError::OutOfRange));
	try_or_fail!(state.memory.set(index, &[value.byte(0)], Some(1)));
	Control::Continue(1)
}

fn jump_to(state: &mut Machine, dest: U256) -> Control {
	match to_usize(dest, ExitError::InvalidJump) {
		Ok(dest) if state.valids().is_jumpdest(dest) => Control::Jump(dest),
		_ => Control::Exit(ExitError::InvalidJump.into()),
	}
}

#[inline]
pub fn jump(state: &mut Machine) -> Control {
	pop_u256!(state, dest);
	jump_to(state, dest)
}

#[inline]
pub fn jumpi(state: &mut Machine) -> Control {
	pop_u256!(state, dest, condition);
	if condition.is_zero() {
		Control::Continue(1)
	} else {
		jump_to(state, dest)
	}
}

#[inline]
pub fn pc(state: &mut Machine, position: usize) -> Control {
	push_u256!(state, U256::from(position));
	Control::Continue(1)
}

#[inline]
pub fn msize(state: &mut Machine) -> Control {
	push_u256!(state, state.memory.effective_len());
	Control::Continue(1)
}

/// `PUSHn`. Immediates running past the end of the code read as zero.
#[inline]
pub fn push(state: &mut Machine, n: usize, position: usize) -> Control {
	let mut word = H256::zero();
	let immediates = state
		.code
		.get(position + 1..)
		.map(|rest| &rest[..rest.len().min(n)])
		.unwrap_or_default();
	word.as_bytes_mut()[32 - n..32 - n + immediates.len()].copy_from_slice(immediates);

	try_or_fail!(state.stack.push_h256(word));
	Control::Continue(1 + n)
}

#[inline]
pub fn dup(state: &mut Machine, n: usize) -> Control {
	try_or_fail!(state.stack.dup(n));
	Control::Continue(1)
}

#[inline]
pub fn swap(state: &mut Machine, n: usize) -> Control {
	try_or_fail!(state.stack.swap(n));
	Control::Continue(1)
}

/// Shared tail of `RETURN` and `REVERT`: record the output range and halt.
fn halt_with_output(state: &mut Machine, reason: ExitReason) -> Control {
	pop_u256!(state, start, len);
	try_or_fail!(state.memory.resize_offset(start, len));
	state.return_range = start..start.saturating_add(len);
	Control::Exit(reason)
}

#[inline]
pub fn ret(state: &mut Machine) -> Control {
	halt_with_output(state, ExitSucceed::Returned.into())
}

#[inline]
pub fn revert(state: &mut Machine) -> Control {
	halt_with_output(state, ExitRevert::Reverted.into())
}

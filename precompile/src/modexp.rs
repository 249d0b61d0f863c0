use alloc::{borrow::Cow, vec, vec::Vec};
use core::cmp::max;
use evm_engine::executor::stack::{PrecompileHandle, PrecompileOutput, PrecompileResult};
use evm_engine::{ExitError, ExitSucceed};
use primitive_types::U256;

use crate::PurePrecompile;

/// Pricing parameters of one modexp fork rule.
struct Schedule {
	floor: u64,
	divisor: u64,
	complexity: fn(u64) -> U256,
}

const BYZANTIUM: Schedule = Schedule {
	floor: 0,
	divisor: 20,
	complexity: byzantium_complexity,
};

/// EIP-2565.
const BERLIN: Schedule = Schedule {
	floor: 200,
	divisor: 3,
	complexity: berlin_complexity,
};

fn byzantium_complexity(len: u64) -> U256 {
	let x = U256::from(len);
	match len {
		0..=64 => x * x,
		65..=1_024 => x * x / 4 + x * U256::from(96) - U256::from(3_072),
		_ => x * x / 16 + x * U256::from(480) - U256::from(199_680),
	}
}

fn berlin_complexity(len: u64) -> U256 {
	let words = U256::from(len.div_ceil(8));
	words * words
}

/// Adjusted exponent length: the bit position of the highest set bit in the
/// first 32 exponent bytes, plus eight per byte beyond them.
fn iterations(exp_len: u64, exp_head: &U256) -> u64 {
	let head_bits = (exp_head.bits() as u64).saturating_sub(1);
	let tail = exp_len.saturating_sub(32).saturating_mul(8);
	max(tail.saturating_add(head_bits), 1)
}

impl Schedule {
	fn cost(&self, base_len: u64, exp_len: u64, mod_len: u64, exp_head: &U256) -> u64 {
		let complexity = (self.complexity)(max(base_len, mod_len));
		let gas = complexity.saturating_mul(U256::from(iterations(exp_len, exp_head)))
			/ U256::from(self.divisor);
		if gas > U256::from(u64::MAX) {
			u64::MAX
		} else {
			max(self.floor, gas.as_u64())
		}
	}
}

/// `data` cut or zero-extended to exactly `LEN` bytes. Borrows when no
/// padding is needed.
#[inline]
pub fn right_pad<const LEN: usize>(data: &[u8]) -> Cow<'_, [u8; LEN]> {
	match data.get(..LEN).and_then(|head| <&[u8; LEN]>::try_from(head).ok()) {
		Some(head) => Cow::Borrowed(head),
		None => {
			let mut padded = [0; LEN];
			padded[..data.len()].copy_from_slice(data);
			Cow::Owned(padded)
		}
	}
}

/// `len` bytes of `input` from `offset`, zeros past its end.
fn slice_padded(input: &[u8], offset: usize, len: usize) -> Vec<u8> {
	let mut out = vec![0; len];
	if let Some(available) = input.get(offset..) {
		let n = available.len().min(len);
		out[..n].copy_from_slice(&available[..n]);
	}
	out
}

fn word_at(input: &[u8], offset: usize) -> U256 {
	U256::from_big_endian(&slice_padded(input, offset, 32))
}

/// Input layout: three 32-byte big-endian lengths, then `BASE`, `EXPONENT`
/// and `MODULUS` of those lengths. Missing input bytes read as zero.
fn execute(
	input: &[u8],
	handle: &mut impl PrecompileHandle,
	schedule: &Schedule,
) -> PrecompileResult {
	let base_len = usize::try_from(word_at(input, 0)).map_err(|_| ExitError::OutOfGas)?;
	let mod_len = usize::try_from(word_at(input, 64)).map_err(|_| ExitError::OutOfGas)?;
	// An unrepresentable exponent length prices itself out.
	let exp_len = usize::try_from(word_at(input, 32)).unwrap_or(usize::MAX);

	let body = input.get(96..).unwrap_or_default();
	let head_len = exp_len.min(32);
	let exp_head = U256::from_big_endian(&slice_padded(body, base_len, head_len));

	handle.record_cost(schedule.cost(
		base_len as u64,
		exp_len as u64,
		mod_len as u64,
		&exp_head,
	))?;

	if base_len == 0 && mod_len == 0 {
		return Ok(PrecompileOutput {
			exit_status: ExitSucceed::Returned,
			output: Vec::new(),
		});
	}

	let base = slice_padded(body, 0, base_len);
	let exponent = slice_padded(body, base_len, exp_len);
	let modulus = slice_padded(body, base_len + exp_len, mod_len);

	let result = aurora_engine_modexp::modexp(&base, &exponent, &modulus);
	let mut output = vec![0; mod_len];
	let start = mod_len.saturating_sub(result.len());
	output[start..].copy_from_slice(&result[result.len().saturating_sub(mod_len)..]);

	Ok(PrecompileOutput {
		exit_status: ExitSucceed::Returned,
		output,
	})
}

pub struct ModexpByzantium;

impl PurePrecompile for ModexpByzantium {
	fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
		execute(input, handle, &BYZANTIUM)
	}
}

pub struct ModexpBerlin;

impl PurePrecompile for ModexpBerlin {
	fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
		execute(input, handle, &BERLIN)
	}
}

use crate::consts::G_MEMORY;
use evm_engine_core::ExitError;

/// Total cost of a memory of `words` words: `3·words + words² / 512`.
pub fn memory_gas(words: usize) -> Result<u64, ExitError> {
	let words = words as u128;
	let quadratic = words.checked_mul(words).ok_or(ExitError::OutOfGas)? / 512;
	u64::try_from(words * u128::from(G_MEMORY) + quadratic).map_err(|_| ExitError::OutOfGas)
}

use crate::consts::*;
use evm_engine_core::ExitError;
use evm_engine_runtime::Config;
use primitive_types::{H256, U256};

/// Number of 32 byte words covering `len` bytes, or `None` past `u64`.
fn words(len: U256) -> Option<u64> {
	let wordd = len / U256::from(32);
	let wordr = len % U256::from(32);
	let words = if wordr == U256::zero() {
		wordd
	} else {
		wordd + U256::one()
	};

	if words > U256::from(u64::MAX) {
		None
	} else {
		Some(words.as_u64())
	}
}

/// `base + per_word * words(len)`, failing with out of gas on overflow.
fn linear_cost(len: U256, base: u64, per_word: u64) -> Result<u64, ExitError> {
	words(len)
		.and_then(|words| words.checked_mul(per_word))
		.and_then(|cost| cost.checked_add(base))
		.ok_or(ExitError::OutOfGas)
}

pub fn call_extra_check(gas: U256, after_gas: u64, config: &Config) -> Result<(), ExitError> {
	if config.err_on_call_with_more_gas() && U256::from(after_gas) < gas {
		Err(ExitError::OutOfGas)
	} else {
		Ok(())
	}
}

/// `AUTHCALL` fails instead of capping when asked for more gas than it can
/// forward.
pub fn authcall_extra_check(gas: U256, after_gas: u64) -> Result<(), ExitError> {
	if U256::from(after_gas - after_gas / 64) < gas {
		Err(ExitError::OutOfGas)
	} else {
		Ok(())
	}
}

pub fn suicide_refund(already_removed: bool) -> i64 {
	if already_removed {
		0
	} else {
		R_SUICIDE
	}
}

pub fn sstore_refund(original: H256, current: H256, new: H256, config: &Config) -> i64 {
	if config.sstore_gas_metering() {
		if current == new {
			0
		} else if original == current && new == H256::default() {
			config.refund_sstore_clears()
		} else {
			let mut refund = 0;

			if original != H256::default() {
				if current == H256::default() {
					refund -= config.refund_sstore_clears();
				} else if new == H256::default() {
					refund += config.refund_sstore_clears();
				}
			}

			if original == new {
				if original == H256::default() {
					refund += (config.gas_sstore_set() - config.gas_sload()) as i64;
				} else {
					refund += (config.gas_sstore_reset() - config.gas_sload()) as i64;
				}
			}

			refund
		}
	} else if current != H256::default() && new == H256::default() {
		config.refund_sstore_clears()
	} else {
		0
	}
}

pub fn create_cost(len: U256, config: &Config) -> Result<u64, ExitError> {
	if config.max_initcode_size().is_some() {
		linear_cost(len, G_CREATE, G_INITCODE_WORD)
	} else {
		Ok(G_CREATE)
	}
}

pub fn create2_cost(len: U256, config: &Config) -> Result<u64, ExitError> {
	let per_word = if config.max_initcode_size().is_some() {
		G_SHA3WORD + G_INITCODE_WORD
	} else {
		G_SHA3WORD
	};
	linear_cost(len, G_CREATE, per_word)
}

/// `EXP`: a base price plus a per-byte price for every significant byte of
/// the exponent.
pub fn exp_cost(power: U256, config: &Config) -> Result<u64, ExitError> {
	let bytes = (power.bits() as u64).div_ceil(8);
	config
		.gas_expbyte()
		.checked_mul(bytes)
		.and_then(|gas| gas.checked_add(G_EXP))
		.ok_or(ExitError::OutOfGas)
}

pub fn verylowcopy_cost(len: U256) -> Result<u64, ExitError> {
	linear_cost(len, G_VERYLOW, G_COPY)
}

pub fn extcodecopy_cost(len: U256, is_cold: bool, config: &Config) -> Result<u64, ExitError> {
	let base = address_access_cost(is_cold, config.gas_ext_code(), config);
	linear_cost(len, base, G_COPY)
}

pub fn log_cost(n: u8, len: U256) -> Result<u64, ExitError> {
	let gas = U256::from(G_LOG)
		.checked_add(
			U256::from(G_LOGDATA)
				.checked_mul(len)
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?
		.checked_add(U256::from(G_LOGTOPIC * u64::from(n)))
		.ok_or(ExitError::OutOfGas)?;

	if gas > U256::from(u64::MAX) {
		return Err(ExitError::OutOfGas);
	}

	Ok(gas.as_u64())
}

pub fn sha3_cost(len: U256) -> Result<u64, ExitError> {
	linear_cost(len, G_SHA3, G_SHA3WORD)
}

pub fn sload_cost(is_cold: bool, config: &Config) -> u64 {
	if config.increase_state_access_gas() {
		if is_cold {
			config.gas_sload_cold()
		} else {
			config.gas_storage_read_warm()
		}
	} else {
		config.gas_sload()
	}
}

/// Cost of `SSTORE`. `gas` is what the frame has left before paying for it.
pub fn sstore_cost(
	original: H256,
	current: H256,
	new: H256,
	gas: u64,
	is_cold: bool,
	config: &Config,
) -> Result<u64, ExitError> {
	let gas_cost = if config.sstore_gas_metering() {
		if config.sstore_revert_under_stipend() && gas <= config.call_stipend {
			return Err(ExitError::OutOfGas);
		}

		if new == current {
			config.gas_sload()
		} else if original == current {
			if original == H256::zero() {
				config.gas_sstore_set()
			} else {
				config.gas_sstore_reset()
			}
		} else {
			config.gas_sload()
		}
	} else if current == H256::zero() && new != H256::zero() {
		config.gas_sstore_set()
	} else {
		config.gas_sstore_reset()
	};

	Ok(if config.increase_state_access_gas() && is_cold {
		gas_cost + config.gas_sload_cold()
	} else {
		gas_cost
	})
}

pub fn suicide_cost(value: U256, is_cold: bool, target_exists: bool, config: &Config) -> u64 {
	let eip161 = !config.empty_considered_exists();
	let should_charge_topup = if eip161 {
		value != U256::zero() && !target_exists
	} else {
		!target_exists
	};

	let suicide_gas_topup = if should_charge_topup {
		config.gas_suicide_new_account()
	} else {
		0
	};

	let mut gas = config.gas_suicide() + suicide_gas_topup;
	if config.increase_state_access_gas() && is_cold {
		gas += config.gas_account_access_cold();
	}
	gas
}

pub fn call_cost(
	value: U256,
	is_cold: bool,
	is_call_or_callcode: bool,
	is_call_or_staticcall: bool,
	new_account: bool,
	config: &Config,
) -> u64 {
	let transfers_value = value != U256::default();
	address_access_cost(is_cold, config.gas_call(), config)
		+ xfer_cost(is_call_or_callcode, transfers_value)
		+ new_cost(is_call_or_staticcall, new_account, transfers_value, config)
}

pub fn auth_cost(is_cold: bool, config: &Config) -> u64 {
	let access = if is_cold {
		config.gas_account_access_cold()
	} else {
		config.gas_storage_read_warm()
	};
	config.gas_auth_base() + access
}

pub fn authcall_cost(value: U256, is_cold: bool, target_exists: bool, config: &Config) -> u64 {
	let mut gas = if is_cold {
		config.gas_account_access_cold()
	} else {
		config.gas_storage_read_warm()
	};
	if value != U256::zero() {
		gas += G_AUTHCALL_VALUE;
		if !target_exists {
			gas += G_NEWACCOUNT;
		}
	}
	gas
}

pub fn address_access_cost(is_cold: bool, regular_value: u64, config: &Config) -> u64 {
	if config.increase_state_access_gas() {
		if is_cold {
			config.gas_account_access_cold()
		} else {
			config.gas_storage_read_warm()
		}
	} else {
		regular_value
	}
}

fn xfer_cost(is_call_or_callcode: bool, transfers_value: bool) -> u64 {
	if is_call_or_callcode && transfers_value {
		G_CALLVALUE
	} else {
		0
	}
}

fn new_cost(
	is_call_or_staticcall: bool,
	new_account: bool,
	transfers_value: bool,
	config: &Config,
) -> u64 {
	let eip161 = !config.empty_considered_exists();
	if is_call_or_staticcall {
		if eip161 {
			if transfers_value && new_account {
				G_NEWACCOUNT
			} else {
				0
			}
		} else if new_account {
			G_NEWACCOUNT
		} else {
			0
		}
	} else {
		0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn word(v: u64) -> H256 {
		H256::from_low_u64_be(v)
	}

	#[test]
	fn net_metering_restore_is_a_noop() {
		let config = Config::istanbul();
		let (zero, one) = (word(0), word(1));

		// 1 -> 0 charges the reset and grants the clear refund.
		assert_eq!(sstore_cost(one, one, zero, 100_000, false, &config), Ok(5000));
		assert_eq!(sstore_refund(one, one, zero, &config), 15000);

		// 0 -> 1 with the slot back at its original value undoes the refund
		// and returns the reset cost minus a read.
		assert_eq!(sstore_cost(one, zero, one, 100_000, false, &config), Ok(800));
		assert_eq!(sstore_refund(one, zero, one, &config), -15000 + 4200);

		// Net the two writes cost what a no-op write would.
		let total_cost = 5000 + 800;
		let total_refund = 15000 - 15000 + 4200;
		assert_eq!(total_cost - total_refund, 800 + 800);
	}

	#[test]
	fn legacy_metering_sums_writes() {
		let config = Config::petersburg();
		let (zero, one) = (word(0), word(1));
		assert_eq!(sstore_cost(one, one, zero, 100_000, false, &config), Ok(5000));
		assert_eq!(sstore_cost(one, zero, one, 100_000, false, &config), Ok(20000));
		assert_eq!(sstore_refund(one, zero, one, &config), 0);
	}

	#[test]
	fn sstore_needs_more_than_the_stipend() {
		let config = Config::istanbul();
		assert_eq!(
			sstore_cost(word(0), word(0), word(1), 2300, false, &config),
			Err(ExitError::OutOfGas)
		);
		assert_eq!(
			sstore_cost(word(0), word(0), word(1), 2301, false, &config),
			Ok(20000)
		);
	}

	#[test]
	fn cold_access_surcharges() {
		let config = Config::berlin();
		assert_eq!(sload_cost(true, &config), 2100);
		assert_eq!(sload_cost(false, &config), 100);
		assert_eq!(
			sstore_cost(word(1), word(1), word(2), 100_000, true, &config),
			Ok(2900 + 2100)
		);
		assert_eq!(
			call_cost(U256::zero(), true, true, true, false, &config),
			2600
		);
		assert_eq!(
			call_cost(U256::one(), false, true, true, true, &config),
			100 + 9000 + 25000
		);
		assert_eq!(sload_cost(true, &Config::istanbul()), 800);
	}

	#[test]
	fn pre_spurious_new_account_is_charged_without_value() {
		let config = Config::tangerine_whistle();
		assert_eq!(
			call_cost(U256::zero(), false, true, true, true, &config),
			700 + 25000
		);
		let config = Config::spurious_dragon();
		assert_eq!(call_cost(U256::zero(), false, true, true, true, &config), 700);
	}

	#[test]
	fn exp_counts_exponent_bytes() {
		assert_eq!(exp_cost(U256::zero(), &Config::frontier()), Ok(10));
		assert_eq!(exp_cost(U256::from(0xff), &Config::frontier()), Ok(20));
		assert_eq!(exp_cost(U256::from(0x100), &Config::spurious_dragon()), Ok(110));
	}

	#[test]
	fn copy_and_hash_round_up_to_words() {
		assert_eq!(verylowcopy_cost(U256::zero()), Ok(3));
		assert_eq!(verylowcopy_cost(U256::from(33)), Ok(9));
		assert_eq!(sha3_cost(U256::from(32)), Ok(36));
		assert_eq!(verylowcopy_cost(U256::MAX), Err(ExitError::OutOfGas));
		assert_eq!(log_cost(2, U256::from(10)), Ok(375 + 80 + 750));
	}

	#[test]
	fn init_code_words_are_charged_from_shanghai() {
		assert_eq!(create_cost(U256::from(64), &Config::london()), Ok(32000));
		assert_eq!(create_cost(U256::from(64), &Config::shanghai()), Ok(32004));
		assert_eq!(create2_cost(U256::from(64), &Config::london()), Ok(32012));
		assert_eq!(create2_cost(U256::from(64), &Config::shanghai()), Ok(32016));
	}

	#[test]
	fn suicide_refund_is_granted_once() {
		assert_eq!(suicide_refund(false), 24000);
		assert_eq!(suicide_refund(true), 0);
	}

	#[test]
	fn authcall_surcharges() {
		let config = Config::shanghai();
		assert_eq!(authcall_cost(U256::zero(), false, false, &config), 100);
		assert_eq!(authcall_cost(U256::one(), true, true, &config), 2600 + 6700);
		assert_eq!(
			authcall_cost(U256::one(), false, false, &config),
			100 + 6700 + 25000
		);
		assert_eq!(auth_cost(true, &config), 5700);
		assert_eq!(authcall_extra_check(U256::from(64), 64), Err(ExitError::OutOfGas));
		assert_eq!(authcall_extra_check(U256::from(63), 64), Ok(()));
	}
}

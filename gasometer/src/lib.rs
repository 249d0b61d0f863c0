//! EVM gasometer.

#![forbid(unsafe_code)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "tracing")]
pub mod tracing;

#[cfg(feature = "tracing")]
macro_rules! event {
	($x:expr) => {
		use crate::tracing::Event::*;
		crate::tracing::with(|listener| listener.event($x));
	};
}

#[cfg(feature = "force-debug")]
macro_rules! log_gas {
	($self:expr, $($arg:tt)*) => (
		log::trace!(target: "evm", "Gasometer {} [Gas used: {}, Gas left: {}]", format_args!($($arg)*),
		$self.total_used_gas(), $self.gas());
	);
}

#[cfg(not(feature = "force-debug"))]
macro_rules! log_gas {
	($self:expr, $($arg:tt)*) => {};
}

#[cfg(not(feature = "tracing"))]
macro_rules! event {
	($x:expr) => {};
}

mod consts;
mod costs;
mod memory;

use core::cmp::max;
use evm_engine_core::{ExitError, Opcode, Stack};
use evm_engine_runtime::{Config, Handler, OpcodeCost};
use primitive_types::{H160, H256, U256};

macro_rules! try_or_fail {
	( $inner:expr, $e:expr ) => {
		match $e {
			Ok(value) => value,
			Err(e) => {
				$inner = Err(e.clone());
				return Err(e);
			}
		}
	};
}

#[cfg(feature = "tracing")]
#[derive(Debug, Copy, Clone)]
pub struct Snapshot {
	pub gas_limit: u64,
	pub memory_gas: u64,
	pub used_gas: u64,
	pub refunded_gas: i64,
}

#[cfg(feature = "tracing")]
impl Snapshot {
	/// Gas left at the time of the snapshot.
	pub fn gas(&self) -> u64 {
		self.gas_limit - self.used_gas - self.memory_gas
	}
}

/// EVM gasometer. The meter of one frame.
#[derive(Clone, Debug)]
pub struct Gasometer<'config> {
	gas_limit: u64,
	config: &'config Config,
	inner: Result<Inner<'config>, ExitError>,
}

impl<'config> Gasometer<'config> {
	/// Create a new gasometer with given gas limit and config.
	pub fn new(gas_limit: u64, config: &'config Config) -> Self {
		Self {
			gas_limit,
			config,
			inner: Ok(Inner {
				memory_gas: 0,
				used_gas: 0,
				refunded_gas: 0,
				config,
			}),
		}
	}

	#[inline]
	/// Returns the numerical gas cost value.
	pub fn gas_cost(&self, cost: GasCost, gas: u64) -> Result<u64, ExitError> {
		match self.inner.as_ref() {
			Ok(inner) => inner.gas_cost(cost, gas),
			Err(e) => Err(e.clone()),
		}
	}

	#[inline]
	fn inner_mut(&mut self) -> Result<&mut Inner<'config>, ExitError> {
		self.inner.as_mut().map_err(|e| e.clone())
	}

	#[inline]
	/// Reference of the config.
	pub fn config(&self) -> &'config Config {
		self.config
	}

	#[inline]
	/// Gas limit of the frame.
	pub fn gas_limit(&self) -> u64 {
		self.gas_limit
	}

	#[inline]
	/// Remaining gas. Zero once the gasometer has failed.
	pub fn gas(&self) -> u64 {
		match self.inner.as_ref() {
			Ok(inner) => self.gas_limit - inner.used_gas - inner.memory_gas,
			Err(_) => 0,
		}
	}

	#[inline]
	/// Total used gas. The whole limit once the gasometer has failed.
	pub fn total_used_gas(&self) -> u64 {
		match self.inner.as_ref() {
			Ok(inner) => inner.used_gas + inner.memory_gas,
			Err(_) => self.gas_limit,
		}
	}

	#[inline]
	/// Refunded gas.
	pub fn refunded_gas(&self) -> i64 {
		match self.inner.as_ref() {
			Ok(inner) => inner.refunded_gas,
			Err(_) => 0,
		}
	}

	/// Explicitly fail the gasometer with out of gas. Return `OutOfGas` error.
	pub fn fail(&mut self) -> ExitError {
		self.inner = Err(ExitError::OutOfGas);
		ExitError::OutOfGas
	}

	#[inline]
	/// Record an explicit cost.
	pub fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		event!(RecordCost {
			cost,
			snapshot: self.snapshot(),
		});

		let all_gas_cost = self.total_used_gas().checked_add(cost);
		match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => {
				self.inner_mut()?.used_gas += cost;
				log_gas!(self, "Record cost {}", cost);
				Ok(())
			}
			_ => {
				self.inner = Err(ExitError::OutOfGas);
				Err(ExitError::OutOfGas)
			}
		}
	}

	#[inline]
	/// Record an explicit refund.
	pub fn record_refund(&mut self, refund: i64) -> Result<(), ExitError> {
		event!(RecordRefund {
			refund,
			snapshot: self.snapshot(),
		});
		log_gas!(self, "Record refund -{}", refund);

		self.inner_mut()?.refunded_gas += refund;
		Ok(())
	}

	#[inline]
	/// Record the per byte cost of the code a create deposits.
	pub fn record_deposit(&mut self, len: usize) -> Result<(), ExitError> {
		let cost = (len as u64)
			.checked_mul(self.config.gas_code_deposit())
			.ok_or(ExitError::OutOfGas)?;
		self.record_cost(cost)
	}

	/// Record opcode gas cost.
	pub fn record_dynamic_cost(
		&mut self,
		cost: GasCost,
		memory: Option<MemoryCost>,
	) -> Result<(), ExitError> {
		let gas = self.gas();

		let memory_gas = match memory {
			Some(memory) => try_or_fail!(self.inner, self.inner_mut()?.memory_gas(memory)),
			None => self.inner_mut()?.memory_gas,
		};
		let gas_cost = try_or_fail!(self.inner, self.inner_mut()?.gas_cost(cost, gas));
		let gas_refund = self.inner_mut()?.gas_refund(cost);
		let used_gas = self.inner_mut()?.used_gas;

		event!(RecordDynamicCost {
			gas_cost,
			memory_gas,
			gas_refund,
			snapshot: self.snapshot(),
		});

		let all_gas_cost = memory_gas
			.checked_add(used_gas)
			.and_then(|gas| gas.checked_add(gas_cost));
		let all_gas_cost = match all_gas_cost {
			Some(all_gas_cost) if all_gas_cost <= self.gas_limit => all_gas_cost,
			_ => {
				self.inner = Err(ExitError::OutOfGas);
				return Err(ExitError::OutOfGas);
			}
		};

		let after_gas = self.gas_limit - all_gas_cost;
		try_or_fail!(self.inner, self.inner_mut()?.extra_check(cost, after_gas));

		self.inner_mut()?.used_gas += gas_cost;
		self.inner_mut()?.memory_gas = memory_gas;
		self.inner_mut()?.refunded_gas += gas_refund;

		log_gas!(
			self,
			"Record dynamic cost {} - memory_gas {} - gas_refund {}",
			gas_cost,
			memory_gas,
			gas_refund
		);

		Ok(())
	}

	#[inline]
	/// Record an explicit stipend, gas that is given back to the frame.
	pub fn record_stipend(&mut self, stipend: u64) -> Result<(), ExitError> {
		event!(RecordStipend {
			stipend,
			snapshot: self.snapshot(),
		});

		let inner = self.inner_mut()?;
		inner.used_gas = inner.used_gas.saturating_sub(stipend);
		log_gas!(self, "Record stipend {}", stipend);
		Ok(())
	}

	#[cfg(feature = "tracing")]
	pub fn snapshot(&self) -> Option<Snapshot> {
		self.inner.as_ref().ok().map(|inner| Snapshot {
			gas_limit: self.gas_limit,
			memory_gas: inner.memory_gas,
			used_gas: inner.used_gas,
			refunded_gas: inner.refunded_gas,
		})
	}
}

/// Cost class of an opcode under the config, or `InvalidOpcode` when it is
/// not available.
pub fn static_opcode_cost(opcode: Opcode, config: &Config) -> Result<OpcodeCost, ExitError> {
	config
		.opcode_cost(opcode)
		.ok_or(ExitError::InvalidOpcode(opcode))
}

fn peek_address(stack: &Stack, no_from_top: usize) -> Result<H160, ExitError> {
	Ok(stack.peek_h256(no_from_top)?.into())
}

fn static_guard(is_static: bool) -> Result<(), ExitError> {
	if is_static {
		Err(ExitError::StaticStateChange)
	} else {
		Ok(())
	}
}

fn initcode_guard(len: U256, config: &Config) -> Result<(), ExitError> {
	match config.max_initcode_size() {
		Some(limit) if len > U256::from(limit) => Err(ExitError::InitcodeSizeViolation),
		_ => Ok(()),
	}
}

/// Calculate the opcode cost of a dynamically priced opcode. The stack is
/// only peeked.
#[allow(clippy::nonminimal_bool)]
pub fn dynamic_opcode_cost<H: Handler>(
	address: H160,
	opcode: Opcode,
	stack: &Stack,
	is_static: bool,
	config: &Config,
	handler: &H,
) -> Result<(GasCost, StorageTarget, Option<MemoryCost>), ExitError> {
	let mut storage_target = StorageTarget::None;
	let gas_cost = match opcode {
		Opcode::RETURN | Opcode::REVERT => GasCost::Zero,

		Opcode::MLOAD | Opcode::MSTORE | Opcode::MSTORE8 => GasCost::VeryLow,

		Opcode::EXTCODESIZE => {
			let target = peek_address(stack, 0)?;
			storage_target = StorageTarget::Address(target);
			GasCost::ExtCodeSize {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::BALANCE => {
			let target = peek_address(stack, 0)?;
			storage_target = StorageTarget::Address(target);
			GasCost::Balance {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::EXTCODEHASH => {
			let target = peek_address(stack, 0)?;
			storage_target = StorageTarget::Address(target);
			GasCost::ExtCodeHash {
				target_is_cold: handler.is_cold(target, None),
			}
		}
		Opcode::EXTCODECOPY => {
			let target = peek_address(stack, 0)?;
			storage_target = StorageTarget::Address(target);
			GasCost::ExtCodeCopy {
				target_is_cold: handler.is_cold(target, None),
				len: stack.peek(3)?,
			}
		}

		Opcode::CALLCODE => {
			let target = peek_address(stack, 1)?;
			storage_target = StorageTarget::Address(target);
			GasCost::CallCode {
				value: stack.peek(2)?,
				gas: stack.peek(0)?,
				target_is_cold: handler.is_cold(target, None),
				target_exists: handler.exists(target),
			}
		}
		Opcode::STATICCALL => {
			let target = peek_address(stack, 1)?;
			storage_target = StorageTarget::Address(target);
			GasCost::StaticCall {
				gas: stack.peek(0)?,
				target_is_cold: handler.is_cold(target, None),
				target_exists: handler.exists(target),
			}
		}
		Opcode::DELEGATECALL => {
			let target = peek_address(stack, 1)?;
			storage_target = StorageTarget::Address(target);
			GasCost::DelegateCall {
				gas: stack.peek(0)?,
				target_is_cold: handler.is_cold(target, None),
				target_exists: handler.exists(target),
			}
		}
		Opcode::CALL => {
			let value = stack.peek(2)?;
			if value != U256::zero() {
				static_guard(is_static)?;
			}
			let target = peek_address(stack, 1)?;
			storage_target = StorageTarget::Address(target);
			GasCost::Call {
				value,
				gas: stack.peek(0)?,
				target_is_cold: handler.is_cold(target, None),
				target_exists: handler.exists(target),
			}
		}
		Opcode::AUTHCALL => {
			let value = stack.peek(2)?;
			if value != U256::zero() {
				static_guard(is_static)?;
			}
			let target = peek_address(stack, 1)?;
			storage_target = StorageTarget::Address(target);
			GasCost::AuthCall {
				value,
				gas: stack.peek(0)?,
				target_is_cold: handler.is_cold(target, None),
				target_exists: handler.exists(target),
			}
		}
		Opcode::AUTH => {
			let target = peek_address(stack, 0)?;
			storage_target = StorageTarget::Address(target);
			GasCost::Auth {
				target_is_cold: handler.is_cold(target, None),
			}
		}

		Opcode::SHA3 => GasCost::Sha3 {
			len: stack.peek(1)?,
		},
		Opcode::CALLDATACOPY | Opcode::CODECOPY | Opcode::RETURNDATACOPY => GasCost::VeryLowCopy {
			len: stack.peek(2)?,
		},
		Opcode::MCOPY => GasCost::VeryLowCopy {
			len: stack.peek(2)?,
		},
		Opcode::EXP => GasCost::Exp {
			power: stack.peek(1)?,
		},

		Opcode::SLOAD => {
			let index = stack.peek_h256(0)?;
			storage_target = StorageTarget::Slot(address, index);
			GasCost::SLoad {
				target_is_cold: handler.is_cold(address, Some(index)),
			}
		}
		Opcode::SSTORE => {
			static_guard(is_static)?;
			let index = stack.peek_h256(0)?;
			let value = stack.peek_h256(1)?;
			storage_target = StorageTarget::Slot(address, index);

			GasCost::SStore {
				original: handler.original_storage(address, index),
				current: handler.storage(address, index),
				new: value,
				target_is_cold: handler.is_cold(address, Some(index)),
			}
		}
		Opcode::TSTORE => {
			static_guard(is_static)?;
			GasCost::TStore
		}
		Opcode::LOG0 | Opcode::LOG1 | Opcode::LOG2 | Opcode::LOG3 | Opcode::LOG4 => {
			static_guard(is_static)?;
			GasCost::Log {
				n: opcode.as_u8() - Opcode::LOG0.as_u8(),
				len: stack.peek(1)?,
			}
		}
		Opcode::CREATE => {
			static_guard(is_static)?;
			let len = stack.peek(2)?;
			initcode_guard(len, config)?;
			GasCost::Create { len }
		}
		Opcode::CREATE2 => {
			static_guard(is_static)?;
			let len = stack.peek(2)?;
			initcode_guard(len, config)?;
			GasCost::Create2 { len }
		}
		Opcode::SUICIDE => {
			static_guard(is_static)?;
			let target = peek_address(stack, 0)?;
			storage_target = StorageTarget::Address(target);
			GasCost::Suicide {
				value: handler.balance(address),
				target_is_cold: handler.is_cold(target, None),
				target_exists: handler.exists(target),
				already_removed: handler.deleted(address),
			}
		}

		_ => return Err(ExitError::InvalidOpcode(opcode)),
	};

	let memory_cost = match opcode {
		Opcode::SHA3
		| Opcode::RETURN
		| Opcode::REVERT
		| Opcode::LOG0
		| Opcode::LOG1
		| Opcode::LOG2
		| Opcode::LOG3
		| Opcode::LOG4 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(1)?,
		}),

		Opcode::CODECOPY | Opcode::CALLDATACOPY | Opcode::RETURNDATACOPY => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: stack.peek(2)?,
		}),

		Opcode::MCOPY => {
			let len = stack.peek(2)?;
			Some(
				MemoryCost {
					offset: stack.peek(0)?,
					len,
				}
				.join(MemoryCost {
					offset: stack.peek(1)?,
					len,
				}),
			)
		}

		Opcode::EXTCODECOPY => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(3)?,
		}),

		Opcode::MLOAD | Opcode::MSTORE => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(32),
		}),

		Opcode::MSTORE8 => Some(MemoryCost {
			offset: stack.peek(0)?,
			len: U256::from(1),
		}),

		Opcode::CREATE | Opcode::CREATE2 => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(2)?,
		}),

		Opcode::AUTH => Some(MemoryCost {
			offset: stack.peek(1)?,
			len: stack.peek(2)?,
		}),

		Opcode::CALL | Opcode::CALLCODE | Opcode::AUTHCALL => Some(
			MemoryCost {
				offset: stack.peek(3)?,
				len: stack.peek(4)?,
			}
			.join(MemoryCost {
				offset: stack.peek(5)?,
				len: stack.peek(6)?,
			}),
		),

		Opcode::DELEGATECALL | Opcode::STATICCALL => Some(
			MemoryCost {
				offset: stack.peek(2)?,
				len: stack.peek(3)?,
			}
			.join(MemoryCost {
				offset: stack.peek(4)?,
				len: stack.peek(5)?,
			}),
		),

		_ => None,
	};

	Ok((gas_cost, storage_target, memory_cost))
}

/// Holds the gas consumption for a Gasometer instance.
#[derive(Clone, Debug)]
struct Inner<'config> {
	memory_gas: u64,
	used_gas: u64,
	refunded_gas: i64,
	config: &'config Config,
}

impl<'config> Inner<'config> {
	fn memory_gas(&self, memory: MemoryCost) -> Result<u64, ExitError> {
		let from = memory.offset;
		let len = memory.len;

		if len == U256::zero() {
			return Ok(self.memory_gas);
		}

		let end = from.checked_add(len).ok_or(ExitError::OutOfGas)?;

		if end > U256::from(usize::MAX) {
			return Err(ExitError::OutOfGas);
		}
		let end = end.as_usize();

		let rem = end % 32;
		let new = if rem == 0 { end / 32 } else { end / 32 + 1 };

		Ok(max(self.memory_gas, memory::memory_gas(new)?))
	}

	fn extra_check(&self, cost: GasCost, after_gas: u64) -> Result<(), ExitError> {
		match cost {
			GasCost::Call { gas, .. }
			| GasCost::CallCode { gas, .. }
			| GasCost::DelegateCall { gas, .. }
			| GasCost::StaticCall { gas, .. } => costs::call_extra_check(gas, after_gas, self.config),
			GasCost::AuthCall { gas, .. } => costs::authcall_extra_check(gas, after_gas),
			_ => Ok(()),
		}
	}

	/// Returns the gas cost numerical value.
	fn gas_cost(&self, cost: GasCost, gas: u64) -> Result<u64, ExitError> {
		Ok(match cost {
			GasCost::Call {
				value,
				target_is_cold,
				target_exists,
				..
			} => costs::call_cost(
				value,
				target_is_cold,
				true,
				true,
				!target_exists,
				self.config,
			),
			GasCost::CallCode {
				value,
				target_is_cold,
				target_exists,
				..
			} => costs::call_cost(
				value,
				target_is_cold,
				true,
				false,
				!target_exists,
				self.config,
			),
			GasCost::DelegateCall {
				target_is_cold,
				target_exists,
				..
			} => costs::call_cost(
				U256::zero(),
				target_is_cold,
				false,
				false,
				!target_exists,
				self.config,
			),
			GasCost::StaticCall {
				target_is_cold,
				target_exists,
				..
			} => costs::call_cost(
				U256::zero(),
				target_is_cold,
				false,
				true,
				!target_exists,
				self.config,
			),
			GasCost::AuthCall {
				value,
				target_is_cold,
				target_exists,
				..
			} => costs::authcall_cost(value, target_is_cold, target_exists, self.config),
			GasCost::Auth { target_is_cold } => costs::auth_cost(target_is_cold, self.config),

			GasCost::Suicide {
				value,
				target_is_cold,
				target_exists,
				..
			} => costs::suicide_cost(value, target_is_cold, target_exists, self.config),
			GasCost::SStore {
				original,
				current,
				new,
				target_is_cold,
			} => costs::sstore_cost(original, current, new, gas, target_is_cold, self.config)?,
			GasCost::TStore => consts::G_WARM_TSTORE,

			GasCost::Sha3 { len } => costs::sha3_cost(len)?,
			GasCost::Log { n, len } => costs::log_cost(n, len)?,
			GasCost::VeryLowCopy { len } => costs::verylowcopy_cost(len)?,
			GasCost::Exp { power } => costs::exp_cost(power, self.config)?,
			GasCost::Create { len } => costs::create_cost(len, self.config)?,
			GasCost::Create2 { len } => costs::create2_cost(len, self.config)?,
			GasCost::SLoad { target_is_cold } => costs::sload_cost(target_is_cold, self.config),

			GasCost::Zero => consts::G_ZERO,
			GasCost::VeryLow => consts::G_VERYLOW,

			GasCost::ExtCodeSize { target_is_cold } => {
				costs::address_access_cost(target_is_cold, self.config.gas_ext_code(), self.config)
			}
			GasCost::ExtCodeCopy {
				target_is_cold,
				len,
			} => costs::extcodecopy_cost(len, target_is_cold, self.config)?,
			GasCost::Balance { target_is_cold } => {
				costs::address_access_cost(target_is_cold, self.config.gas_balance(), self.config)
			}
			GasCost::ExtCodeHash { target_is_cold } => costs::address_access_cost(
				target_is_cold,
				self.config.gas_ext_code_hash(),
				self.config,
			),
		})
	}

	fn gas_refund(&self, cost: GasCost) -> i64 {
		match cost {
			GasCost::SStore {
				original,
				current,
				new,
				..
			} => costs::sstore_refund(original, current, new, self.config),
			GasCost::Suicide {
				already_removed, ..
			} if !self.config.is_activated_eip(3529) => costs::suicide_refund(already_removed),
			_ => 0,
		}
	}
}

/// Gas cost.
#[derive(Debug, Clone, Copy)]
pub enum GasCost {
	/// Zero gas cost.
	Zero,
	/// Very low gas cost.
	VeryLow,

	/// Gas cost for `EXTCODESIZE`.
	ExtCodeSize {
		/// True if address has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `BALANCE`.
	Balance {
		/// True if address has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `EXTCODEHASH`.
	ExtCodeHash {
		/// True if address has not been previously accessed in this transaction
		target_is_cold: bool,
	},

	/// Gas cost for `CALL`.
	Call {
		/// Call value.
		value: U256,
		/// Call gas.
		gas: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `CALLCODE.
	CallCode {
		/// Call value.
		value: U256,
		/// Call gas.
		gas: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `DELEGATECALL`.
	DelegateCall {
		/// Call gas.
		gas: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `STATICCALL`.
	StaticCall {
		/// Call gas.
		gas: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `AUTHCALL`.
	AuthCall {
		/// Call value, paid by the invoker.
		value: U256,
		/// Call gas. Zero asks for everything that can be forwarded.
		gas: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target exists.
		target_exists: bool,
	},
	/// Gas cost for `AUTH`.
	Auth {
		/// True if the authority has not been previously accessed in this
		/// transaction
		target_is_cold: bool,
	},
	/// Gas cost for `SUICIDE`.
	Suicide {
		/// Value.
		value: U256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Whether the target exists.
		target_exists: bool,
		/// Whether the target has already been removed.
		already_removed: bool,
	},
	/// Gas cost for `SSTORE`.
	SStore {
		/// Original value.
		original: H256,
		/// Current value.
		current: H256,
		/// New value.
		new: H256,
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
	},
	/// Gas cost for `TSTORE`.
	TStore,
	/// Gas cost for `SHA3`.
	Sha3 {
		/// Length of the data.
		len: U256,
	},
	/// Gas cost for `LOG`.
	Log {
		/// Topic length.
		n: u8,
		/// Data length.
		len: U256,
	},
	/// Gas cost for `EXTCODECOPY`.
	ExtCodeCopy {
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
		/// Length.
		len: U256,
	},
	/// Gas cost for some copy opcodes that is documented as `VERYLOW`.
	VeryLowCopy {
		/// Length.
		len: U256,
	},
	/// Gas cost for `EXP`.
	Exp {
		/// Power of `EXP`.
		power: U256,
	},
	/// Gas cost for `CREATE`.
	Create {
		/// Length of the init code.
		len: U256,
	},
	/// Gas cost for `CREATE2`.
	Create2 {
		/// Length.
		len: U256,
	},
	/// Gas cost for `SLOAD`.
	SLoad {
		/// True if target has not been previously accessed in this transaction
		target_is_cold: bool,
	},
}

/// Storage opcode will access. Used for tracking accessed storage (EIP-2929).
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum StorageTarget {
	/// No storage access
	None,
	/// Accessing address
	Address(H160),
	/// Accessing storage
	Slot(H160, H256),
}

/// Memory cost.
#[derive(Debug, Clone, Copy)]
pub struct MemoryCost {
	/// Affected memory offset.
	pub offset: U256,
	/// Affected length.
	pub len: U256,
}

impl MemoryCost {
	/// Join two memory cost together.
	pub fn join(self, other: MemoryCost) -> MemoryCost {
		if self.len == U256::zero() {
			return other;
		}

		if other.len == U256::zero() {
			return self;
		}

		let self_end = self.offset.saturating_add(self.len);
		let other_end = other.offset.saturating_add(other.len);

		if self_end >= other_end {
			self
		} else {
			other
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn out_of_gas_consumes_everything() {
		let config = Config::london();
		let mut gasometer = Gasometer::new(100, &config);
		gasometer.record_cost(60).unwrap();
		assert_eq!(gasometer.gas(), 40);
		assert_eq!(gasometer.record_cost(41), Err(ExitError::OutOfGas));
		assert_eq!(gasometer.gas(), 0);
		assert_eq!(gasometer.total_used_gas(), 100);
		assert_eq!(gasometer.record_cost(0), Err(ExitError::OutOfGas));
	}

	#[test]
	fn memory_is_charged_for_the_high_water_mark() {
		let config = Config::london();
		let mut gasometer = Gasometer::new(1_000, &config);
		let mstore = |offset: u64| MemoryCost {
			offset: U256::from(offset),
			len: U256::from(32),
		};
		gasometer
			.record_dynamic_cost(GasCost::VeryLow, Some(mstore(32)))
			.unwrap();
		assert_eq!(gasometer.total_used_gas(), 3 + 6);
		gasometer
			.record_dynamic_cost(GasCost::VeryLow, Some(mstore(0)))
			.unwrap();
		assert_eq!(gasometer.total_used_gas(), 3 + 3 + 6);
	}

	#[test]
	fn huge_memory_offsets_run_out_of_gas() {
		let config = Config::london();
		let mut gasometer = Gasometer::new(1_000_000, &config);
		let memory = MemoryCost {
			offset: U256::MAX,
			len: U256::one(),
		};
		assert_eq!(
			gasometer.record_dynamic_cost(GasCost::VeryLow, Some(memory)),
			Err(ExitError::OutOfGas)
		);
		assert_eq!(gasometer.total_used_gas(), 1_000_000);
	}

	#[test]
	fn stipend_and_refund() {
		let config = Config::london();
		let mut gasometer = Gasometer::new(10_000, &config);
		gasometer.record_cost(5_000).unwrap();
		gasometer.record_stipend(2_000).unwrap();
		assert_eq!(gasometer.gas(), 7_000);
		gasometer.record_refund(4_800).unwrap();
		gasometer.record_refund(-800).unwrap();
		assert_eq!(gasometer.refunded_gas(), 4_000);
	}

	#[test]
	fn deposit_is_per_byte() {
		let config = Config::london();
		let mut gasometer = Gasometer::new(10_000, &config);
		gasometer.record_deposit(10).unwrap();
		assert_eq!(gasometer.total_used_gas(), 2_000);
		assert_eq!(gasometer.record_deposit(100), Err(ExitError::OutOfGas));
	}

	#[test]
	fn unavailable_opcodes_are_invalid() {
		assert_eq!(
			static_opcode_cost(Opcode::PUSH0, &Config::london()),
			Err(ExitError::InvalidOpcode(Opcode::PUSH0))
		);
		assert_eq!(
			static_opcode_cost(Opcode::PUSH0, &Config::shanghai()),
			Ok(OpcodeCost::Fixed(2))
		);
	}

	#[test]
	fn join_keeps_the_furthest_end() {
		let a = MemoryCost {
			offset: U256::from(0),
			len: U256::from(64),
		};
		let b = MemoryCost {
			offset: U256::from(100),
			len: U256::zero(),
		};
		let c = MemoryCost {
			offset: U256::from(32),
			len: U256::from(64),
		};
		assert_eq!(a.join(b).len, U256::from(64));
		assert_eq!(a.join(c).offset, U256::from(32));
	}
}

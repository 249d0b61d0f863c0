//! Standard EVM precompiles.

#![forbid(unsafe_code, unused_variables)]
#![warn(missing_docs)]
#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod blake2;
mod bn128;
mod modexp;
mod simple;

use crate::{
	blake2::Blake2F,
	bn128::{
		Bn128AddByzantium, Bn128AddIstanbul, Bn128MulByzantium, Bn128MulIstanbul,
		Bn128PairingByzantium, Bn128PairingIstanbul,
	},
	modexp::{ModexpBerlin, ModexpByzantium},
	simple::{ECRecover, Identity, Ripemd160, Sha256},
};
use alloc::vec::Vec;
use evm_engine::executor::stack::{PrecompileHandle, PrecompileResult, PrecompileSet};
use evm_engine::{Config, ExitError};
use primitive_types::H160;

trait PurePrecompile {
	fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult;
}

/// The standard precompile set on Ethereum mainnet, gated by the EIPs the
/// configuration activates.
#[derive(Clone, Copy, Debug)]
pub struct StandardPrecompileSet<'config> {
	config: &'config Config,
}

impl<'config> StandardPrecompileSet<'config> {
	/// Precompile set for the given configuration.
	pub fn new(config: &'config Config) -> Self {
		Self { config }
	}

	/// Addresses of every active precompile, ascending.
	pub fn addresses(&self) -> Vec<H160> {
		(1..=9)
			.map(address)
			.filter(|a| self.is_precompile(*a))
			.collect()
	}

	fn eip(&self, eip: u16) -> bool {
		self.config.is_activated_eip(eip)
	}
}

impl<'config> PrecompileSet for StandardPrecompileSet<'config> {
	fn execute(&self, handle: &mut impl PrecompileHandle) -> Option<PrecompileResult> {
		let code_address = handle.code_address();
		if !self.is_precompile(code_address) {
			return None;
		}

		let input = handle.input().to_vec();
		let istanbul_curve = self.eip(1108);

		let result = match code_address.to_low_u64_be() {
			1 => ECRecover.execute(&input, handle),
			2 => Sha256.execute(&input, handle),
			3 => Ripemd160.execute(&input, handle),
			4 => Identity.execute(&input, handle),
			5 if self.eip(2565) => ModexpBerlin.execute(&input, handle),
			5 => ModexpByzantium.execute(&input, handle),
			6 if istanbul_curve => Bn128AddIstanbul.execute(&input, handle),
			6 => Bn128AddByzantium.execute(&input, handle),
			7 if istanbul_curve => Bn128MulIstanbul.execute(&input, handle),
			7 => Bn128MulByzantium.execute(&input, handle),
			8 if istanbul_curve => Bn128PairingIstanbul.execute(&input, handle),
			8 => Bn128PairingByzantium.execute(&input, handle),
			_ => Blake2F.execute(&input, handle),
		};

		log::debug!(
			target: "evm",
			"precompile {:?} returned {:?}",
			code_address,
			result.as_ref().map(|output| output.exit_status)
		);

		Some(result)
	}

	fn is_precompile(&self, address: H160) -> bool {
		if address[..19] != [0u8; 19] {
			return false;
		}

		match address[19] {
			1..=4 => true,
			5 => self.eip(198),
			6 | 7 => self.eip(196),
			8 => self.eip(197),
			9 => self.eip(152),
			_ => false,
		}
	}
}

fn linear_cost(len: u64, base: u64, word: u64) -> Result<u64, ExitError> {
	let cost = base
		.checked_add(
			word.checked_mul(len.saturating_add(31) / 32)
				.ok_or(ExitError::OutOfGas)?,
		)
		.ok_or(ExitError::OutOfGas)?;

	Ok(cost)
}

const fn address(last: u8) -> H160 {
	H160([
		0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, last,
	])
}

use alloc::vec::Vec;
use core::cmp::min;

use evm_engine::executor::stack::{PrecompileHandle, PrecompileOutput, PrecompileResult};
use evm_engine::ExitSucceed;
use k256::ecdsa::{RecoveryId, Signature, VerifyingKey};
use primitive_types::H256;
use sha2::Digest;
use sha3::Keccak256;

use crate::{linear_cost, PurePrecompile};

fn returned(output: Vec<u8>) -> PrecompileResult {
	Ok(PrecompileOutput {
		exit_status: ExitSucceed::Returned,
		output,
	})
}

pub struct ECRecover;

impl ECRecover {
	fn recover(input: &[u8; 128]) -> Option<H256> {
		// v can only be 27 or 28 on the full 32 bytes value.
		if input[32..63] != [0u8; 31] || ![27, 28].contains(&input[63]) {
			return None;
		}

		let mut signature = Signature::from_slice(&input[64..128]).ok()?;
		let mut recovery_id = RecoveryId::from_byte(input[63] - 27)?;
		// Any s in [1, n) is accepted. k256 recovers only from low s, and
		// negating s mirrors the point, so the parity flips with it.
		if let Some(low) = signature.normalize_s() {
			signature = low;
			recovery_id = RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced());
		}
		let key = VerifyingKey::recover_from_prehash(&input[0..32], &signature, recovery_id).ok()?;
		let point = key.to_encoded_point(false);

		let mut address = H256::from_slice(Keccak256::digest(&point.as_bytes()[1..]).as_slice());
		address.0[0..12].copy_from_slice(&[0u8; 12]);
		Some(address)
	}
}

impl PurePrecompile for ECRecover {
	fn execute(&self, i: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
		const COST_BASE: u64 = 3000;
		const COST_WORD: u64 = 0;
		handle.record_cost(linear_cost(i.len() as u64, COST_BASE, COST_WORD)?)?;

		let mut input = [0u8; 128];
		input[..min(i.len(), 128)].copy_from_slice(&i[..min(i.len(), 128)]);

		// An unrecoverable signature still succeeds, with empty output.
		returned(
			Self::recover(&input)
				.map(|address| address.0.to_vec())
				.unwrap_or_default(),
		)
	}
}

pub struct Sha256;

impl PurePrecompile for Sha256 {
	fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
		const COST_BASE: u64 = 60;
		const COST_WORD: u64 = 12;
		handle.record_cost(linear_cost(input.len() as u64, COST_BASE, COST_WORD)?)?;

		returned(sha2::Sha256::digest(input).to_vec())
	}
}

pub struct Ripemd160;

impl PurePrecompile for Ripemd160 {
	fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
		const COST_BASE: u64 = 600;
		const COST_WORD: u64 = 120;
		handle.record_cost(linear_cost(input.len() as u64, COST_BASE, COST_WORD)?)?;

		let mut ret = [0u8; 32];
		ret[12..32].copy_from_slice(&ripemd::Ripemd160::digest(input));

		returned(ret.to_vec())
	}
}

pub struct Identity;

impl PurePrecompile for Identity {
	fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
		const COST_BASE: u64 = 15;
		const COST_WORD: u64 = 3;
		handle.record_cost(linear_cost(input.len() as u64, COST_BASE, COST_WORD)?)?;

		returned(input.to_vec())
	}
}

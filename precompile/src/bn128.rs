use alloc::vec::Vec;
use bn::{AffineG1, AffineG2, Fq, Fq2, Group, Gt, G1, G2};
use evm_engine::executor::stack::{PrecompileHandle, PrecompileOutput, PrecompileResult};
use evm_engine::{ExitError, ExitSucceed};
use primitive_types::{H256, U256};

use crate::{modexp::right_pad, PurePrecompile};

macro_rules! curve_precompile {
	($name:ident, $run:ident, $($cost:expr),+) => {
		pub struct $name;

		impl PurePrecompile for $name {
			fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
				Ok(PrecompileOutput {
					exit_status: ExitSucceed::Returned,
					output: $run(input, $($cost,)+ handle)?,
				})
			}
		}
	};
}

curve_precompile!(Bn128AddByzantium, run_add, 500);
curve_precompile!(Bn128AddIstanbul, run_add, 150);
curve_precompile!(Bn128MulByzantium, run_mul, 40_000);
curve_precompile!(Bn128MulIstanbul, run_mul, 6_000);
curve_precompile!(Bn128PairingByzantium, run_pair, 80_000, 100_000);
curve_precompile!(Bn128PairingIstanbul, run_pair, 34_000, 45_000);

// Encoded sizes. Field elements and scalars are 32 byte big endian words,
// G1 points are two of them and G2 points two Fq2 elements.
const FQ_LEN: usize = 32;
const SCALAR_LEN: usize = 32;
const FQ2_LEN: usize = 2 * FQ_LEN;
const G1_LEN: usize = 2 * FQ_LEN;
const G2_LEN: usize = 2 * FQ2_LEN;

/// Input length of ADD, two G1 points.
pub const ADD_INPUT_LEN: usize = 2 * G1_LEN;
/// Input length of MUL, a G1 point and a scalar.
pub const MUL_INPUT_LEN: usize = G1_LEN + SCALAR_LEN;
/// Length of one pairing element, a G1 point followed by a G2 point.
pub const PAIR_ELEMENT_LEN: usize = G1_LEN + G2_LEN;

/// Run the Bn254 add precompile
pub fn run_add(
	input: &[u8],
	gas_cost: u64,
	handle: &mut impl PrecompileHandle,
) -> Result<Vec<u8>, ExitError> {
	handle.record_cost(gas_cost)?;

	let input = right_pad::<ADD_INPUT_LEN>(input);

	let p1_bytes = &input[..G1_LEN];
	let p2_bytes = &input[G1_LEN..];
	Ok(g1_point_add(p1_bytes, p2_bytes)?.into())
}

/// Run the Bn254 mul precompile
pub fn run_mul(
	input: &[u8],
	gas_cost: u64,
	handle: &mut impl PrecompileHandle,
) -> Result<Vec<u8>, ExitError> {
	handle.record_cost(gas_cost)?;

	let input = right_pad::<MUL_INPUT_LEN>(input);

	let point_bytes = &input[..G1_LEN];
	let scalar_bytes = &input[G1_LEN..G1_LEN + SCALAR_LEN];
	Ok(g1_point_mul(point_bytes, scalar_bytes)?.into())
}

/// Run the Bn254 pair precompile
pub fn run_pair(
	input: &[u8],
	pair_per_point_cost: u64,
	pair_base_cost: u64,
	handle: &mut impl PrecompileHandle,
) -> Result<Vec<u8>, ExitError> {
	let gas_used = ((input.len() / PAIR_ELEMENT_LEN) as u64)
		.checked_mul(pair_per_point_cost)
		.and_then(|cost| cost.checked_add(pair_base_cost))
		.ok_or(ExitError::OutOfGas)?;
	handle.record_cost(gas_used)?;

	if input.len() % PAIR_ELEMENT_LEN != 0 {
		return Err(ExitError::OutOfGas);
	}

	let points = input
		.chunks_exact(PAIR_ELEMENT_LEN)
		.map(|element| element.split_at(G1_LEN))
		.collect::<Vec<_>>();

	let result = if pairing_check(&points)? {
		U256::one()
	} else {
		U256::zero()
	};
	let mut output = H256::zero();
	result.to_big_endian(&mut output[..]);
	Ok(output.0.into())
}

fn invalid_point<E>(_: E) -> ExitError {
	ExitError::Other("invalid bn128 point".into())
}

fn read_fq(input: &[u8]) -> Result<Fq, ExitError> {
	Fq::from_slice(&input[..FQ_LEN]).map_err(invalid_point)
}

// The imaginary part comes first.
fn read_fq2(input: &[u8]) -> Result<Fq2, ExitError> {
	let y = read_fq(&input[..FQ_LEN])?;
	let x = read_fq(&input[FQ_LEN..FQ2_LEN])?;
	Ok(Fq2::new(x, y))
}

/// Reads an affine G1 point. `(0, 0)` encodes the point at infinity.
pub fn read_g1_point(input: &[u8]) -> Result<G1, ExitError> {
	let x = read_fq(&input[..FQ_LEN])?;
	let y = read_fq(&input[FQ_LEN..G1_LEN])?;

	if x == Fq::zero() && y == Fq::zero() {
		Ok(G1::zero())
	} else {
		AffineG1::new(x, y).map(Into::into).map_err(invalid_point)
	}
}

/// Reads an affine G2 point. `(0, 0)` encodes the point at infinity.
pub fn read_g2_point(input: &[u8]) -> Result<G2, ExitError> {
	let x = read_fq2(&input[..FQ2_LEN])?;
	let y = read_fq2(&input[FQ2_LEN..G2_LEN])?;

	if x.is_zero() && y.is_zero() {
		Ok(G2::zero())
	} else {
		AffineG2::new(x, y).map(Into::into).map_err(invalid_point)
	}
}

/// Affine encoding of a G1 point, all zeroes for the point at infinity.
pub fn encode_g1_point(point: G1) -> Result<[u8; G1_LEN], ExitError> {
	let mut output = [0u8; G1_LEN];

	if let Some(affine) = AffineG1::from_jacobian(point) {
		affine
			.x()
			.to_big_endian(&mut output[..FQ_LEN])
			.map_err(invalid_point)?;
		affine
			.y()
			.to_big_endian(&mut output[FQ_LEN..])
			.map_err(invalid_point)?;
	}

	Ok(output)
}

fn g1_point_add(p1_bytes: &[u8], p2_bytes: &[u8]) -> Result<[u8; G1_LEN], ExitError> {
	let p1 = read_g1_point(p1_bytes)?;
	let p2 = read_g1_point(p2_bytes)?;
	encode_g1_point(p1 + p2)
}

// The scalar does not need to be canonical.
fn g1_point_mul(point_bytes: &[u8], scalar_bytes: &[u8]) -> Result<[u8; G1_LEN], ExitError> {
	let point = read_g1_point(point_bytes)?;
	let scalar = bn::Fr::from_slice(&scalar_bytes[..SCALAR_LEN]).map_err(invalid_point)?;
	encode_g1_point(point * scalar)
}

/// Whether the product of the pairings is the identity. Pairs with a point
/// at infinity contribute nothing, so an empty input checks true.
fn pairing_check(pairs: &[(&[u8], &[u8])]) -> Result<bool, ExitError> {
	let mut parsed = Vec::with_capacity(pairs.len());

	for (g1_bytes, g2_bytes) in pairs {
		let g1 = read_g1_point(g1_bytes)?;
		let g2 = read_g2_point(g2_bytes)?;

		if !g1.is_zero() && !g2.is_zero() {
			parsed.push((g1, g2));
		}
	}

	if parsed.is_empty() {
		return Ok(true);
	}

	Ok(bn::pairing_batch(&parsed) == Gt::one())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::MockHandle;
	use crate::address;

	fn handle(input: &[u8]) -> MockHandle {
		MockHandle::new(address(6), input.to_vec(), 1_000_000)
	}

	const G1_GENERATOR: &str = "\
		0000000000000000000000000000000000000000000000000000000000000001\
		0000000000000000000000000000000000000000000000000000000000000002";

	#[test]
	fn adding_infinity_is_identity() {
		let input = hex::decode(G1_GENERATOR).unwrap();
		let mut handle = handle(&input);
		let output = Bn128AddIstanbul.execute(&input, &mut handle).unwrap();

		assert_eq!(hex::encode(output.output), G1_GENERATOR);
		assert_eq!(handle.used, 150);
	}

	#[test]
	fn doubling_matches_multiplication() {
		let generator = hex::decode(G1_GENERATOR).unwrap();

		let mut add_input = generator.clone();
		add_input.extend_from_slice(&generator);
		let added = Bn128AddByzantium
			.execute(&add_input, &mut handle(&add_input))
			.unwrap();

		let mut mul_input = generator;
		mul_input.extend_from_slice(&[0u8; 31]);
		mul_input.push(2);
		let mut mul_handle = handle(&mul_input);
		let multiplied = Bn128MulIstanbul.execute(&mul_input, &mut mul_handle).unwrap();

		assert_eq!(added.output, multiplied.output);
		assert_eq!(mul_handle.used, 6_000);
	}

	#[test]
	fn points_off_the_curve_fail() {
		let mut input = [0u8; 64];
		input[31] = 1;
		input[63] = 1;
		assert!(Bn128AddIstanbul.execute(&input, &mut handle(&input)).is_err());
	}

	#[test]
	fn empty_pairing_is_true() {
		let mut handle = handle(&[]);
		let output = Bn128PairingIstanbul.execute(&[], &mut handle).unwrap();

		assert_eq!(output.output[31], 1);
		assert_eq!(handle.used, 45_000);
	}

	#[test]
	fn pairing_input_must_be_whole_elements() {
		let input = [0u8; PAIR_ELEMENT_LEN + 1];
		let mut handle = handle(&input);
		assert_eq!(
			Bn128PairingByzantium.execute(&input, &mut handle).unwrap_err(),
			ExitError::OutOfGas.into()
		);
		assert_eq!(handle.used, 180_000);
	}
}

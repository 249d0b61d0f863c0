mod eip152;

use alloc::vec::Vec;
use evm_engine::executor::stack::{PrecompileHandle, PrecompileOutput, PrecompileResult};
use evm_engine::{ExitError, ExitSucceed};

use crate::PurePrecompile;

pub struct Blake2F;

impl Blake2F {
	const GAS_COST_PER_ROUND: u64 = 1;
	const INPUT_LEN: usize = 213;
}

fn le_words<const N: usize>(bytes: &[u8]) -> [u64; N] {
	let mut words = [0u64; N];
	for (word, chunk) in words.iter_mut().zip(bytes.chunks_exact(8)) {
		let mut buf = [0u8; 8];
		buf.copy_from_slice(chunk);
		*word = u64::from_le_bytes(buf);
	}
	words
}

impl PurePrecompile for Blake2F {
	/// Format of `input`:
	/// [4 bytes for rounds][64 bytes for h][128 bytes for m][8 bytes for t_0][8 bytes for t_1][1 byte for f]
	fn execute(&self, input: &[u8], handle: &mut impl PrecompileHandle) -> PrecompileResult {
		if input.len() != Self::INPUT_LEN {
			return Err(ExitError::Other(
				"input length for Blake2 F precompile should be exactly 213 bytes".into(),
			)
			.into());
		}

		let mut rounds = [0u8; 4];
		rounds.copy_from_slice(&input[0..4]);
		let rounds = u32::from_be_bytes(rounds);
		handle.record_cost(u64::from(rounds) * Self::GAS_COST_PER_ROUND)?;

		let mut h = le_words::<8>(&input[4..68]);
		let m = le_words::<16>(&input[68..196]);
		let t = le_words::<2>(&input[196..212]);

		let f = match input[212] {
			0 => false,
			1 => true,
			_ => {
				return Err(
					ExitError::Other("incorrect final block indicator flag".into()).into(),
				)
			}
		};

		eip152::compress(&mut h, m, t, f, rounds as usize);

		let output = h
			.iter()
			.flat_map(|word| word.to_le_bytes())
			.collect::<Vec<u8>>();

		Ok(PrecompileOutput {
			exit_status: ExitSucceed::Returned,
			output,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::tests::MockHandle;
	use crate::address;

	fn input(rounds: u32, f: u8) -> Vec<u8> {
		let mut input = rounds.to_be_bytes().to_vec();
		input.extend(
			hex::decode(
				"48c9bdf267e6096a3ba7ca8485ae67bb2bf894fe72f36e3cf1361d5f3af54fa5\
				 d182e6ad7f520e511f6c3e2b8c68059b6bbd41fbabd9831f79217e1319cde05b",
			)
			.unwrap(),
		);
		let mut m = [0u8; 128];
		m[..3].copy_from_slice(b"abc");
		input.extend_from_slice(&m);
		input.extend_from_slice(&3u64.to_le_bytes());
		input.extend_from_slice(&0u64.to_le_bytes());
		input.push(f);
		input
	}

	#[test]
	fn eip_152_twelve_rounds() {
		let input = input(12, 1);
		let mut handle = MockHandle::new(address(9), input.clone(), 100);
		let output = Blake2F.execute(&input, &mut handle).unwrap();

		assert_eq!(
			hex::encode(output.output),
			"ba80a53f981c4d0d6a2797b69f12f6e94c212f14685ac4b74b12bb6fdbffa2d1\
			 7d87c5392aab792dc252d5de4533cc9518d38aa8dbf1925ab92386edd4009923"
		);
		assert_eq!(handle.used, 12);
	}

	#[test]
	fn rejects_bad_flag_and_length() {
		let bad_flag = input(12, 2);
		let mut handle = MockHandle::new(address(9), bad_flag.clone(), 100);
		assert!(Blake2F.execute(&bad_flag, &mut handle).is_err());

		let short = &bad_flag[..212];
		let mut handle = MockHandle::new(address(9), short.to_vec(), 100);
		assert!(Blake2F.execute(short, &mut handle).is_err());
		assert_eq!(handle.used, 0);
	}

	#[test]
	fn round_count_is_charged_before_compressing() {
		let input = input(u32::MAX, 1);
		let mut handle = MockHandle::new(address(9), input.clone(), 100);
		assert_eq!(
			Blake2F.execute(&input, &mut handle).unwrap_err(),
			ExitError::OutOfGas.into()
		);
	}
}

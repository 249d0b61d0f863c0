mod mock;

use std::collections::BTreeMap;

use evm_engine::executor::stack::{Message, PrecompileFailure, PrecompileFn, PrecompileOutput};
use evm_engine::{Config, ExitError, ExitReason, ExitRevert, ExitSucceed};
use mock::{address, caller, contract, transact_with, word, World};
use primitive_types::{H160, U256};

const GAS: u64 = 100_000;

fn echo() -> H160 {
	address(4)
}

fn precompiles() -> BTreeMap<H160, PrecompileFn> {
	let mut precompiles = BTreeMap::<H160, PrecompileFn>::new();
	precompiles.insert(echo(), |input, _, _, _| {
		let words = (input.len() as u64 + 31) / 32;
		Ok((
			PrecompileOutput {
				exit_status: ExitSucceed::Returned,
				output: input.to_vec(),
			},
			15 + 3 * words,
		))
	});
	precompiles.insert(address(0x100), |_, _, _, _| {
		Err(PrecompileFailure::Revert {
			exit_status: ExitRevert::Reverted,
			output: b"nope".to_vec(),
		})
	});
	precompiles.insert(address(0x101), |_, _, _, _| {
		Err(PrecompileFailure::Error {
			exit_status: ExitError::Other("broken".into()),
		})
	});
	precompiles
}

fn call(world: World, to: H160, data: Vec<u8>) -> mock::Outcome {
	transact_with(
		&Config::istanbul(),
		world,
		&precompiles(),
		Message::call(caller(), to, U256::zero(), data, GAS),
	)
}

#[test]
fn top_level_call_runs_the_precompile() {
	let data = vec![0xab; 33];
	let outcome = call(World::new(), echo(), data.clone());

	assert_eq!(
		outcome.result.reason,
		ExitReason::Succeed(ExitSucceed::Returned)
	);
	assert_eq!(outcome.result.return_value, data);
	assert_eq!(outcome.result.gas_used, 15 + 3 * 2);
}

#[test]
fn contracts_reach_the_precompile_through_call() {
	let contract_address = address(0xc0de);
	// MSTORE 0x2a at 0, CALL the echo precompile with those 32 bytes writing
	// the output to 32, keep the flag at slot 0 and the output at slot 1.
	let code = format!(
		"602a600052{}{}{}",
		"6020602060206000600073",
		hex::encode(echo()),
		"5af160005560205160015500"
	);
	let world = World::new().with(contract_address, contract(&code));
	let outcome = call(world, contract_address, Vec::new());

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(contract_address, 0), word(1));
	assert_eq!(outcome.world.storage(contract_address, 1), word(0x2a));
}

#[test]
fn precompile_revert_keeps_the_output() {
	let outcome = call(World::new(), address(0x100), Vec::new());

	assert_eq!(
		outcome.result.reason,
		ExitReason::Revert(ExitRevert::Reverted)
	);
	assert_eq!(outcome.result.return_value, b"nope".to_vec());
	assert!(outcome.result.gas_used < GAS);
}

#[test]
fn precompile_error_consumes_the_grant() {
	let outcome = call(World::new(), address(0x101), vec![1, 2, 3]);

	assert!(outcome.result.reason.is_exceptional_halt());
	assert_eq!(outcome.result.gas_used, GAS);
	assert!(outcome.result.return_value.is_empty());
}

#[test]
fn addresses_outside_the_set_run_as_accounts() {
	let outcome = call(World::new(), address(5), vec![1, 2, 3]);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Succeed(ExitSucceed::Stopped)
	);
	assert_eq!(outcome.result.gas_used, 0);
}

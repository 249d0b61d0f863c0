use std::collections::BTreeMap;

use evm_engine::backend::{MemoryAccount, MemoryBackend, MemoryVicinity};
use evm_engine::executor::stack::{
	ExecResult, MemoryStackState, Message, StackExecutor, StackSubstateMetadata,
};
use evm_engine::{Config, ExitError, ExitReason, ExitSucceed};
use evm_engine_precompile::StandardPrecompileSet;
use primitive_types::{H160, U256};

fn caller() -> H160 {
	H160::from_low_u64_be(0xca11)
}

fn run(config: &Config, accounts: BTreeMap<H160, MemoryAccount>, message: Message) -> ExecResult {
	let vicinity = MemoryVicinity::default();
	let backend = MemoryBackend::new(&vicinity, accounts);
	let precompiles = StandardPrecompileSet::new(config);
	let metadata = StackSubstateMetadata::new(message.gas_limit, config);
	let state = MemoryStackState::new(metadata, &backend);
	let mut executor = StackExecutor::new_with_precompiles(state, config, &precompiles);
	executor.run_call(message)
}

fn call(config: &Config, to: u64, data: Vec<u8>, gas: u64) -> ExecResult {
	run(
		config,
		BTreeMap::new(),
		Message::call(caller(), H160::from_low_u64_be(to), U256::zero(), data, gas),
	)
}

#[test]
fn sha256_through_the_executor() {
	let result = call(&Config::istanbul(), 2, Vec::new(), 100_000);

	assert_eq!(result.reason, ExitReason::Succeed(ExitSucceed::Returned));
	assert_eq!(result.gas_used, 60);
	assert_eq!(
		hex::encode(result.return_value),
		"e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
	);
}

#[test]
fn identity_echoes_its_input() {
	let result = call(&Config::istanbul(), 4, vec![7; 40], 100_000);

	assert!(result.reason.is_succeed());
	assert_eq!(result.return_value, vec![7; 40]);
	assert_eq!(result.gas_used, 15 + 3 * 2);
}

#[test]
fn short_grant_consumes_everything() {
	let result = call(&Config::istanbul(), 1, vec![0; 128], 1_000);

	assert_eq!(result.reason, ExitReason::Error(ExitError::OutOfGas));
	assert_eq!(result.gas_used, 1_000);
	assert!(result.return_value.is_empty());
}

#[test]
fn inactive_precompile_is_an_empty_account() {
	let result = call(&Config::homestead(), 5, vec![0; 96], 100_000);

	assert_eq!(result.reason, ExitReason::Succeed(ExitSucceed::Stopped));
	assert_eq!(result.gas_used, 0);
}

#[test]
fn precompiles_start_warm() {
	let config = Config::berlin();
	let contract = H160::from_low_u64_be(0xc0de);

	// CALL `target` with no data and all gas, then stop.
	let gas_calling = |target: u64| {
		let code = format!(
			"600060006000600060007300000000000000000000000000000000000000{:02x}5af100",
			target
		);
		let mut accounts = BTreeMap::new();
		accounts.insert(
			contract,
			MemoryAccount {
				nonce: U256::one(),
				code: hex::decode(code).unwrap(),
				..Default::default()
			},
		);
		let result = run(
			&config,
			accounts,
			Message::call(caller(), contract, U256::zero(), Vec::new(), 100_000),
		);
		assert!(result.reason.is_succeed());
		result.gas_used
	};

	// Identity with no input costs 15. A cold empty account costs 2600.
	assert_eq!(gas_calling(0x10) - gas_calling(4), 2_600 - 100 - 15);
}

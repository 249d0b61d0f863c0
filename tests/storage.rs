mod mock;

use evm_engine::executor::stack::Message;
use evm_engine::Config;
use mock::{address, caller, contract, transact, word, World};
use primitive_types::{H256, U256};

fn call(config: &Config, code: &str) -> mock::Outcome {
	let world = World::new().with(address(0xc0de), contract(code));
	transact(
		config,
		world,
		Message::call(caller(), address(0xc0de), U256::zero(), Vec::new(), 1_000_000),
	)
}

#[test]
fn writing_the_current_value_by_fork() {
	// Store zero over zero.
	let code = "600060005500";
	let cases = [
		(Config::petersburg(), 5_006),
		(Config::constantinople(), 206),
		(Config::istanbul(), 806),
		(Config::berlin(), 2_206),
	];

	for (config, gas) in cases {
		let outcome = call(&config, code);
		assert!(outcome.result.reason.is_succeed());
		assert_eq!(outcome.result.gas_used, gas, "{:?}", config.hardfork());
		assert_eq!(outcome.result.gas_refund, 0);
	}
}

#[test]
fn restoring_the_original_value_is_refunded() {
	let config = Config::istanbul();
	// 0 -> 1 -> 0 on slot 0.
	let outcome = call(&config, "6001600055600060005500");

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.result.gas_used, 3 + 3 + 20_000 + 3 + 3 + 800);
	assert_eq!(outcome.result.gas_refund, 19_200);
	assert_eq!(outcome.world.storage(address(0xc0de), 0), H256::zero());
}

#[test]
fn sstore_refuses_to_run_on_the_stipend() {
	let config = Config::istanbul();
	let world = World::new().with(address(0xc0de), contract("600160005500"));
	let outcome = transact(
		&config,
		world,
		Message::call(caller(), address(0xc0de), U256::zero(), Vec::new(), 2_300),
	);

	assert!(outcome.result.reason.is_exceptional_halt());
	assert_eq!(outcome.result.gas_used, 2_300);
}

#[test]
fn transient_storage_is_readable_within_the_transaction() {
	let config = Config::cancun();
	// TSTORE 7 at 0, TLOAD 0 and persist it at slot 0.
	let outcome = call(&config, "600760005d60005c60005500");

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(address(0xc0de), 0), word(7));
}

#[test]
fn transient_writes_follow_the_checkpoint() {
	let config = Config::cancun();
	let reverting = address(0xb1);
	let stopping = address(0xb2);

	// DELEGATECALL the library so its TSTORE lands in our context, then
	// persist TLOAD 0 at slot 0.
	let library_caller = |library: primitive_types::H160| {
		format!(
			"600060006000600073{}5af45060005c60005500",
			hex::encode(library)
		)
	};

	let world = World::new()
		.with(reverting, contract("600760005d60006000fd"))
		.with(stopping, contract("600760005d00"))
		.with(address(0xa1), contract(&library_caller(reverting)))
		.with(address(0xa2), contract(&library_caller(stopping)));

	let reverted = transact(
		&config,
		world.clone(),
		Message::call(caller(), address(0xa1), U256::zero(), Vec::new(), 1_000_000),
	);
	assert!(reverted.result.reason.is_succeed());
	assert_eq!(reverted.world.storage(address(0xa1), 0), H256::zero());

	let committed = transact(
		&config,
		world,
		Message::call(caller(), address(0xa2), U256::zero(), Vec::new(), 1_000_000),
	);
	assert!(committed.result.reason.is_succeed());
	assert_eq!(committed.world.storage(address(0xa2), 0), word(7));
}

#[test]
fn tstore_is_a_state_change() {
	let config = Config::cancun();
	let child = address(0xb);
	// STATICCALL a child that writes transient storage.
	let parent = format!(
		"6000600060006000 73{} 5afa 600055 00",
		hex::encode(child)
	)
	.replace(' ', "");

	let world = World::new()
		.with(child, contract("600760005d00"))
		.with(address(0xa), contract(&parent));
	let outcome = transact(
		&config,
		world,
		Message::call(caller(), address(0xa), U256::zero(), Vec::new(), 1_000_000),
	);

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(address(0xa), 0), H256::zero());
}

mod mock;

use evm_engine::executor::stack::Message;
use evm_engine::{Config, ExitError, ExitReason, ExitRevert, ExitSucceed, Opcode};
use mock::{address, call_op, caller, contract, funded, transact, word, World};
use primitive_types::{H256, U256};

const GAS: u64 = 1_000_000;

fn call(config: &Config, world: World, to: u64) -> mock::Outcome {
	transact(
		config,
		world,
		Message::call(caller(), address(to), U256::zero(), Vec::new(), GAS),
	)
}

#[test]
fn exceptional_halts_consume_the_whole_grant() {
	let config = Config::istanbul();
	let cases = [
		("01", ExitError::StackUnderflow),
		("5b6001600056", ExitError::StackOverflow),
		("600556", ExitError::InvalidJump),
	];

	for (code, error) in cases {
		let world = World::new().with(address(0xc0de), contract(code));
		let outcome = call(&config, world, 0xc0de);

		assert_eq!(outcome.result.reason, ExitReason::Error(error), "{}", code);
		assert_eq!(outcome.result.gas_used, GAS, "{}", code);
		assert!(outcome.result.return_value.is_empty());
	}

	let world = World::new().with(address(0xc0de), contract("fe"));
	let outcome = call(&config, world, 0xc0de);
	assert!(outcome.result.reason.is_exceptional_halt());
	assert_eq!(outcome.result.gas_used, GAS);
}

#[test]
fn revert_returns_data_and_unused_gas() {
	let config = Config::byzantium();
	let world = World::new().with(address(0xc0de), contract("602a60005260206000fd"));
	let outcome = call(&config, world, 0xc0de);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Revert(ExitRevert::Reverted)
	);
	assert_eq!(outcome.result.gas_used, 18);
	assert_eq!(outcome.result.return_value, word(0x2a).as_bytes().to_vec());
}

#[test]
fn return_charges_memory_once() {
	let config = Config::byzantium();
	let world = World::new().with(address(0xc0de), contract("602a60005260206000f3"));
	let outcome = call(&config, world, 0xc0de);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Succeed(ExitSucceed::Returned)
	);
	assert_eq!(outcome.result.gas_used, 18);
	assert_eq!(outcome.result.return_value, word(0x2a).as_bytes().to_vec());
}

#[test]
fn reverted_child_leaves_the_parent_intact() {
	let config = Config::istanbul();
	let child = address(0xb);
	// LOG0, store 1 at slot 0, revert.
	let child_code = "60006000a0600160005560006000fd";
	// Call the child, keep its success flag at slot 0, store 1 at slot 1.
	let parent_code = format!("{}600055600160015500", call_op(child, 0));

	let world = World::new()
		.with(child, contract(child_code))
		.with(address(0xa), contract(&parent_code));
	let outcome = call(&config, world, 0xa);

	assert!(outcome.result.reason.is_succeed());
	assert!(outcome.result.logs.is_empty());
	assert_eq!(outcome.world.storage(address(0xa), 0), H256::zero());
	assert_eq!(outcome.world.storage(address(0xa), 1), word(1));
	assert_eq!(outcome.world.storage(child, 0), H256::zero());
}

#[test]
fn committed_child_logs_reach_the_top() {
	let config = Config::istanbul();
	let child = address(0xb);
	let parent_code = format!("{}5000", call_op(child, 0));

	let world = World::new()
		.with(child, contract("60006000a000"))
		.with(address(0xa), contract(&parent_code));
	let outcome = call(&config, world, 0xa);

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.result.logs.len(), 1);
	assert_eq!(outcome.result.logs[0].address, child);
}

#[test]
fn failed_top_level_frame_drops_its_logs() {
	let config = Config::istanbul();
	let world = World::new().with(address(0xc0de), contract("60006000a0fe"));
	let outcome = call(&config, world, 0xc0de);

	assert!(outcome.result.reason.is_exceptional_halt());
	assert!(outcome.result.logs.is_empty());
}

#[test]
fn call_depth_is_bounded() {
	let mut config = Config::istanbul();
	config.call_stack_limit = 8;

	// Increment slot 0, then call ourselves with all the gas.
	let code = "60005460010160005560006000600060006000305af100";
	let world = World::new().with(address(0xc0de), contract(code));
	let outcome = call(&config, world, 0xc0de);

	assert!(outcome.result.reason.is_succeed());
	// Depths 0 through 8 ran, the call from depth 8 was refused.
	assert_eq!(outcome.world.storage(address(0xc0de), 0), word(9));
}

#[test]
fn value_call_creates_the_callee() {
	let config = Config::istanbul();
	let target = address(0xe);
	let mut sender = contract(&format!("{}60005500", call_op(target, 1)));
	sender.balance = U256::from(10);

	let world = World::new().with(address(0xa), sender);
	let outcome = call(&config, world, 0xa);

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(address(0xa), 0), word(1));
	assert_eq!(outcome.world.balance(target), U256::from(1));
	assert_eq!(outcome.world.balance(address(0xa)), U256::from(9));
	assert!(outcome.world.code(target).is_empty());
}

#[test]
fn zero_value_call_to_an_empty_account_pays_only_access() {
	let config = Config::berlin();
	let target = address(0xe);
	let world = World::new().with(address(0xa), contract(&call_op(target, 0)));
	let outcome = call(&config, world, 0xa);

	assert!(outcome.result.reason.is_succeed());
	// Six pushes and GAS, then the cold account access. No new-account
	// surcharge without value.
	assert_eq!(outcome.result.gas_used, 6 * 3 + 2 + 2600);
	assert!(!outcome.world.accounts.contains_key(&target));
}

#[test]
fn mcopy_moves_a_word_within_memory() {
	let config = Config::cancun();
	// MSTORE 0x2a at 0, MCOPY 32 bytes from 0 to 32, SSTORE MLOAD(32) at slot 0.
	let code = "602a600052602060006020 5e6020516000 5500".replace(' ', "");
	let world = World::new().with(address(0xc0de), contract(&code));
	let outcome = call(&config, world, 0xc0de);

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(address(0xc0de), 0), word(0x2a));

	// Not an opcode before Cancun.
	let world = World::new().with(address(0xc0de), contract(&code));
	let outcome = call(&Config::shanghai(), world, 0xc0de);
	assert_eq!(outcome.result.reason, ExitError::InvalidOpcode(Opcode::MCOPY).into());
}

#[test]
fn unaffordable_value_fails_only_the_call() {
	let config = Config::istanbul();
	let target = address(0xe);
	let code = format!("{}600055600160015500", call_op(target, 1));

	let world = World::new()
		.with(address(0xa), contract(&code))
		.with(target, funded(5));
	let outcome = call(&config, world, 0xa);

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(address(0xa), 0), H256::zero());
	assert_eq!(outcome.world.storage(address(0xa), 1), word(1));
	assert_eq!(outcome.world.balance(target), U256::from(5));
}

#[test]
fn top_level_value_moves_with_the_call() {
	let config = Config::istanbul();
	let world = World::new().with(address(0xc0de), contract("00"));
	let outcome = transact(
		&config,
		world,
		Message::call(caller(), address(0xc0de), U256::from(7), Vec::new(), GAS),
	);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Succeed(ExitSucceed::Stopped)
	);
	assert_eq!(outcome.result.gas_used, 0);
	assert_eq!(outcome.world.balance(address(0xc0de)), U256::from(7));
	assert_eq!(
		outcome.world.balance(caller()),
		U256::from(1_000_000_000 - 7)
	);
}

#[test]
fn top_level_overdraft_is_an_exceptional_halt() {
	let config = Config::istanbul();
	let world = World::new().with(address(0xc0de), contract("00"));
	let outcome = transact(
		&config,
		world,
		Message::call(
			caller(),
			address(0xc0de),
			U256::from(2_000_000_000u64),
			Vec::new(),
			GAS,
		),
	);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Error(ExitError::InsufficientBalance)
	);
	assert_eq!(outcome.result.gas_used, GAS);
	assert_eq!(outcome.world.balance(address(0xc0de)), U256::zero());
}

#[test]
fn static_call_forbids_writes() {
	let config = Config::byzantium();
	let child = address(0xb);
	// STATICCALL the child, keep its success flag at slot 0.
	let parent_code = format!(
		"6000600060006000 73{} 5afa 600055 00",
		hex::encode(child)
	)
	.replace(' ', "");

	let world = World::new()
		.with(child, contract("6001600055"))
		.with(address(0xa), contract(&parent_code));
	let outcome = call(&config, world, 0xa);

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(address(0xa), 0), H256::zero());
	assert_eq!(outcome.world.storage(child, 0), H256::zero());
}

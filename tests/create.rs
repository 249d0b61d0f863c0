mod mock;

use evm_engine::executor::stack::Message;
use evm_engine::{Config, ExitError, ExitReason, ExitSucceed};
use mock::{address, caller, contract, create_address, transact, word, World};
use primitive_types::{H256, U256};

const GAS: u64 = 10_000_000;

fn create(config: &Config, world: World, init_code: &str, gas: u64) -> mock::Outcome {
	transact(
		config,
		world,
		Message::create(caller(), U256::zero(), hex::decode(init_code).unwrap(), gas),
	)
}

// MSTORE8 0 at 0, RETURN one byte.
const RETURN_STOP: &str = "60006000536001 6000f3";

fn init(code: &str) -> String {
	code.replace(' ', "")
}

#[test]
fn deploys_the_returned_code() {
	let config = Config::istanbul();
	let outcome = create(&config, World::new(), &init(RETURN_STOP), GAS);
	let created = create_address(caller(), 0);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Succeed(ExitSucceed::Returned)
	);
	assert_eq!(outcome.result.created_address, Some(created));
	assert!(outcome.result.return_value.is_empty());
	assert_eq!(outcome.result.gas_used, 18 + 200);
	assert_eq!(outcome.world.code(created), vec![0x00]);
	assert_eq!(outcome.world.accounts[&created].nonce, U256::one());
}

#[test]
fn occupied_address_is_a_collision() {
	let config = Config::istanbul();
	let created = create_address(caller(), 0);
	let world = World::new().with(created, contract(""));
	let outcome = create(&config, world, &init(RETURN_STOP), 100_000);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Error(ExitError::CreateCollision)
	);
	assert_eq!(outcome.result.gas_used, 100_000);
	assert_eq!(outcome.result.created_address, None);
	assert!(outcome.world.code(created).is_empty());
}

#[test]
fn code_size_limit_is_inclusive() {
	let config = Config::istanbul();

	// RETURN 0x6000 zero bytes.
	let outcome = create(&config, World::new(), "620060006000f3", GAS);
	assert!(outcome.result.reason.is_succeed());
	assert_eq!(
		outcome.world.code(create_address(caller(), 0)).len(),
		0x6000
	);

	// One byte more.
	let outcome = create(&config, World::new(), "620060016000f3", GAS);
	assert_eq!(outcome.result.reason, ExitReason::Error(ExitError::OutOfGas));
	assert_eq!(outcome.result.gas_used, GAS);
	assert_eq!(outcome.result.created_address, None);
	assert!(!outcome
		.world
		.accounts
		.contains_key(&create_address(caller(), 0)));
}

#[test]
fn leading_ef_is_rejected_from_london() {
	let code = "60ef6000536001 6000f3";

	let outcome = create(&Config::london(), World::new(), &init(code), GAS);
	assert_eq!(
		outcome.result.reason,
		ExitReason::Error(ExitError::InvalidBytecodeResult)
	);
	assert_eq!(outcome.result.gas_used, GAS);

	let outcome = create(&Config::berlin(), World::new(), &init(code), GAS);
	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.code(create_address(caller(), 0)), vec![0xef]);
}

#[test]
fn frontier_keeps_a_create_that_cannot_pay_the_deposit() {
	let created = create_address(caller(), 0);

	let outcome = create(&Config::frontier(), World::new(), &init(RETURN_STOP), 100);
	assert_eq!(
		outcome.result.reason,
		ExitReason::Error(ExitError::CodeStoreOutOfGas)
	);
	assert_eq!(outcome.result.gas_used, 18);
	assert_eq!(outcome.result.created_address, Some(created));
	assert!(outcome.world.accounts.contains_key(&created));
	assert!(outcome.world.code(created).is_empty());

	let outcome = create(&Config::homestead(), World::new(), &init(RETURN_STOP), 100);
	assert_eq!(outcome.result.reason, ExitReason::Error(ExitError::OutOfGas));
	assert_eq!(outcome.result.gas_used, 100);
	assert!(!outcome.world.accounts.contains_key(&created));
}

#[test]
fn nested_create_uses_the_nonce_before_the_bump() {
	let config = Config::istanbul();
	let factory = address(0xfac);
	// CREATE with empty init code, store the address at slot 0.
	let world = World::new().with(factory, contract("600060006000f060005500"));
	let outcome = transact(
		&config,
		world,
		Message::call(caller(), factory, U256::zero(), Vec::new(), GAS),
	);

	let child = create_address(factory, 1);
	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(factory, 0), H256::from(child));
	assert_eq!(outcome.world.accounts[&factory].nonce, U256::from(2));
	assert_eq!(outcome.world.accounts[&child].nonce, U256::one());
}

#[test]
fn create_at_the_depth_limit_is_refused() {
	let mut config = Config::istanbul();
	config.call_stack_limit = 8;
	let factory = address(0xfac);

	// n = ++slot[0]; call ourselves; then measure a CREATE:
	// slot[n] = (CREATE == 0), slot[0x100 + n] = gas spent from GAS to GAS.
	let code = [
		"60005460010180600055",
		"60006000600060006000305af150",
		"5a600060006000f0158255",
		"5a900390610100015500",
	]
	.concat();
	let world = World::new().with(factory, contract(&code));
	let outcome = transact(
		&config,
		world,
		Message::call(caller(), factory, U256::zero(), Vec::new(), GAS),
	);

	assert!(outcome.result.reason.is_succeed());
	assert_eq!(outcome.world.storage(factory, 0), word(9));
	// Depth 8 is the limit: its CREATE pushed zero and only paid for itself
	// and the SSTORE of the flag.
	assert_eq!(outcome.world.storage(factory, 9), word(1));
	assert_eq!(outcome.world.storage(factory, 0x109), word(9 + 32000 + 3 + 3 + 20000 + 2));
	// One level up the CREATE succeeded and its child returned all its gas.
	assert_eq!(outcome.world.storage(factory, 8), H256::zero());
	assert_eq!(outcome.world.storage(factory, 0x108), word(9 + 32000 + 3 + 3 + 800 + 2));
	// Eight deployments bumped the nonce, the refused one did not.
	assert_eq!(outcome.world.accounts[&factory].nonce, U256::from(1 + 8));
}

#[test]
fn create2_derives_from_the_salt() {
	let config = Config::istanbul();
	let salt = H256::from_low_u64_be(0x5a17);
	let outcome = transact(
		&config,
		World::new(),
		Message::create2(
			caller(),
			U256::zero(),
			hex::decode(init(RETURN_STOP)).unwrap(),
			salt,
			GAS,
		),
	);

	let created = outcome.result.created_address.unwrap();
	assert_ne!(created, create_address(caller(), 0));
	assert_eq!(outcome.world.code(created), vec![0x00]);
}

#[test]
fn init_code_size_is_bounded_from_shanghai() {
	let config = Config::shanghai();
	let init_code = vec![0u8; 2 * 0x6000 + 1];
	let outcome = transact(
		&config,
		World::new(),
		Message::create(caller(), U256::zero(), init_code, GAS),
	);

	assert_eq!(
		outcome.result.reason,
		ExitReason::Error(ExitError::InitcodeSizeViolation)
	);
	assert_eq!(outcome.result.gas_used, GAS);
}

mod eof {
	use super::*;

	// Header for a single code section of `len` bytes.
	fn container(code: &str) -> String {
		format!("ef00010100{:02x}00{}", code.len() / 2, code)
	}

	fn config() -> Config {
		Config::shanghai().with_eip(3540).unwrap()
	}

	/// Init code returning `bytes`, at most 32 of them.
	fn returning(bytes: &str) -> String {
		let len = bytes.len() / 2;
		format!(
			"{:02x}{}60005260{:02x}60{:02x}f3",
			0x5f + len,
			bytes,
			len,
			32 - len
		)
	}

	#[test]
	fn valid_container_is_deployed() {
		let container = container("600000");
		let outcome = create(&config(), World::new(), &returning(&container), GAS);

		assert!(outcome.result.reason.is_succeed(), "{:?}", outcome.result.reason);
		assert_eq!(
			outcome.world.code(create_address(caller(), 0)),
			hex::decode(&container).unwrap()
		);
	}

	#[test]
	fn malformed_container_is_rejected() {
		let outcome = create(&config(), World::new(), &returning("ef0002"), GAS);
		assert_eq!(
			outcome.result.reason,
			ExitReason::Error(ExitError::InvalidEofFormat)
		);
	}

	#[test]
	fn undefined_opcodes_are_rejected_with_code_validation() {
		let init_code = returning(&container("0c00"));

		let outcome = create(&config(), World::new(), &init_code, GAS);
		assert!(outcome.result.reason.is_succeed());

		let validating = config().with_eip(3670).unwrap();
		let outcome = create(&validating, World::new(), &init_code, GAS);
		assert_eq!(
			outcome.result.reason,
			ExitReason::Error(ExitError::InvalidEofFormat)
		);
	}

	#[test]
	fn only_the_code_section_runs() {
		// PUSH1 1, PUSH1 0, SSTORE, STOP with a trailing data section.
		let code = "ef000101000602000200600160005500aaaa";
		let world = World::new().with(address(0xe0f), contract(code));
		let outcome = transact(
			&config(),
			world,
			Message::call(caller(), address(0xe0f), U256::zero(), Vec::new(), GAS),
		);

		assert!(outcome.result.reason.is_succeed());
		assert_eq!(outcome.world.storage(address(0xe0f), 0), mock::word(1));
	}

	#[test]
	fn stray_magic_byte_does_not_run() {
		let world = World::new().with(address(0xe0f), contract("ef"));
		let outcome = transact(
			&config(),
			world,
			Message::call(caller(), address(0xe0f), U256::zero(), Vec::new(), GAS),
		);

		assert_eq!(
			outcome.result.reason,
			ExitReason::Error(ExitError::InvalidBytecodeResult)
		);
	}
}

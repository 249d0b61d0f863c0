#![allow(dead_code)]

use std::collections::BTreeMap;

use evm_engine::backend::{ApplyBackend, MemoryAccount, MemoryBackend, MemoryVicinity};
use evm_engine::executor::stack::{
	ExecResult, MemoryStackState, Message, PrecompileSet, StackExecutor, StackSubstateMetadata,
};
use evm_engine::Config;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

pub fn address(n: u64) -> H160 {
	H160::from_low_u64_be(n)
}

pub fn caller() -> H160 {
	address(0xca11)
}

pub fn contract(code: &str) -> MemoryAccount {
	MemoryAccount {
		nonce: U256::one(),
		code: hex::decode(code).unwrap(),
		..Default::default()
	}
}

pub fn funded(balance: u64) -> MemoryAccount {
	MemoryAccount {
		balance: U256::from(balance),
		..Default::default()
	}
}

/// `CALL` forwarding all gas to `target` with no data, leaving the success
/// flag on the stack.
pub fn call_op(target: H160, value: u8) -> String {
	format!(
		"600060006000600060{:02x}73{}5af1",
		value,
		hex::encode(target)
	)
}

/// Address of a `CREATE` by `caller` at `nonce`.
pub fn create_address(caller: H160, nonce: u64) -> H160 {
	let mut stream = rlp::RlpStream::new_list(2);
	stream.append(&caller);
	stream.append(&U256::from(nonce));
	H256::from_slice(Keccak256::digest(stream.out()).as_slice()).into()
}

pub fn word(n: u64) -> H256 {
	H256::from_low_u64_be(n)
}

#[derive(Clone, Debug)]
pub struct World {
	pub accounts: BTreeMap<H160, MemoryAccount>,
}

impl World {
	pub fn new() -> Self {
		let mut accounts = BTreeMap::new();
		accounts.insert(caller(), funded(1_000_000_000));
		Self { accounts }
	}

	pub fn with(mut self, address: H160, account: MemoryAccount) -> Self {
		self.accounts.insert(address, account);
		self
	}

	pub fn storage(&self, address: H160, key: u64) -> H256 {
		self.accounts
			.get(&address)
			.and_then(|account| account.storage.get(&word(key)).copied())
			.unwrap_or_default()
	}

	pub fn balance(&self, address: H160) -> U256 {
		self.accounts
			.get(&address)
			.map(|account| account.balance)
			.unwrap_or_default()
	}

	pub fn code(&self, address: H160) -> Vec<u8> {
		self.accounts
			.get(&address)
			.map(|account| account.code.clone())
			.unwrap_or_default()
	}
}

pub struct Outcome {
	pub result: ExecResult,
	pub world: World,
}

pub fn transact(config: &Config, world: World, message: Message) -> Outcome {
	transact_with(config, world, &(), message)
}

/// Run `message` as the only message of a transaction and apply what the
/// root checkpoint kept.
pub fn transact_with<P: PrecompileSet>(
	config: &Config,
	world: World,
	precompiles: &P,
	message: Message,
) -> Outcome {
	let vicinity = MemoryVicinity::default();
	let mut backend = MemoryBackend::new(&vicinity, world.accounts);

	let metadata = StackSubstateMetadata::new(message.gas_limit, config);
	let state = MemoryStackState::new(metadata, &backend);
	let mut executor = StackExecutor::new_with_precompiles(state, config, precompiles);

	let result = executor.run_call(message);
	let (applies, logs) = executor.into_state().deconstruct().unwrap();
	backend.apply(applies, logs, config.is_activated_eip(161));

	Outcome {
		result,
		world: World {
			accounts: backend.state().clone(),
		},
	}
}

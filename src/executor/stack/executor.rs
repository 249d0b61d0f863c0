use crate::backend::{Backend, Log};
use crate::executor::stack::message::{ExecResult, Message};
use crate::executor::stack::precompile::{
	PrecompileFailure, PrecompileHandle, PrecompileOutput, PrecompileSet,
};
use crate::gasometer::{self, Gasometer, StorageTarget};
use crate::{
	eof, CallScheme, Config, Context, CreateScheme, ExitError, ExitFatal, ExitReason, ExitSucceed,
	Handler,
	Opcode, OpcodeCost, Runtime, Stack, Transfer,
};
use alloc::{
	borrow::Cow,
	collections::{BTreeMap, BTreeSet},
	rc::Rc,
	vec::Vec,
};
use core::cmp::min;
use primitive_types::{H160, H256, U256};
use sha3::{Digest, Keccak256};

pub enum StackExitKind {
	Succeeded,
	Reverted,
	Failed,
}

#[derive(Default, Clone, Debug)]
pub struct Accessed {
	pub accessed_addresses: BTreeSet<H160>,
	pub accessed_storage: BTreeSet<(H160, H256)>,
}

impl Accessed {
	pub fn access_address(&mut self, address: H160) {
		self.accessed_addresses.insert(address);
	}

	pub fn access_addresses<I>(&mut self, addresses: I)
	where
		I: Iterator<Item = H160>,
	{
		for address in addresses {
			self.accessed_addresses.insert(address);
		}
	}

	pub fn access_storages<I>(&mut self, storages: I)
	where
		I: Iterator<Item = (H160, H256)>,
	{
		for storage in storages {
			self.accessed_storage.insert((storage.0, storage.1));
		}
	}
}

/// Bookkeeping of one checkpoint that lives beside the state: the frame
/// gasometer, static-ness, depth and the warm set.
#[derive(Clone, Debug)]
pub struct StackSubstateMetadata<'config> {
	gasometer: Gasometer<'config>,
	is_static: bool,
	depth: Option<usize>,
	accessed: Option<Accessed>,
}

impl<'config> StackSubstateMetadata<'config> {
	pub fn new(gas_limit: u64, config: &'config Config) -> Self {
		let accessed = if config.increase_state_access_gas() {
			Some(Accessed::default())
		} else {
			None
		};
		Self {
			gasometer: Gasometer::new(gas_limit, config),
			is_static: false,
			depth: None,
			accessed,
		}
	}

	pub fn swallow_commit(&mut self, other: Self) -> Result<(), ExitError> {
		self.gasometer.record_stipend(other.gasometer.gas())?;
		self.gasometer
			.record_refund(other.gasometer.refunded_gas())?;

		if let (Some(mut other_accessed), Some(self_accessed)) =
			(other.accessed, self.accessed.as_mut())
		{
			self_accessed
				.accessed_addresses
				.append(&mut other_accessed.accessed_addresses);
			self_accessed
				.accessed_storage
				.append(&mut other_accessed.accessed_storage);
		}

		Ok(())
	}

	/// The child's warmings go away with it. Its unused gas comes back.
	pub fn swallow_revert(&mut self, other: Self) -> Result<(), ExitError> {
		self.gasometer.record_stipend(other.gasometer.gas())?;

		Ok(())
	}

	pub fn swallow_discard(&mut self, _other: Self) -> Result<(), ExitError> {
		Ok(())
	}

	pub fn spit_child(&self, gas_limit: u64, is_static: bool) -> Self {
		Self {
			gasometer: Gasometer::new(gas_limit, self.gasometer.config()),
			is_static: is_static || self.is_static,
			depth: match self.depth {
				None => Some(0),
				Some(n) => Some(n + 1),
			},
			accessed: self.accessed.as_ref().map(|_| Accessed::default()),
		}
	}

	pub fn gasometer(&self) -> &Gasometer<'config> {
		&self.gasometer
	}

	pub fn gasometer_mut(&mut self) -> &mut Gasometer<'config> {
		&mut self.gasometer
	}

	pub fn is_static(&self) -> bool {
		self.is_static
	}

	/// Depth of the frame owning this checkpoint. `None` for the root.
	pub fn depth(&self) -> Option<usize> {
		self.depth
	}

	pub fn access_address(&mut self, address: H160) {
		if let Some(accessed) = &mut self.accessed {
			accessed.access_address(address)
		}
	}

	pub fn access_addresses<I>(&mut self, addresses: I)
	where
		I: Iterator<Item = H160>,
	{
		if let Some(accessed) = &mut self.accessed {
			accessed.access_addresses(addresses);
		}
	}

	pub fn access_storage(&mut self, address: H160, key: H256) {
		if let Some(accessed) = &mut self.accessed {
			accessed.accessed_storage.insert((address, key));
		}
	}

	pub fn access_storages<I>(&mut self, storages: I)
	where
		I: Iterator<Item = (H160, H256)>,
	{
		if let Some(accessed) = &mut self.accessed {
			accessed.access_storages(storages);
		}
	}

	pub fn accessed(&self) -> &Option<Accessed> {
		&self.accessed
	}
}

/// Checkpointed world state the executor runs against.
#[auto_impl::auto_impl(&mut, Box)]
pub trait StackState<'config>: Backend {
	fn metadata(&self) -> &StackSubstateMetadata<'config>;
	fn metadata_mut(&mut self) -> &mut StackSubstateMetadata<'config>;

	fn enter(&mut self, gas_limit: u64, is_static: bool);
	fn exit_commit(&mut self) -> Result<(), ExitError>;
	fn exit_revert(&mut self) -> Result<(), ExitError>;
	fn exit_discard(&mut self) -> Result<(), ExitError>;

	fn is_empty(&self, address: H160) -> bool;
	fn deleted(&self, address: H160) -> bool;
	fn created(&self, address: H160) -> bool;
	fn is_cold(&self, address: H160) -> bool;
	fn is_storage_cold(&self, address: H160, key: H256) -> bool;
	fn transient_storage(&self, address: H160, key: H256) -> H256;

	/// Logs of the current checkpoint.
	fn logs(&self) -> &[Log];
	/// Self-destructs of the current checkpoint, with their beneficiaries.
	fn deletes(&self) -> &BTreeMap<H160, H160>;

	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError>;
	fn set_storage(&mut self, address: H160, key: H256, value: H256);
	fn set_transient_storage(&mut self, address: H160, key: H256, value: H256);
	fn reset_storage(&mut self, address: H160);
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>);
	fn set_deleted(&mut self, address: H160, target: H160);
	fn set_created(&mut self, address: H160);
	fn set_code(&mut self, address: H160, code: Vec<u8>);
	fn transfer(&mut self, transfer: Transfer) -> Result<(), ExitError>;
	fn reset_balance(&mut self, address: H160);
	fn touch(&mut self, address: H160);

	/// Loads the whole code by default. Override when the size is stored.
	fn code_size(&self, address: H160) -> U256 {
		U256::from(self.code(address).len())
	}

	/// Hashes the code on every call by default.
	fn code_hash(&self, address: H160) -> H256 {
		H256::from_slice(Keccak256::digest(self.code(address)).as_slice())
	}
}

fn l64(gas: u64) -> u64 {
	gas - gas / 64
}

/// Runs transactions as nested frames over a [`StackState`], serving as the
/// [`Handler`] of each frame it runs.
pub struct StackExecutor<'config, 'precompiles, S, P> {
	config: &'config Config,
	state: S,
	precompile_set: &'precompiles P,
}

impl<'config, 'precompiles, S: StackState<'config>, P: PrecompileSet>
	StackExecutor<'config, 'precompiles, S, P>
{
	pub fn config(&self) -> &'config Config {
		self.config
	}

	pub fn precompiles(&self) -> &'precompiles P {
		self.precompile_set
	}

	pub fn new_with_precompiles(
		state: S,
		config: &'config Config,
		precompile_set: &'precompiles P,
	) -> Self {
		Self {
			config,
			state,
			precompile_set,
		}
	}

	pub fn state(&self) -> &S {
		&self.state
	}

	pub fn state_mut(&mut self) -> &mut S {
		&mut self.state
	}

	pub fn into_state(self) -> S {
		self.state
	}

	pub fn enter_substate(&mut self, gas_limit: u64, is_static: bool) {
		self.state.enter(gas_limit, is_static);
	}

	pub fn exit_substate(&mut self, kind: StackExitKind) -> Result<(), ExitError> {
		match kind {
			StackExitKind::Succeeded => self.state.exit_commit(),
			StackExitKind::Reverted => self.state.exit_revert(),
			StackExitKind::Failed => self.state.exit_discard(),
		}
	}

	/// Gas left in the root checkpoint.
	pub fn gas(&self) -> u64 {
		self.state.metadata().gasometer().gas()
	}

	/// Execute a top-level message.
	///
	/// The frame is granted the message gas limit, capped by the gas left in
	/// the root checkpoint. Its caller, its target and, from Shanghai, the
	/// coinbase are warm.
	pub fn run_call(&mut self, mut message: Message) -> ExecResult {
		let gas_limit = min(message.gas_limit, self.gas());
		if let Err(e) = self
			.state
			.metadata_mut()
			.gasometer_mut()
			.record_cost(gas_limit)
		{
			return ExecResult::failed(e.into(), gas_limit);
		}
		message.gas_limit = gas_limit;

		if self.config.increase_state_access_gas() {
			let mut warm = Vec::from([message.caller]);
			warm.extend(message.to);
			if self.config.is_activated_eip(3651) {
				warm.push(self.block_coinbase());
			}
			self.state
				.metadata_mut()
				.access_addresses(warm.into_iter());
		}

		self.execute_message(message)
	}

	/// Execute the message code at its target, without resolving code,
	/// consulting the precompiles or moving value.
	pub fn run_code(&mut self, message: Message) -> ExecResult {
		let to = match message.to {
			Some(to) => to,
			None => return self.run_call(message),
		};
		let gas_limit = min(message.gas_limit, self.gas());
		if let Err(e) = self
			.state
			.metadata_mut()
			.gasometer_mut()
			.record_cost(gas_limit)
		{
			return ExecResult::failed(e.into(), gas_limit);
		}

		self.enter_substate(gas_limit, message.is_static);
		let context = Context {
			address: to,
			caller: message.caller,
			apparent_value: message.value,
		};
		let code = message.code.clone().unwrap_or_default();
		let (reason, return_value) = self.run_interpreter(code, message.data.clone(), context);
		self.exit_frame(reason, return_value, None)
	}

	/// Run one frame to completion and fold its checkpoint into the parent.
	fn execute_message(&mut self, message: Message) -> ExecResult {
		event!(BeforeMessage { message: &message });
		log::debug!(
			target: "evm",
			"Executing message at depth {} from {:?} to {:?} with {} gas",
			message.depth,
			message.caller,
			message.to,
			message.gas_limit
		);

		let created = if message.is_create() {
			let address = self.message_create_address(&message);
			self.state.metadata_mut().access_address(message.caller);
			self.state.metadata_mut().access_address(address);
			Some(address)
		} else {
			None
		};

		self.enter_substate(message.gas_limit, message.is_static);

		let (reason, return_value, created_address) = match (created, message.to) {
			(Some(address), _) => self.execute_create(&message, address),
			(None, Some(to)) => {
				let (reason, return_value) = self.execute_call(&message, to);
				(reason, return_value, None)
			}
			(None, None) => (ExitError::Other("message without target".into()).into(), Vec::new(), None),
		};

		self.exit_frame(reason, return_value, created_address)
	}

	fn exit_frame(
		&mut self,
		reason: ExitReason,
		return_value: Vec<u8>,
		created_address: Option<H160>,
	) -> ExecResult {
		// Before Homestead a create that cannot pay the deposit keeps its
		// effects and the gas it did not use.
		let code_store_quirk = reason == ExitReason::Error(ExitError::CodeStoreOutOfGas);
		if reason.is_exceptional_halt() && !code_store_quirk {
			self.state.metadata_mut().gasometer_mut().fail();
		}
		let keep = reason.is_succeed() || code_store_quirk;

		let gasometer = self.state.metadata().gasometer();
		let gas_used = gasometer.total_used_gas();
		let mut gas_refund = if keep { gasometer.refunded_gas() } else { 0 };
		let (mut logs, mut selfdestruct) = if keep {
			(self.state.logs().to_vec(), self.state.deletes().clone())
		} else {
			(Vec::new(), BTreeMap::new())
		};
		let return_value = if reason.is_exceptional_halt() {
			Vec::new()
		} else {
			return_value
		};

		let kind = if keep {
			StackExitKind::Succeeded
		} else if reason.is_revert() {
			StackExitKind::Reverted
		} else {
			StackExitKind::Failed
		};
		// A failing exit means the checkpoint stack is out of step.
		let (mut reason, mut return_value, mut created_address) =
			(reason, return_value, created_address);
		if let Err(e) = self.exit_substate(kind) {
			log::error!(target: "evm", "Failed to exit substate: {:?}", e);
			reason = ExitFatal::Other(Cow::Borrowed("unbalanced substate stack")).into();
			gas_refund = 0;
			return_value.clear();
			logs.clear();
			selfdestruct.clear();
			created_address = None;
		}

		log::debug!(
			target: "evm",
			"Message exited with {:?}, {} gas used",
			reason,
			gas_used
		);

		let result = ExecResult {
			reason,
			gas_used,
			gas_refund,
			return_value,
			created_address: if keep { created_address } else { None },
			logs,
			selfdestruct,
		};
		event!(AfterMessage { result: &result });

		result
	}

	fn execute_call(&mut self, message: &Message, to: H160) -> (ExitReason, Vec<u8>) {
		self.state.touch(to);

		if !message.delegatecall {
			let transfer = Transfer {
				source: message.authcall_origin.unwrap_or(message.caller),
				target: to,
				value: message.value,
			};
			if let Err(e) = self.state.transfer(transfer) {
				return (e.into(), Vec::new());
			}
		}

		let context = Context {
			address: to,
			caller: message.caller,
			apparent_value: message.value,
		};
		let code_address = message.code_address.unwrap_or(to);

		if message.code.is_none() {
			let is_static = self.state.metadata().is_static();
			let precompile_set = self.precompile_set;
			if let Some(result) = precompile_set.execute(&mut StackExecutorHandle {
				executor: self,
				code_address,
				input: &message.data,
				gas_limit: Some(message.gas_limit),
				context: &context,
				is_static,
			}) {
				log::debug!(target: "evm", "Precompile at {:?} returned {:?}", code_address, result);

				return match result {
					Ok(PrecompileOutput {
						exit_status,
						output,
					}) => (ExitReason::Succeed(exit_status), output),
					Err(PrecompileFailure::Error { exit_status }) => {
						(ExitReason::Error(exit_status), Vec::new())
					}
					Err(PrecompileFailure::Revert {
						exit_status,
						output,
					}) => (ExitReason::Revert(exit_status), output),
					Err(PrecompileFailure::Fatal { exit_status }) => {
						(ExitReason::Fatal(exit_status), Vec::new())
					}
				};
			}
		}

		let code = match &message.code {
			Some(code) => code.clone(),
			None => self.state.code(code_address),
		};
		if code.is_empty() {
			return (ExitSucceed::Stopped.into(), Vec::new());
		}

		self.run_interpreter(code, message.data.clone(), context)
	}

	fn execute_create(
		&mut self,
		message: &Message,
		address: H160,
	) -> (ExitReason, Vec<u8>, Option<H160>) {
		let init_code = message.code.as_ref().unwrap_or(&message.data).clone();
		if let Some(limit) = self.config.max_initcode_size() {
			if init_code.len() > limit {
				return (ExitError::InitcodeSizeViolation.into(), Vec::new(), None);
			}
		}

		if self.code_size(address) != U256::zero() || self.nonce(address) > U256::zero() {
			return (ExitError::CreateCollision.into(), Vec::new(), None);
		}

		self.state.reset_storage(address);
		self.state.set_created(address);

		let transfer = Transfer {
			source: message.caller,
			target: address,
			value: message.value,
		};
		if let Err(e) = self.state.transfer(transfer) {
			return (e.into(), Vec::new(), None);
		}

		if self.config.create_increase_nonce() {
			if let Err(e) = self.state.inc_nonce(address) {
				return (e.into(), Vec::new(), None);
			}
		}

		let context = Context {
			address,
			caller: message.caller,
			apparent_value: message.value,
		};
		let (reason, return_value) = self.run_interpreter(init_code, Vec::new(), context);

		log::debug!(target: "evm", "Create execution using address {}: {:?}", address, reason);

		match reason {
			ExitReason::Succeed(s) => match self.deposit_code(address, return_value) {
				Ok(()) => (ExitReason::Succeed(s), Vec::new(), Some(address)),
				Err(ExitError::CodeStoreOutOfGas) => (
					ExitError::CodeStoreOutOfGas.into(),
					Vec::new(),
					Some(address),
				),
				Err(e) => (e.into(), Vec::new(), None),
			},
			reason => (reason, return_value, None),
		}
	}

	/// Charge and validate the code returned by init code, then store it.
	fn deposit_code(&mut self, address: H160, code: Vec<u8>) -> Result<(), ExitError> {
		let cost = (code.len() as u64).saturating_mul(self.config.gas_code_deposit());
		if cost > self.state.metadata().gasometer().gas() {
			if self.config.is_activated_eip(2) {
				return Err(ExitError::OutOfGas);
			}
			return Err(ExitError::CodeStoreOutOfGas);
		}

		if let Some(limit) = self.config.create_contract_limit() {
			if code.len() > limit {
				return Err(ExitError::OutOfGas);
			}
		}

		if self.config.is_activated_eip(3541) && code.first() == Some(&eof::MAGIC[0]) {
			if !self.config.is_activated_eip(3540) {
				return Err(ExitError::InvalidBytecodeResult);
			}
			let container = eof::parse(&code)?;
			if self.config.is_activated_eip(3670) {
				let config = self.config;
				eof::validate_code(container.code, |opcode| config.is_opcode_defined(opcode))?;
			}
		}

		self.state
			.metadata_mut()
			.gasometer_mut()
			.record_deposit(code.len())?;
		self.state.set_code(address, code);

		Ok(())
	}

	/// Code the interpreter runs for `code`: the code section of a container
	/// once EOF is active, the bytes themselves otherwise.
	fn frame_code(&self, code: Vec<u8>) -> Result<Vec<u8>, ExitError> {
		if !self.config.is_activated_eip(3540) || code.first() != Some(&eof::MAGIC[0]) {
			return Ok(code);
		}
		if !eof::is_eof(&code) {
			return Err(ExitError::InvalidBytecodeResult);
		}

		let container = eof::parse(&code)?;
		Ok(container.code.to_vec())
	}

	fn run_interpreter(
		&mut self,
		code: Vec<u8>,
		data: Vec<u8>,
		context: Context,
	) -> (ExitReason, Vec<u8>) {
		let code = match self.frame_code(code) {
			Ok(code) => code,
			Err(e) => return (e.into(), Vec::new()),
		};

		let mut runtime = Runtime::new(Rc::new(code), Rc::new(data), context, self.config);
		let reason = runtime.run(self);
		(reason, runtime.machine().return_value())
	}

	/// Get used gas for the current executor, given the price.
	pub fn used_gas(&self) -> u64 {
		let gasometer = self.state.metadata().gasometer();
		gasometer.total_used_gas() - self.refund()
	}

	/// Refund granted at the end of the transaction, capped by the refund
	/// quotient of the active hardfork.
	pub fn refund(&self) -> u64 {
		let gasometer = self.state.metadata().gasometer();
		let refunded = u64::try_from(gasometer.refunded_gas()).unwrap_or(0);
		min(
			gasometer.total_used_gas() / self.config.max_refund_quotient(),
			refunded,
		)
	}

	/// Get fee needed for the current executor, given the price.
	pub fn fee(&self, price: U256) -> U256 {
		let used_gas = self.used_gas();
		U256::from(used_gas).saturating_mul(price)
	}

	/// Get account nonce.
	pub fn nonce(&self, address: H160) -> U256 {
		self.state.basic(address).nonce
	}

	/// Get the create address from given scheme.
	pub fn create_address(&self, scheme: CreateScheme) -> H160 {
		match scheme {
			CreateScheme::Create2 {
				caller,
				code_hash,
				salt,
			} => create2_address(caller, salt, code_hash),
			CreateScheme::Legacy { caller } => legacy_address(caller, self.nonce(caller)),
		}
	}

	/// Address a create message deploys to. A nested create already bumped
	/// the creator's nonce, so the address derives from the previous one.
	fn message_create_address(&self, message: &Message) -> H160 {
		let init_code = message.code.as_ref().unwrap_or(&message.data);
		match message.salt {
			Some(salt) => {
				let code_hash = H256::from_slice(Keccak256::digest(init_code).as_slice());
				create2_address(message.caller, salt, code_hash)
			}
			None => {
				let nonce = self.nonce(message.caller);
				let nonce = if message.depth > 0 {
					nonce.saturating_sub(U256::one())
				} else {
					nonce
				};
				legacy_address(message.caller, nonce)
			}
		}
	}

	pub fn initialize_with_access_list(&mut self, access_list: Vec<(H160, Vec<H256>)>) {
		let addresses = access_list.iter().map(|a| a.0);
		self.state.metadata_mut().access_addresses(addresses);

		let storage_keys = access_list
			.into_iter()
			.flat_map(|(address, keys)| keys.into_iter().map(move |key| (address, key)));
		self.state.metadata_mut().access_storages(storage_keys);
	}

	fn frame_depth(&self) -> usize {
		self.state.metadata().depth().unwrap_or(0)
	}
}

fn create2_address(caller: H160, salt: H256, code_hash: H256) -> H160 {
	let mut hasher = Keccak256::new();
	hasher.update([0xff]);
	hasher.update(&caller[..]);
	hasher.update(&salt[..]);
	hasher.update(&code_hash[..]);
	H256::from_slice(hasher.finalize().as_slice()).into()
}

fn legacy_address(caller: H160, nonce: U256) -> H160 {
	let mut stream = rlp::RlpStream::new_list(2);
	stream.append(&caller);
	stream.append(&nonce);
	H256::from_slice(Keccak256::digest(stream.out()).as_slice()).into()
}

impl<'config, 'precompiles, S: StackState<'config>, P: PrecompileSet> Handler
	for StackExecutor<'config, 'precompiles, S, P>
{
	fn balance(&self, address: H160) -> U256 {
		self.state.basic(address).balance
	}

	fn code_size(&self, address: H160) -> U256 {
		self.state.code_size(address)
	}

	fn code_hash(&self, address: H160) -> H256 {
		if !self.exists(address) {
			return H256::default();
		}

		self.state.code_hash(address)
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state.code(address)
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state.storage(address, index)
	}

	fn original_storage(&self, address: H160, index: H256) -> H256 {
		self.state
			.original_storage(address, index)
			.unwrap_or_default()
	}

	fn transient_storage(&self, address: H160, index: H256) -> H256 {
		self.state.transient_storage(address, index)
	}

	fn nonce(&self, address: H160) -> U256 {
		self.state.basic(address).nonce
	}

	fn gas_left(&self) -> U256 {
		U256::from(self.state.metadata().gasometer().gas())
	}

	fn gas_price(&self) -> U256 {
		self.state.gas_price()
	}
	fn origin(&self) -> H160 {
		self.state.origin()
	}
	fn block_hash(&self, number: U256) -> H256 {
		self.state.block_hash(number)
	}
	fn block_number(&self) -> U256 {
		self.state.block_number()
	}
	fn block_coinbase(&self) -> H160 {
		if self.config.is_proof_of_authority() {
			if let Some(signer) = self.state.block_signer() {
				return signer;
			}
		}
		self.state.block_coinbase()
	}
	fn block_timestamp(&self) -> U256 {
		self.state.block_timestamp()
	}
	fn block_difficulty(&self) -> U256 {
		self.state.block_difficulty()
	}
	fn block_randomness(&self) -> H256 {
		self.state.block_randomness().unwrap_or_else(|| {
			let mut randomness = H256::default();
			self.state
				.block_difficulty()
				.to_big_endian(randomness.as_bytes_mut());
			randomness
		})
	}
	fn block_gas_limit(&self) -> U256 {
		self.state.block_gas_limit()
	}
	fn block_base_fee_per_gas(&self) -> U256 {
		self.state.block_base_fee_per_gas()
	}
	fn chain_id(&self) -> U256 {
		self.state.chain_id()
	}
	fn blob_hash(&self, index: U256) -> H256 {
		if index > U256::from(u32::MAX) {
			return H256::default();
		}
		self.state.blob_hash(index.as_usize()).unwrap_or_default()
	}
	fn blob_base_fee(&self) -> U256 {
		self.state.blob_base_fee()
	}

	fn exists(&self, address: H160) -> bool {
		if self.config.empty_considered_exists() {
			self.state.exists(address)
		} else {
			self.state.exists(address) && !self.state.is_empty(address)
		}
	}

	fn deleted(&self, address: H160) -> bool {
		self.state.deleted(address)
	}

	fn is_cold(&self, address: H160, maybe_index: Option<H256>) -> bool {
		match maybe_index {
			None => !self.precompile_set.is_precompile(address) && self.state.is_cold(address),
			Some(index) => self.state.is_storage_cold(address, index),
		}
	}

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError> {
		self.state.set_storage(address, index, value);
		Ok(())
	}

	fn set_transient_storage(
		&mut self,
		address: H160,
		index: H256,
		value: H256,
	) -> Result<(), ExitError> {
		self.state.set_transient_storage(address, index, value);
		Ok(())
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		self.state.log(address, topics, data);
		Ok(())
	}

	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError> {
		let balance = self.balance(address);

		event!(Suicide {
			target,
			address,
			balance,
		});

		if self.config.is_activated_eip(6780) && !self.state.created(address) {
			if address != target {
				self.state.transfer(Transfer {
					source: address,
					target,
					value: balance,
				})?;
			}
		} else {
			self.state.transfer(Transfer {
				source: address,
				target,
				value: balance,
			})?;
			self.state.reset_balance(address);
			self.state.set_deleted(address, target);
		}

		Ok(())
	}

	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>) {
		let depth = self.frame_depth();
		if depth >= self.config.call_stack_limit {
			return (ExitError::CallTooDeep.into(), None, Vec::new());
		}

		if self.balance(caller) < value {
			return (ExitError::InsufficientBalance.into(), None, Vec::new());
		}

		if let Err(e) = self.state.inc_nonce(caller) {
			return (e.into(), None, Vec::new());
		}

		let after_gas = if self.config.call_l64_after_gas() {
			l64(self.state.metadata().gasometer().gas())
		} else {
			self.state.metadata().gasometer().gas()
		};
		let gas_limit = min(after_gas, target_gas.unwrap_or(after_gas));
		if let Err(e) = self
			.state
			.metadata_mut()
			.gasometer_mut()
			.record_cost(gas_limit)
		{
			return (e.into(), None, Vec::new());
		}

		let salt = match scheme {
			CreateScheme::Create2 { salt, .. } => Some(salt),
			CreateScheme::Legacy { .. } => None,
		};
		let message = Message {
			caller,
			to: None,
			code_address: None,
			value,
			gas_limit,
			data: init_code,
			code: None,
			depth: depth + 1,
			is_static: false,
			delegatecall: false,
			authcall_origin: None,
			salt,
		};

		let result = self.execute_message(message);
		match result.reason {
			// The parent sees a deployment with empty code.
			ExitReason::Error(ExitError::CodeStoreOutOfGas) => (
				ExitSucceed::Returned.into(),
				result.created_address,
				Vec::new(),
			),
			reason => (reason, result.created_address, result.return_value),
		}
	}

	fn call(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		scheme: CallScheme,
		context: Context,
	) -> (ExitReason, Vec<u8>) {
		let depth = self.frame_depth();
		if depth >= self.config.call_stack_limit {
			return (ExitError::CallTooDeep.into(), Vec::new());
		}

		if let Some(transfer) = &transfer {
			if self.balance(transfer.source) < transfer.value {
				return (ExitError::InsufficientBalance.into(), Vec::new());
			}
		}

		// AUTHCALL asks for all the available gas with a zero.
		let target_gas = match (scheme, target_gas) {
			(CallScheme::AuthCall, Some(0)) => None,
			(_, target_gas) => target_gas,
		};
		let after_gas = if self.config.call_l64_after_gas() {
			l64(self.state.metadata().gasometer().gas())
		} else {
			self.state.metadata().gasometer().gas()
		};
		let mut gas_limit = min(target_gas.unwrap_or(after_gas), after_gas);
		if let Err(e) = self
			.state
			.metadata_mut()
			.gasometer_mut()
			.record_cost(gas_limit)
		{
			return (e.into(), Vec::new());
		}

		if let Some(transfer) = &transfer {
			if transfer.value != U256::zero() && scheme != CallScheme::AuthCall {
				gas_limit = gas_limit.saturating_add(self.config.call_stipend);
			}
		}

		let message = Message {
			caller: context.caller,
			to: Some(context.address),
			code_address: Some(code_address),
			value: context.apparent_value,
			gas_limit,
			data: input,
			code: None,
			depth: depth + 1,
			is_static: scheme == CallScheme::StaticCall || self.state.metadata().is_static(),
			delegatecall: scheme == CallScheme::DelegateCall,
			authcall_origin: match (scheme, &transfer) {
				(CallScheme::AuthCall, Some(transfer)) => Some(transfer.source),
				_ => None,
			},
			salt: None,
		};

		let result = self.execute_message(message);
		(result.reason, result.return_value)
	}

	#[inline]
	fn pre_validate(
		&mut self,
		context: &Context,
		opcode: Opcode,
		stack: &Stack,
	) -> Result<(), ExitError> {
		match gasometer::static_opcode_cost(opcode, self.config)? {
			OpcodeCost::Fixed(cost) => self
				.state
				.metadata_mut()
				.gasometer_mut()
				.record_cost(cost),
			OpcodeCost::Dynamic => {
				let is_static = self.state.metadata().is_static();
				let (gas_cost, target, memory_cost) = gasometer::dynamic_opcode_cost(
					context.address,
					opcode,
					stack,
					is_static,
					self.config,
					self,
				)?;

				self.state
					.metadata_mut()
					.gasometer_mut()
					.record_dynamic_cost(gas_cost, memory_cost)?;

				match target {
					StorageTarget::Address(address) => {
						self.state.metadata_mut().access_address(address)
					}
					StorageTarget::Slot(address, key) => {
						self.state.metadata_mut().access_storage(address, key)
					}
					StorageTarget::None => (),
				}

				Ok(())
			}
		}
	}
}

struct StackExecutorHandle<'inner, 'config, 'precompiles, S, P> {
	executor: &'inner mut StackExecutor<'config, 'precompiles, S, P>,
	code_address: H160,
	input: &'inner [u8],
	gas_limit: Option<u64>,
	context: &'inner Context,
	is_static: bool,
}

impl<'inner, 'config, 'precompiles, S: StackState<'config>, P: PrecompileSet> PrecompileHandle
	for StackExecutorHandle<'inner, 'config, 'precompiles, S, P>
{
	fn record_cost(&mut self, cost: u64) -> Result<(), ExitError> {
		self.executor
			.state
			.metadata_mut()
			.gasometer_mut()
			.record_cost(cost)
	}

	fn remaining_gas(&self) -> u64 {
		self.executor.state.metadata().gasometer().gas()
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError> {
		Handler::log(self.executor, address, topics, data)
	}

	fn code_address(&self) -> H160 {
		self.code_address
	}

	fn input(&self) -> &[u8] {
		self.input
	}

	fn context(&self) -> &Context {
		self.context
	}

	fn is_static(&self) -> bool {
		self.is_static
	}

	fn gas_limit(&self) -> Option<u64> {
		self.gas_limit
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::{MemoryAccount, MemoryBackend, MemoryVicinity};
	use crate::executor::stack::MemoryStackState;

	#[test]
	fn exit_without_a_matching_enter_is_fatal() {
		let config = Config::cancun();
		let vicinity = MemoryVicinity::default();
		let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let state = MemoryStackState::new(StackSubstateMetadata::new(1_000_000, &config), &backend);
		let mut executor = StackExecutor::new_with_precompiles(state, &config, &());

		let result = executor.exit_frame(ExitSucceed::Returned.into(), alloc::vec![1, 2, 3], None);
		assert!(result.reason.is_fatal());
		assert!(result.return_value.is_empty());
		assert_eq!(result.gas_refund, 0);
		assert!(result.logs.is_empty());
	}

	#[test]
	fn create_addresses_follow_the_schemes() {
		let config = Config::cancun();
		let vicinity = MemoryVicinity::default();
		let caller = H160::from_low_u64_be(0xdead);
		let mut accounts = BTreeMap::new();
		accounts.insert(
			caller,
			MemoryAccount {
				nonce: U256::from(1),
				..Default::default()
			},
		);
		let backend = MemoryBackend::new(&vicinity, accounts);
		let state = MemoryStackState::new(StackSubstateMetadata::new(1_000_000, &config), &backend);
		let executor = StackExecutor::new_with_precompiles(state, &config, &());

		assert_eq!(
			executor.create_address(CreateScheme::Legacy { caller }),
			legacy_address(caller, U256::from(1))
		);

		let nested = Message {
			depth: 1,
			..Message::create(caller, U256::zero(), Vec::new(), 100)
		};
		assert_eq!(
			executor.message_create_address(&nested),
			legacy_address(caller, U256::zero())
		);

		let code_hash = H256::from_slice(Keccak256::digest([0u8; 0]).as_slice());
		let salt = H256::from_low_u64_be(7);
		assert_eq!(
			executor.create_address(CreateScheme::Create2 {
				caller,
				code_hash,
				salt
			}),
			executor.message_create_address(&Message::create2(
				caller,
				U256::zero(),
				Vec::new(),
				salt,
				100
			))
		);
	}

	#[test]
	fn eip_1014_example_address() {
		// Example 0 of EIP-1014.
		let address = create2_address(
			H160::zero(),
			H256::zero(),
			H256::from_slice(Keccak256::digest([0u8]).as_slice()),
		);
		assert_eq!(
			address,
			H160::from_slice(&hex::decode("4d1a2e2bb4f88f0250f26ffff098b0b30b26bf38").unwrap())
		);
	}

	#[test]
	fn precompiles_are_always_warm() {
		let config = Config::berlin();
		let vicinity = MemoryVicinity::default();
		let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let state = MemoryStackState::new(StackSubstateMetadata::new(1_000_000, &config), &backend);
		let mut precompiles = BTreeMap::<H160, crate::executor::stack::PrecompileFn>::new();
		precompiles.insert(H160::from_low_u64_be(4), |input, _, _, _| {
			Ok((
				PrecompileOutput {
					exit_status: ExitSucceed::Returned,
					output: input.to_vec(),
				},
				15,
			))
		});
		let executor = StackExecutor::new_with_precompiles(state, &config, &precompiles);

		assert!(!Handler::is_cold(&executor, H160::from_low_u64_be(4), None));
		assert!(Handler::is_cold(&executor, H160::from_low_u64_be(5), None));
	}
}

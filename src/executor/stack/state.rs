use crate::backend::{Apply, Backend, Basic, Log};
use crate::executor::stack::executor::{Accessed, StackState, StackSubstateMetadata};
use crate::{ExitError, Transfer};
use alloc::{
	borrow::Cow,
	boxed::Box,
	collections::{BTreeMap, BTreeSet},
	vec::Vec,
};
use core::mem;
use primitive_types::{H160, H256, U256};

#[derive(Clone, Debug)]
struct MemoryStackAccount {
	pub basic: Basic,
	pub code: Option<Vec<u8>>,
	pub reset: bool,
}

/// One checkpoint of the world state. Every frame pushes one on entry and
/// folds it into its parent, or drops it, on exit.
#[derive(Clone, Debug)]
pub struct MemoryStackSubstate<'config> {
	metadata: StackSubstateMetadata<'config>,
	parent: Option<Box<MemoryStackSubstate<'config>>>,
	logs: Vec<Log>,
	accounts: BTreeMap<H160, MemoryStackAccount>,
	storages: BTreeMap<(H160, H256), H256>,
	transient_storage: BTreeMap<(H160, H256), H256>,
	deletes: BTreeMap<H160, H160>,
	creates: BTreeSet<H160>,
}

fn root_substate_error() -> ExitError {
	ExitError::Other(Cow::Borrowed("cannot exit the root substate"))
}

impl<'config> MemoryStackSubstate<'config> {
	pub fn new(metadata: StackSubstateMetadata<'config>) -> Self {
		Self {
			metadata,
			parent: None,
			logs: Vec::new(),
			accounts: BTreeMap::new(),
			storages: BTreeMap::new(),
			transient_storage: BTreeMap::new(),
			deletes: BTreeMap::new(),
			creates: BTreeSet::new(),
		}
	}

	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	pub fn metadata(&self) -> &StackSubstateMetadata<'config> {
		&self.metadata
	}

	pub fn metadata_mut(&mut self) -> &mut StackSubstateMetadata<'config> {
		&mut self.metadata
	}

	/// Accounts marked for deletion by this checkpoint and the children it
	/// committed, with their beneficiaries.
	pub fn deletes(&self) -> &BTreeMap<H160, H160> {
		&self.deletes
	}

	/// Flatten the root checkpoint into backend operations.
	///
	/// Returns an error when called on a nested checkpoint.
	#[allow(clippy::type_complexity)]
	pub fn deconstruct<B: Backend>(
		mut self,
		backend: &B,
	) -> Result<(Vec<Apply<BTreeMap<H256, H256>>>, Vec<Log>), ExitError> {
		if self.parent.is_some() {
			return Err(ExitError::Other(Cow::Borrowed(
				"cannot deconstruct a nested substate",
			)));
		}

		let mut applies = Vec::<Apply<BTreeMap<H256, H256>>>::new();

		let addresses: BTreeSet<H160> = self
			.accounts
			.keys()
			.copied()
			.chain(self.storages.keys().map(|(address, _)| *address))
			.collect();

		for address in addresses {
			if self.deletes.contains_key(&address) {
				continue;
			}

			let mut storage = BTreeMap::new();
			for ((oa, ok), ov) in &self.storages {
				if *oa == address {
					storage.insert(*ok, *ov);
				}
			}

			let apply = {
				let account = self.account_mut(address, backend);

				Apply::Modify {
					address,
					basic: account.basic.clone(),
					code: account.code.clone(),
					storage,
					reset_storage: account.reset,
				}
			};

			applies.push(apply);
		}

		for address in self.deletes.keys() {
			applies.push(Apply::Delete { address: *address });
		}

		Ok((applies, self.logs))
	}

	pub fn enter(&mut self, gas_limit: u64, is_static: bool) {
		let mut entering = Self {
			metadata: self.metadata.spit_child(gas_limit, is_static),
			parent: None,
			logs: Vec::new(),
			accounts: BTreeMap::new(),
			storages: BTreeMap::new(),
			transient_storage: BTreeMap::new(),
			deletes: BTreeMap::new(),
			creates: BTreeSet::new(),
		};
		mem::swap(&mut entering, self);

		self.parent = Some(Box::new(entering));
	}

	fn pop(&mut self) -> Result<Self, ExitError> {
		let mut exited = *self.parent.take().ok_or_else(root_substate_error)?;
		mem::swap(&mut exited, self);
		Ok(exited)
	}

	pub fn exit_commit(&mut self) -> Result<(), ExitError> {
		let mut exited = self.pop()?;

		self.metadata.swallow_commit(exited.metadata)?;
		self.logs.append(&mut exited.logs);

		let mut resets = BTreeSet::new();
		for (address, account) in &exited.accounts {
			if account.reset {
				resets.insert(*address);
			}
		}
		let mut reset_keys = BTreeSet::new();
		for (address, key) in self.storages.keys() {
			if resets.contains(address) {
				reset_keys.insert((*address, *key));
			}
		}
		for (address, key) in reset_keys {
			self.storages.remove(&(address, key));
		}

		for (address, mut account) in exited.accounts {
			if let Some(existing) = self.accounts.get(&address) {
				account.reset |= existing.reset;
			}
			self.accounts.insert(address, account);
		}
		self.storages.append(&mut exited.storages);
		self.transient_storage
			.append(&mut exited.transient_storage);
		for (address, target) in exited.deletes {
			self.deletes.entry(address).or_insert(target);
		}
		self.creates.append(&mut exited.creates);

		Ok(())
	}

	pub fn exit_revert(&mut self) -> Result<(), ExitError> {
		let exited = self.pop()?;
		self.metadata.swallow_revert(exited.metadata)
	}

	pub fn exit_discard(&mut self) -> Result<(), ExitError> {
		let exited = self.pop()?;
		self.metadata.swallow_discard(exited.metadata)
	}

	fn known_account(&self, address: H160) -> Option<&MemoryStackAccount> {
		if let Some(account) = self.accounts.get(&address) {
			Some(account)
		} else if let Some(parent) = self.parent.as_ref() {
			parent.known_account(address)
		} else {
			None
		}
	}

	pub fn known_basic(&self, address: H160) -> Option<Basic> {
		self.known_account(address).map(|acc| acc.basic.clone())
	}

	pub fn known_code(&self, address: H160) -> Option<Vec<u8>> {
		self.known_account(address).and_then(|acc| acc.code.clone())
	}

	pub fn known_empty(&self, address: H160) -> Option<bool> {
		if let Some(account) = self.known_account(address) {
			if account.basic.balance != U256::zero() {
				return Some(false);
			}

			if account.basic.nonce != U256::zero() {
				return Some(false);
			}

			if let Some(code) = &account.code {
				return Some(code.is_empty());
			}
		}

		None
	}

	pub fn known_storage(&self, address: H160, key: H256) -> Option<H256> {
		if let Some(value) = self.storages.get(&(address, key)) {
			return Some(*value);
		}

		if let Some(account) = self.accounts.get(&address) {
			if account.reset {
				return Some(H256::default());
			}
		}

		if let Some(parent) = self.parent.as_ref() {
			return parent.known_storage(address, key);
		}

		None
	}

	pub fn known_original_storage(&self, address: H160) -> Option<H256> {
		if let Some(account) = self.accounts.get(&address) {
			if account.reset {
				return Some(H256::default());
			}
		}

		if let Some(parent) = self.parent.as_ref() {
			return parent.known_original_storage(address);
		}

		None
	}

	pub fn known_transient_storage(&self, address: H160, key: H256) -> Option<H256> {
		if let Some(value) = self.transient_storage.get(&(address, key)) {
			return Some(*value);
		}

		if let Some(parent) = self.parent.as_ref() {
			return parent.known_transient_storage(address, key);
		}

		None
	}

	pub fn is_cold(&self, address: H160) -> bool {
		self.recursive_is_cold(&|a| a.accessed_addresses.contains(&address))
	}

	pub fn is_storage_cold(&self, address: H160, key: H256) -> bool {
		self.recursive_is_cold(&|a| a.accessed_storage.contains(&(address, key)))
	}

	fn recursive_is_cold<F: Fn(&Accessed) -> bool>(&self, f: &F) -> bool {
		let local_is_accessed = self.metadata.accessed().as_ref().map(f).unwrap_or(false);
		if local_is_accessed {
			false
		} else {
			self.parent
				.as_ref()
				.map(|p| p.recursive_is_cold(f))
				.unwrap_or_else(|| self.metadata.accessed().is_some())
		}
	}

	pub fn deleted(&self, address: H160) -> bool {
		if self.deletes.contains_key(&address) {
			return true;
		}

		if let Some(parent) = self.parent.as_ref() {
			return parent.deleted(address);
		}

		false
	}

	pub fn created(&self, address: H160) -> bool {
		if self.creates.contains(&address) {
			return true;
		}

		if let Some(parent) = self.parent.as_ref() {
			return parent.created(address);
		}

		false
	}

	fn account_mut<B: Backend>(&mut self, address: H160, backend: &B) -> &mut MemoryStackAccount {
		if !self.accounts.contains_key(&address) {
			let account = self
				.known_account(address)
				.cloned()
				.map(|mut v| {
					v.reset = false;
					v
				})
				.unwrap_or_else(|| MemoryStackAccount {
					basic: backend.basic(address),
					code: None,
					reset: false,
				});
			self.accounts.insert(address, account);
		}

		self.accounts
			.entry(address)
			.or_insert_with(|| MemoryStackAccount {
				basic: backend.basic(address),
				code: None,
				reset: false,
			})
	}

	pub fn inc_nonce<B: Backend>(&mut self, address: H160, backend: &B) -> Result<(), ExitError> {
		let nonce = &mut self.account_mut(address, backend).basic.nonce;
		if *nonce >= U256::from(u64::MAX) {
			return Err(ExitError::NonceOverflow);
		}
		*nonce += U256::one();
		Ok(())
	}

	pub fn set_storage(&mut self, address: H160, key: H256, value: H256) {
		self.storages.insert((address, key), value);
	}

	pub fn set_transient_storage(&mut self, address: H160, key: H256, value: H256) {
		self.transient_storage.insert((address, key), value);
	}

	pub fn reset_storage<B: Backend>(&mut self, address: H160, backend: &B) {
		let mut removing = Vec::new();

		for (oa, ok) in self.storages.keys() {
			if *oa == address {
				removing.push(*ok);
			}
		}

		for ok in removing {
			self.storages.remove(&(address, ok));
		}

		self.account_mut(address, backend).reset = true;
	}

	pub fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) {
		self.logs.push(Log {
			address,
			topics,
			data,
		});
	}

	/// Mark `address` for deletion. The first beneficiary is the one kept.
	pub fn set_deleted(&mut self, address: H160, target: H160) {
		if !self.deleted(address) {
			self.deletes.insert(address, target);
		}
	}

	pub fn set_created(&mut self, address: H160) {
		self.creates.insert(address);
	}

	pub fn set_code<B: Backend>(&mut self, address: H160, code: Vec<u8>, backend: &B) {
		self.account_mut(address, backend).code = Some(code);
	}

	pub fn transfer<B: Backend>(
		&mut self,
		transfer: Transfer,
		backend: &B,
	) -> Result<(), ExitError> {
		if transfer.source == transfer.target {
			let source = self.account_mut(transfer.source, backend);
			if source.basic.balance < transfer.value {
				return Err(ExitError::InsufficientBalance);
			}
			return Ok(());
		}

		let target_balance = self.account_mut(transfer.target, backend).basic.balance;
		let credited = target_balance
			.checked_add(transfer.value)
			.ok_or(ExitError::ValueOverflow)?;

		{
			let source = self.account_mut(transfer.source, backend);
			if source.basic.balance < transfer.value {
				return Err(ExitError::InsufficientBalance);
			}
			source.basic.balance -= transfer.value;
		}

		self.account_mut(transfer.target, backend).basic.balance = credited;

		Ok(())
	}

	pub fn reset_balance<B: Backend>(&mut self, address: H160, backend: &B) {
		self.account_mut(address, backend).basic.balance = U256::zero();
	}

	pub fn touch<B: Backend>(&mut self, address: H160, backend: &B) {
		self.account_mut(address, backend);
	}
}

/// World state of one transaction: the backend under a stack of
/// checkpoints.
#[derive(Clone, Debug)]
pub struct MemoryStackState<'backend, 'config, B> {
	backend: &'backend B,
	substate: MemoryStackSubstate<'config>,
}

impl<'backend, 'config, B: Backend> Backend for MemoryStackState<'backend, 'config, B> {
	fn gas_price(&self) -> U256 {
		self.backend.gas_price()
	}
	fn origin(&self) -> H160 {
		self.backend.origin()
	}
	fn block_hash(&self, number: U256) -> H256 {
		self.backend.block_hash(number)
	}
	fn block_number(&self) -> U256 {
		self.backend.block_number()
	}
	fn block_coinbase(&self) -> H160 {
		self.backend.block_coinbase()
	}
	fn block_signer(&self) -> Option<H160> {
		self.backend.block_signer()
	}
	fn block_timestamp(&self) -> U256 {
		self.backend.block_timestamp()
	}
	fn block_difficulty(&self) -> U256 {
		self.backend.block_difficulty()
	}
	fn block_randomness(&self) -> Option<H256> {
		self.backend.block_randomness()
	}
	fn block_gas_limit(&self) -> U256 {
		self.backend.block_gas_limit()
	}
	fn block_base_fee_per_gas(&self) -> U256 {
		self.backend.block_base_fee_per_gas()
	}
	fn chain_id(&self) -> U256 {
		self.backend.chain_id()
	}
	fn blob_hash(&self, index: usize) -> Option<H256> {
		self.backend.blob_hash(index)
	}
	fn blob_base_fee(&self) -> U256 {
		self.backend.blob_base_fee()
	}

	fn exists(&self, address: H160) -> bool {
		self.substate.known_account(address).is_some() || self.backend.exists(address)
	}

	fn basic(&self, address: H160) -> Basic {
		self.substate
			.known_basic(address)
			.unwrap_or_else(|| self.backend.basic(address))
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.substate
			.known_code(address)
			.unwrap_or_else(|| self.backend.code(address))
	}

	fn storage(&self, address: H160, key: H256) -> H256 {
		self.substate
			.known_storage(address, key)
			.unwrap_or_else(|| self.backend.storage(address, key))
	}

	fn original_storage(&self, address: H160, key: H256) -> Option<H256> {
		if let Some(value) = self.substate.known_original_storage(address) {
			return Some(value);
		}

		self.backend.original_storage(address, key)
	}
}

impl<'backend, 'config, B: Backend> StackState<'config> for MemoryStackState<'backend, 'config, B> {
	fn metadata(&self) -> &StackSubstateMetadata<'config> {
		self.substate.metadata()
	}

	fn metadata_mut(&mut self) -> &mut StackSubstateMetadata<'config> {
		self.substate.metadata_mut()
	}

	fn enter(&mut self, gas_limit: u64, is_static: bool) {
		self.substate.enter(gas_limit, is_static)
	}

	fn exit_commit(&mut self) -> Result<(), ExitError> {
		self.substate.exit_commit()
	}

	fn exit_revert(&mut self) -> Result<(), ExitError> {
		self.substate.exit_revert()
	}

	fn exit_discard(&mut self) -> Result<(), ExitError> {
		self.substate.exit_discard()
	}

	fn is_empty(&self, address: H160) -> bool {
		if let Some(known_empty) = self.substate.known_empty(address) {
			return known_empty;
		}

		self.backend.basic(address).balance == U256::zero()
			&& self.backend.basic(address).nonce == U256::zero()
			&& self.backend.code(address).is_empty()
	}

	fn deleted(&self, address: H160) -> bool {
		self.substate.deleted(address)
	}

	fn created(&self, address: H160) -> bool {
		self.substate.created(address)
	}

	fn is_cold(&self, address: H160) -> bool {
		self.substate.is_cold(address)
	}

	fn is_storage_cold(&self, address: H160, key: H256) -> bool {
		self.substate.is_storage_cold(address, key)
	}

	fn transient_storage(&self, address: H160, key: H256) -> H256 {
		self.substate
			.known_transient_storage(address, key)
			.unwrap_or_default()
	}

	fn logs(&self) -> &[Log] {
		self.substate.logs()
	}

	fn deletes(&self) -> &BTreeMap<H160, H160> {
		self.substate.deletes()
	}

	fn inc_nonce(&mut self, address: H160) -> Result<(), ExitError> {
		self.substate.inc_nonce(address, self.backend)
	}

	fn set_storage(&mut self, address: H160, key: H256, value: H256) {
		self.substate.set_storage(address, key, value)
	}

	fn set_transient_storage(&mut self, address: H160, key: H256, value: H256) {
		self.substate.set_transient_storage(address, key, value)
	}

	fn reset_storage(&mut self, address: H160) {
		self.substate.reset_storage(address, self.backend);
	}

	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) {
		self.substate.log(address, topics, data);
	}

	fn set_deleted(&mut self, address: H160, target: H160) {
		self.substate.set_deleted(address, target)
	}

	fn set_created(&mut self, address: H160) {
		self.substate.set_created(address)
	}

	fn set_code(&mut self, address: H160, code: Vec<u8>) {
		self.substate.set_code(address, code, self.backend)
	}

	fn transfer(&mut self, transfer: Transfer) -> Result<(), ExitError> {
		self.substate.transfer(transfer, self.backend)
	}

	fn reset_balance(&mut self, address: H160) {
		self.substate.reset_balance(address, self.backend)
	}

	fn touch(&mut self, address: H160) {
		self.substate.touch(address, self.backend)
	}
}

impl<'backend, 'config, B: Backend> MemoryStackState<'backend, 'config, B> {
	pub fn new(metadata: StackSubstateMetadata<'config>, backend: &'backend B) -> Self {
		Self {
			backend,
			substate: MemoryStackSubstate::new(metadata),
		}
	}

	#[allow(clippy::type_complexity)]
	pub fn deconstruct(self) -> Result<(Vec<Apply<BTreeMap<H256, H256>>>, Vec<Log>), ExitError> {
		self.substate.deconstruct(self.backend)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::backend::{MemoryAccount, MemoryBackend, MemoryVicinity};
	use crate::Config;

	fn account(balance: u64) -> MemoryAccount {
		MemoryAccount {
			balance: U256::from(balance),
			..Default::default()
		}
	}

	#[test]
	fn inner_revert_keeps_outer_writes() {
		let config = Config::cancun();
		let vicinity = MemoryVicinity::default();
		let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let mut state =
			MemoryStackState::new(StackSubstateMetadata::new(100_000, &config), &backend);
		let address = H160::from_low_u64_be(0x10);
		let slot = H256::from_low_u64_be(1);

		state.enter(50_000, false);
		state.set_storage(address, slot, H256::from_low_u64_be(1));
		state.enter(10_000, false);
		state.set_storage(address, slot, H256::from_low_u64_be(2));
		state.log(address, Vec::new(), vec![1]);
		assert_eq!(state.storage(address, slot), H256::from_low_u64_be(2));
		state.exit_revert().unwrap();

		assert_eq!(state.storage(address, slot), H256::from_low_u64_be(1));
		assert!(state.logs().is_empty());
		state.exit_commit().unwrap();
		assert_eq!(state.storage(address, slot), H256::from_low_u64_be(1));
	}

	#[test]
	fn exiting_the_root_is_an_error() {
		let config = Config::cancun();
		let vicinity = MemoryVicinity::default();
		let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let mut state =
			MemoryStackState::new(StackSubstateMetadata::new(100_000, &config), &backend);

		assert!(state.exit_commit().is_err());
		assert!(state.exit_discard().is_err());
	}

	#[test]
	fn transfer_checks_both_sides() {
		let config = Config::cancun();
		let vicinity = MemoryVicinity::default();
		let rich = H160::from_low_u64_be(1);
		let full = H160::from_low_u64_be(2);
		let mut accounts = BTreeMap::new();
		accounts.insert(rich, account(10));
		accounts.insert(
			full,
			MemoryAccount {
				balance: U256::MAX,
				..Default::default()
			},
		);
		let backend = MemoryBackend::new(&vicinity, accounts);
		let mut state =
			MemoryStackState::new(StackSubstateMetadata::new(100_000, &config), &backend);

		let overdraw = Transfer {
			source: rich,
			target: H160::from_low_u64_be(3),
			value: U256::from(11),
		};
		assert_eq!(state.transfer(overdraw), Err(ExitError::InsufficientBalance));

		let overflow = Transfer {
			source: rich,
			target: full,
			value: U256::one(),
		};
		assert_eq!(state.transfer(overflow), Err(ExitError::ValueOverflow));
		assert_eq!(state.basic(rich).balance, U256::from(10));
	}

	#[test]
	fn first_beneficiary_wins() {
		let config = Config::london();
		let vicinity = MemoryVicinity::default();
		let backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let mut state =
			MemoryStackState::new(StackSubstateMetadata::new(100_000, &config), &backend);
		let address = H160::from_low_u64_be(1);

		state.enter(1000, false);
		state.set_deleted(address, H160::from_low_u64_be(2));
		state.exit_commit().unwrap();
		state.set_deleted(address, H160::from_low_u64_be(3));

		assert_eq!(state.deletes().get(&address), Some(&H160::from_low_u64_be(2)));
	}

	#[test]
	fn nonce_stops_at_the_maximum() {
		let config = Config::cancun();
		let vicinity = MemoryVicinity::default();
		let address = H160::from_low_u64_be(1);
		let mut accounts = BTreeMap::new();
		accounts.insert(
			address,
			MemoryAccount {
				nonce: U256::from(u64::MAX),
				..Default::default()
			},
		);
		let backend = MemoryBackend::new(&vicinity, accounts);
		let mut state =
			MemoryStackState::new(StackSubstateMetadata::new(100_000, &config), &backend);

		assert_eq!(state.inc_nonce(address), Err(ExitError::NonceOverflow));
	}
}

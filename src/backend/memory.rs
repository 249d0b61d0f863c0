use super::{Apply, ApplyBackend, Backend, Basic, Log};
use alloc::collections::BTreeMap;
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// Block and transaction environment served by a [`MemoryBackend`].
#[derive(Clone, Debug, Eq, PartialEq, Default)]
#[cfg_attr(
	feature = "with-codec",
	derive(codec::Encode, codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryVicinity {
	pub gas_price: U256,
	pub origin: H160,
	pub chain_id: U256,
	/// Hashes of the preceding blocks, the parent first.
	pub block_hashes: Vec<H256>,
	pub block_number: U256,
	pub block_coinbase: H160,
	/// Sealer of the block on proof-of-authority chains.
	pub block_signer: Option<H160>,
	pub block_timestamp: U256,
	pub block_difficulty: U256,
	/// `PREVRANDAO` after the Merge.
	pub block_randomness: Option<H256>,
	pub block_gas_limit: U256,
	pub block_base_fee_per_gas: U256,
	/// Versioned hashes of the transaction blobs.
	pub blob_hashes: Vec<H256>,
	pub blob_base_fee: U256,
}

/// One account of a [`MemoryBackend`].
#[derive(Default, Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(codec::Encode, codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MemoryAccount {
	pub nonce: U256,
	pub balance: U256,
	/// Non-zero slots only.
	pub storage: BTreeMap<H256, H256>,
	pub code: Vec<u8>,
}

impl MemoryAccount {
	/// EIP-161 emptiness: no code, zero nonce and zero balance.
	pub fn is_empty(&self) -> bool {
		self.nonce.is_zero() && self.balance.is_zero() && self.code.is_empty()
	}
}

/// World state held in a `BTreeMap`, with a borrowed block environment.
#[derive(Clone, Debug)]
pub struct MemoryBackend<'vicinity> {
	vicinity: &'vicinity MemoryVicinity,
	state: BTreeMap<H160, MemoryAccount>,
	logs: Vec<Log>,
}

impl<'vicinity> MemoryBackend<'vicinity> {
	pub fn new(vicinity: &'vicinity MemoryVicinity, state: BTreeMap<H160, MemoryAccount>) -> Self {
		Self {
			vicinity,
			state,
			logs: Vec::new(),
		}
	}

	pub fn state(&self) -> &BTreeMap<H160, MemoryAccount> {
		&self.state
	}

	pub fn state_mut(&mut self) -> &mut BTreeMap<H160, MemoryAccount> {
		&mut self.state
	}

	/// Logs applied so far, oldest first.
	pub fn logs(&self) -> &[Log] {
		&self.logs
	}

	fn modify<I>(
		&mut self,
		address: H160,
		basic: Basic,
		code: Option<Vec<u8>>,
		storage: I,
		reset_storage: bool,
		delete_empty: bool,
	) where
		I: IntoIterator<Item = (H256, H256)>,
	{
		let account = self.state.entry(address).or_default();
		account.balance = basic.balance;
		account.nonce = basic.nonce;
		if let Some(code) = code {
			account.code = code;
		}
		if reset_storage {
			account.storage.clear();
		}
		for (index, value) in storage {
			if value.is_zero() {
				account.storage.remove(&index);
			} else {
				account.storage.insert(index, value);
			}
		}

		if delete_empty && account.is_empty() {
			self.state.remove(&address);
		}
	}
}

impl<'vicinity> Backend for MemoryBackend<'vicinity> {
	fn gas_price(&self) -> U256 {
		self.vicinity.gas_price
	}
	fn origin(&self) -> H160 {
		self.vicinity.origin
	}

	/// Hash of one of the 256 blocks before the current one, zero otherwise.
	fn block_hash(&self, number: U256) -> H256 {
		let age = match self.vicinity.block_number.checked_sub(number) {
			Some(age) if !age.is_zero() && age <= U256::from(256) => age.as_usize(),
			_ => return H256::zero(),
		};
		self.vicinity
			.block_hashes
			.get(age - 1)
			.copied()
			.unwrap_or_default()
	}

	fn block_number(&self) -> U256 {
		self.vicinity.block_number
	}
	fn block_coinbase(&self) -> H160 {
		self.vicinity.block_coinbase
	}
	fn block_signer(&self) -> Option<H160> {
		self.vicinity.block_signer
	}
	fn block_timestamp(&self) -> U256 {
		self.vicinity.block_timestamp
	}
	fn block_difficulty(&self) -> U256 {
		self.vicinity.block_difficulty
	}
	fn block_randomness(&self) -> Option<H256> {
		self.vicinity.block_randomness
	}
	fn block_gas_limit(&self) -> U256 {
		self.vicinity.block_gas_limit
	}
	fn block_base_fee_per_gas(&self) -> U256 {
		self.vicinity.block_base_fee_per_gas
	}
	fn chain_id(&self) -> U256 {
		self.vicinity.chain_id
	}
	fn blob_hash(&self, index: usize) -> Option<H256> {
		self.vicinity.blob_hashes.get(index).copied()
	}
	fn blob_base_fee(&self) -> U256 {
		self.vicinity.blob_base_fee
	}

	fn exists(&self, address: H160) -> bool {
		self.state.contains_key(&address)
	}

	fn basic(&self, address: H160) -> Basic {
		self.state
			.get(&address)
			.map(|account| Basic {
				balance: account.balance,
				nonce: account.nonce,
			})
			.unwrap_or_default()
	}

	fn code(&self, address: H160) -> Vec<u8> {
		self.state
			.get(&address)
			.map(|account| account.code.clone())
			.unwrap_or_default()
	}

	fn storage(&self, address: H160, index: H256) -> H256 {
		self.state
			.get(&address)
			.and_then(|account| account.storage.get(&index).copied())
			.unwrap_or_default()
	}

	/// Nothing is written until `apply`, so the committed value is the
	/// current one.
	fn original_storage(&self, address: H160, index: H256) -> Option<H256> {
		Some(self.storage(address, index))
	}
}

impl<'vicinity> ApplyBackend for MemoryBackend<'vicinity> {
	fn apply<A, I, L>(&mut self, values: A, logs: L, delete_empty: bool)
	where
		A: IntoIterator<Item = Apply<I>>,
		I: IntoIterator<Item = (H256, H256)>,
		L: IntoIterator<Item = Log>,
	{
		for apply in values {
			match apply {
				Apply::Modify {
					address,
					basic,
					code,
					storage,
					reset_storage,
				} => self.modify(address, basic, code, storage, reset_storage, delete_empty),
				Apply::Delete { address } => {
					self.state.remove(&address);
				}
			}
		}

		self.logs.extend(logs);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn block_hash_covers_the_last_256_blocks() {
		let vicinity = MemoryVicinity {
			block_number: U256::from(300),
			block_hashes: (0..300u64).map(H256::from_low_u64_be).collect(),
			..Default::default()
		};
		let backend = MemoryBackend::new(&vicinity, BTreeMap::new());

		assert_eq!(backend.block_hash(U256::from(299)), H256::from_low_u64_be(0));
		assert_eq!(backend.block_hash(U256::from(44)), H256::from_low_u64_be(255));
		assert_eq!(backend.block_hash(U256::from(43)), H256::default());
		assert_eq!(backend.block_hash(U256::from(300)), H256::default());
	}

	#[test]
	fn empty_accounts_are_removed_on_request() {
		let vicinity = MemoryVicinity::default();
		let mut backend = MemoryBackend::new(&vicinity, BTreeMap::new());
		let empty = H160::from_low_u64_be(1);
		let funded = H160::from_low_u64_be(2);
		let modify = |address, balance: u64| Apply::Modify {
			address,
			basic: Basic {
				balance: U256::from(balance),
				nonce: U256::zero(),
			},
			code: None,
			storage: Vec::<(H256, H256)>::new(),
			reset_storage: false,
		};

		backend.apply(vec![modify(empty, 0), modify(funded, 1)], Vec::<Log>::new(), true);
		assert!(!backend.exists(empty));
		assert!(backend.exists(funded));

		backend.apply(vec![modify(empty, 0)], Vec::<Log>::new(), false);
		assert!(backend.exists(empty));
	}
}

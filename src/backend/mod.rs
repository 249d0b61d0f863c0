//! Persistent world state behind the executor, and the in-memory backend
//! used by tests and tools.

mod memory;

pub use self::memory::{MemoryAccount, MemoryBackend, MemoryVicinity};

use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// Balance and nonce of an account.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
#[cfg_attr(
	feature = "with-codec",
	derive(codec::Encode, codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Basic {
	pub balance: U256,
	pub nonce: U256,
}

/// A log emitted by a frame, kept only if every enclosing frame commits.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(codec::Encode, codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Log {
	/// Emitting address.
	pub address: H160,
	/// Topics, at most four.
	pub topics: Vec<H256>,
	/// Payload.
	pub data: Vec<u8>,
}

/// One account change produced by a finished transaction.
#[derive(Clone, Debug)]
pub enum Apply<I> {
	/// Create the account if missing, then overwrite what is given.
	Modify {
		address: H160,
		basic: Basic,
		/// `None` keeps the current code.
		code: Option<Vec<u8>>,
		/// Changed slots. A zero value clears the slot.
		storage: I,
		/// Clear all storage before writing `storage`.
		reset_storage: bool,
	},
	Delete { address: H160 },
}

/// Read side of the world state and the block environment. The executor
/// never writes through it; changes come back as [`Apply`] values.
#[auto_impl::auto_impl(&, &mut, Box)]
pub trait Backend {
	fn gas_price(&self) -> U256;
	fn origin(&self) -> H160;
	/// Zero for blocks outside the 256 most recent ones.
	fn block_hash(&self, number: U256) -> H256;
	fn block_number(&self) -> U256;
	fn block_coinbase(&self) -> H160;
	/// Sealer on proof-of-authority chains.
	fn block_signer(&self) -> Option<H160>;
	fn block_timestamp(&self) -> U256;
	fn block_difficulty(&self) -> U256;
	/// Beacon randomness, present after the Merge.
	fn block_randomness(&self) -> Option<H256>;
	fn block_gas_limit(&self) -> U256;
	fn block_base_fee_per_gas(&self) -> U256;
	fn chain_id(&self) -> U256;
	/// Versioned hash of the transaction blob at `index`.
	fn blob_hash(&self, index: usize) -> Option<H256>;
	fn blob_base_fee(&self) -> U256;

	fn exists(&self, address: H160) -> bool;
	/// Balance and nonce. Default for a missing account.
	fn basic(&self, address: H160) -> Basic;
	fn code(&self, address: H160) -> Vec<u8>;
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Slot value committed before the current transaction, when the
	/// backend tracks it.
	fn original_storage(&self, address: H160, index: H256) -> Option<H256>;
}

/// Backend that takes the changes of a finished transaction.
pub trait ApplyBackend {
	/// Write `values` and `logs`. With `delete_empty`, accounts left empty
	/// in the EIP-161 sense are removed.
	fn apply<A, I, L>(&mut self, values: A, logs: L, delete_empty: bool)
	where
		A: IntoIterator<Item = Apply<I>>,
		I: IntoIterator<Item = (H256, H256)>,
		L: IntoIterator<Item = Log>;
}

use crate::{CallScheme, Context, CreateScheme, ExitError, ExitReason, Opcode, Stack};
use alloc::vec::Vec;
use primitive_types::{H160, H256, U256};

/// Balance movement attached to a call.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Transfer {
	pub source: H160,
	pub target: H160,
	pub value: U256,
}

/// Everything outside the running frame. The interpreter reaches accounts,
/// the block environment and child frames only through this trait.
///
/// `call` and `create` run the child frame to completion before they
/// return, so a frame never observes another one half way.
#[auto_impl::auto_impl(&mut, Box)]
pub trait Handler {
	fn balance(&self, address: H160) -> U256;
	fn code_size(&self, address: H160) -> U256;
	/// Zero for a nonexistent account, the empty-code hash for an existing
	/// one without code.
	fn code_hash(&self, address: H160) -> H256;
	fn code(&self, address: H160) -> Vec<u8>;
	fn storage(&self, address: H160, index: H256) -> H256;
	/// Slot value at the start of the transaction.
	fn original_storage(&self, address: H160, index: H256) -> H256;
	fn transient_storage(&self, address: H160, index: H256) -> H256;
	fn nonce(&self, address: H160) -> U256;

	/// Gas left in the current frame.
	fn gas_left(&self) -> U256;
	fn gas_price(&self) -> U256;
	fn origin(&self) -> H160;
	/// Zero outside the 256 most recent blocks.
	fn block_hash(&self, number: U256) -> H256;
	fn block_number(&self) -> U256;
	fn block_coinbase(&self) -> H160;
	fn block_timestamp(&self) -> U256;
	fn block_difficulty(&self) -> U256;
	/// `PREVRANDAO`.
	fn block_randomness(&self) -> H256;
	fn block_gas_limit(&self) -> U256;
	fn block_base_fee_per_gas(&self) -> U256;
	fn chain_id(&self) -> U256;
	/// Zero when `index` is out of range.
	fn blob_hash(&self, index: U256) -> H256;
	fn blob_base_fee(&self) -> U256;

	fn exists(&self, address: H160) -> bool;
	/// Whether `address` is already scheduled for deletion.
	fn deleted(&self, address: H160) -> bool;
	/// EIP-2929. With `index`, asks about the slot rather than the account.
	fn is_cold(&self, address: H160, index: Option<H256>) -> bool;

	fn set_storage(&mut self, address: H160, index: H256, value: H256) -> Result<(), ExitError>;
	fn set_transient_storage(
		&mut self,
		address: H160,
		index: H256,
		value: H256,
	) -> Result<(), ExitError>;
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError>;
	/// `SELFDESTRUCT`: move the balance of `address` to `target` and schedule
	/// the deletion the active rules allow.
	fn mark_delete(&mut self, address: H160, target: H160) -> Result<(), ExitError>;

	/// Run a child create frame. Yields the exit reason, the new address on
	/// success and the output of init code that reverted.
	fn create(
		&mut self,
		caller: H160,
		scheme: CreateScheme,
		value: U256,
		init_code: Vec<u8>,
		target_gas: Option<u64>,
	) -> (ExitReason, Option<H160>, Vec<u8>);
	/// Run a child call frame, yielding its exit reason and output.
	fn call(
		&mut self,
		code_address: H160,
		transfer: Option<Transfer>,
		input: Vec<u8>,
		target_gas: Option<u64>,
		scheme: CallScheme,
		context: Context,
	) -> (ExitReason, Vec<u8>);

	/// Runs before every opcode: charges it, and rejects it when undefined
	/// under the configuration or when it writes inside a static frame.
	fn pre_validate(
		&mut self,
		context: &Context,
		opcode: Opcode,
		stack: &Stack,
	) -> Result<(), ExitError>;
}

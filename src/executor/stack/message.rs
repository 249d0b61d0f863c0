use crate::backend::Log;
use crate::ExitReason;
use alloc::{collections::BTreeMap, vec::Vec};
use primitive_types::{H160, H256, U256};

/// One call or create request, the input of a frame.
///
/// A message without `to` is a create. Its `data` is then the init code, and
/// the frame runs it with empty call data at the derived address.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Message {
	/// Account the frame sees as `CALLER`.
	pub caller: H160,
	/// Callee, absent for a create.
	pub to: Option<H160>,
	/// Account whose code runs, when it differs from `to`.
	pub code_address: Option<H160>,
	/// Value moved from the payer to `to`.
	pub value: U256,
	/// Gas granted to the frame.
	pub gas_limit: u64,
	/// Call data, or init code for a create.
	pub data: Vec<u8>,
	/// Code to run instead of the code stored at `code_address`.
	pub code: Option<Vec<u8>>,
	/// Nesting depth, 0 for the top-level frame.
	pub depth: usize,
	/// Forbids state mutation in the frame and its children.
	pub is_static: bool,
	/// Runs foreign code in the caller's context, with no value transfer.
	pub delegatecall: bool,
	/// Pays the value instead of `caller`. Set by `AUTHCALL`.
	pub authcall_origin: Option<H160>,
	/// Selects the `CREATE2` address derivation.
	pub salt: Option<H256>,
}

impl Message {
	/// Top-level call.
	pub fn call(caller: H160, to: H160, value: U256, data: Vec<u8>, gas_limit: u64) -> Self {
		Self {
			caller,
			to: Some(to),
			code_address: None,
			value,
			gas_limit,
			data,
			code: None,
			depth: 0,
			is_static: false,
			delegatecall: false,
			authcall_origin: None,
			salt: None,
		}
	}

	/// Top-level create.
	pub fn create(caller: H160, value: U256, init_code: Vec<u8>, gas_limit: u64) -> Self {
		Self {
			caller,
			to: None,
			code_address: None,
			value,
			gas_limit,
			data: init_code,
			code: None,
			depth: 0,
			is_static: false,
			delegatecall: false,
			authcall_origin: None,
			salt: None,
		}
	}

	/// Top-level create at the salted address.
	pub fn create2(
		caller: H160,
		value: U256,
		init_code: Vec<u8>,
		salt: H256,
		gas_limit: u64,
	) -> Self {
		Self {
			salt: Some(salt),
			..Self::create(caller, value, init_code, gas_limit)
		}
	}

	/// Whether the message asks for a create.
	pub fn is_create(&self) -> bool {
		self.to.is_none()
	}

	/// Account whose code runs.
	pub fn code_address(&self) -> Option<H160> {
		self.code_address.or(self.to)
	}
}

/// Output of one frame.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ExecResult {
	/// How the frame ended.
	pub reason: ExitReason,
	/// Gas the frame consumed. The whole grant on an exceptional halt.
	pub gas_used: u64,
	/// Refund the frame accumulated. Zero when it failed.
	pub gas_refund: i64,
	/// Returned data, or the revert data of a reverted frame.
	pub return_value: Vec<u8>,
	/// Address of the deployed contract.
	pub created_address: Option<H160>,
	/// Logs emitted by the frame and the children it kept.
	pub logs: Vec<Log>,
	/// Self-destructed accounts and their beneficiaries.
	pub selfdestruct: BTreeMap<H160, H160>,
}

impl ExecResult {
	/// Result of a frame that never ran.
	pub fn failed(reason: ExitReason, gas_used: u64) -> Self {
		Self {
			reason,
			gas_used,
			gas_refund: 0,
			return_value: Vec::new(),
			created_address: None,
			logs: Vec::new(),
			selfdestruct: BTreeMap::new(),
		}
	}

	/// The terminal error, absent on a normal halt.
	pub fn exception_error(&self) -> Option<&ExitReason> {
		if self.reason.is_succeed() {
			None
		} else {
			Some(&self.reason)
		}
	}
}

use primitive_types::{H160, H256, U256};

/// How a `CREATE` family opcode derives the new address.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CreateScheme {
	/// `keccak256(rlp([caller, nonce]))`.
	Legacy { caller: H160 },
	/// `keccak256(0xff ++ caller ++ salt ++ code_hash)`.
	Create2 {
		caller: H160,
		code_hash: H256,
		salt: H256,
	},
}

impl CreateScheme {
	pub fn caller(&self) -> H160 {
		match *self {
			Self::Legacy { caller } | Self::Create2 { caller, .. } => caller,
		}
	}
}

/// Which message-call opcode started a frame.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub enum CallScheme {
	Call,
	/// Runs foreign code against the caller's own storage and balance.
	CallCode,
	/// Like `CallCode`, keeping the parent's caller and value.
	DelegateCall,
	StaticCall,
	/// Call sent as the account authorized by `AUTH`.
	AuthCall,
}

impl CallScheme {
	/// Schemes whose value argument moves balance.
	pub fn transfers_value(&self) -> bool {
		match self {
			Self::Call | Self::CallCode | Self::AuthCall => true,
			Self::DelegateCall | Self::StaticCall => false,
		}
	}
}

/// Identity a frame runs under, as seen by `ADDRESS`, `CALLER` and
/// `CALLVALUE`.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Context {
	/// Account whose storage the frame reads and writes.
	pub address: H160,
	pub caller: H160,
	/// Value reported to the code. May differ from the value moved, as under
	/// `DELEGATECALL`.
	pub apparent_value: U256,
}

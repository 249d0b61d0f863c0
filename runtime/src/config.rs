//! Capability set of the machine: the active hardfork, the EIPs it turns on,
//! and the gas parameters and opcode table derived from them.

use crate::Opcode;
use alloc::collections::BTreeSet;

/// Mainnet hardforks, in activation order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub enum Hardfork {
	/// Launch rules.
	Frontier,
	/// EIP-2 and DELEGATECALL.
	Homestead,
	/// EIP-150 gas repricing.
	TangerineWhistle,
	/// Empty account cleanup and code size limit.
	SpuriousDragon,
	/// REVERT, STATICCALL, return data and the first curve precompiles.
	Byzantium,
	/// Shifts, CREATE2, EXTCODEHASH and net gas metering.
	Constantinople,
	/// Constantinople without net gas metering.
	Petersburg,
	/// CHAINID, SELFBALANCE and EIP-2200 storage metering.
	Istanbul,
	/// Warm and cold access accounting.
	Berlin,
	/// BASEFEE and reduced refunds.
	London,
	/// PREVRANDAO replaces DIFFICULTY.
	Merge,
	/// PUSH0, warm coinbase and the init code limit.
	Shanghai,
	/// Transient storage, MCOPY, blobs and the SELFDESTRUCT change.
	Cancun,
}

impl Hardfork {
	/// Every hardfork, oldest first.
	pub const ALL: [Hardfork; 13] = [
		Hardfork::Frontier,
		Hardfork::Homestead,
		Hardfork::TangerineWhistle,
		Hardfork::SpuriousDragon,
		Hardfork::Byzantium,
		Hardfork::Constantinople,
		Hardfork::Petersburg,
		Hardfork::Istanbul,
		Hardfork::Berlin,
		Hardfork::London,
		Hardfork::Merge,
		Hardfork::Shanghai,
		Hardfork::Cancun,
	];

	/// EIPs that this hardfork activates on top of its predecessor.
	pub fn eips(self) -> &'static [u16] {
		match self {
			Hardfork::Frontier => &[],
			Hardfork::Homestead => &[2, 7],
			Hardfork::TangerineWhistle => &[150],
			Hardfork::SpuriousDragon => &[160, 161, 170],
			Hardfork::Byzantium => &[140, 196, 197, 198, 211, 214],
			Hardfork::Constantinople => &[145, 1014, 1052, 1283],
			Hardfork::Petersburg => &[],
			Hardfork::Istanbul => &[152, 1108, 1344, 1884, 2028, 2200],
			Hardfork::Berlin => &[2565, 2929],
			Hardfork::London => &[3198, 3529, 3541],
			Hardfork::Merge => &[4399],
			Hardfork::Shanghai => &[3651, 3855, 3860],
			Hardfork::Cancun => &[1153, 4844, 5656, 6780, 7516],
		}
	}

	/// EIPs that this hardfork deactivates.
	fn removed_eips(self) -> &'static [u16] {
		match self {
			Hardfork::Petersburg => &[1283],
			_ => &[],
		}
	}
}

/// EIPs that are not part of any mainnet hardfork but can be activated on
/// top of one.
pub const OPTIONAL_EIPS: [u16; 4] = [2315, 3074, 3540, 3670];

/// How an opcode is charged.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum OpcodeCost {
	/// Fixed fee, known without looking at the stack.
	Fixed(u64),
	/// Fee depends on the stack, memory or state.
	Dynamic,
}

/// Invalid EIP activation.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ConfigError {
	/// The EIP is unknown to this machine.
	UnsupportedEip(u16),
	/// The EIP needs another EIP that is not active.
	MissingDependency {
		/// Requested EIP.
		eip: u16,
		/// EIP it depends on.
		requires: u16,
	},
	/// The two EIPs assign different meanings to the same opcodes.
	Conflict(u16, u16),
}

/// Runtime configuration.
#[derive(Clone, Debug)]
pub struct Config {
	hardfork: Hardfork,
	eips: BTreeSet<u16>,
	opcodes: [Option<OpcodeCost>; 256],
	/// Stack limit.
	pub stack_limit: usize,
	/// Memory limit.
	pub memory_limit: usize,
	/// Call limit.
	pub call_stack_limit: usize,
	/// Call stipend.
	pub call_stipend: u64,
	/// Whether the chain is sealed by authorities until the merge. COINBASE
	/// then reports the block signer.
	pub proof_of_authority: bool,
}

impl Config {
	/// Configuration of the given hardfork with its mainnet EIP set.
	pub fn new(hardfork: Hardfork) -> Config {
		let mut config = Config {
			hardfork,
			eips: BTreeSet::new(),
			opcodes: [None; 256],
			stack_limit: 1024,
			memory_limit: usize::MAX,
			call_stack_limit: 1024,
			call_stipend: 2300,
			proof_of_authority: false,
		};
		config.set_hardfork(hardfork);
		config
	}

	/// Frontier hard fork configuration.
	pub fn frontier() -> Config {
		Self::new(Hardfork::Frontier)
	}

	/// Homestead hard fork configuration.
	pub fn homestead() -> Config {
		Self::new(Hardfork::Homestead)
	}

	/// Tangerine Whistle hard fork configuration.
	pub fn tangerine_whistle() -> Config {
		Self::new(Hardfork::TangerineWhistle)
	}

	/// Spurious Dragon hard fork configuration.
	pub fn spurious_dragon() -> Config {
		Self::new(Hardfork::SpuriousDragon)
	}

	/// Byzantium hard fork configuration.
	pub fn byzantium() -> Config {
		Self::new(Hardfork::Byzantium)
	}

	/// Constantinople hard fork configuration.
	pub fn constantinople() -> Config {
		Self::new(Hardfork::Constantinople)
	}

	/// Petersburg hard fork configuration.
	pub fn petersburg() -> Config {
		Self::new(Hardfork::Petersburg)
	}

	/// Istanbul hard fork configuration.
	pub fn istanbul() -> Config {
		Self::new(Hardfork::Istanbul)
	}

	/// Berlin hard fork configuration.
	pub fn berlin() -> Config {
		Self::new(Hardfork::Berlin)
	}

	/// London hard fork configuration.
	pub fn london() -> Config {
		Self::new(Hardfork::London)
	}

	/// The Merge (Paris) hard fork configuration.
	pub fn merge() -> Config {
		Self::new(Hardfork::Merge)
	}

	/// Shanghai hard fork configuration.
	pub fn shanghai() -> Config {
		Self::new(Hardfork::Shanghai)
	}

	/// Cancun hard fork configuration.
	pub fn cancun() -> Config {
		Self::new(Hardfork::Cancun)
	}

	/// Switch to another hardfork. Optional EIPs activated before are
	/// dropped.
	pub fn set_hardfork(&mut self, hardfork: Hardfork) {
		self.hardfork = hardfork;
		self.eips.clear();
		for fork in Hardfork::ALL.iter().take_while(|fork| **fork <= hardfork) {
			self.eips.extend(fork.eips().iter().copied());
			for eip in fork.removed_eips() {
				self.eips.remove(eip);
			}
		}
		self.rebuild();
	}

	/// Activate an EIP on top of the current set.
	pub fn activate_eip(&mut self, eip: u16) -> Result<(), ConfigError> {
		let mainnet = Hardfork::ALL.iter().any(|fork| fork.eips().contains(&eip));
		if !mainnet && !OPTIONAL_EIPS.contains(&eip) {
			return Err(ConfigError::UnsupportedEip(eip));
		}

		let requires: &[u16] = match eip {
			3670 => &[3540],
			3540 => &[3541],
			_ => &[],
		};
		for required in requires {
			if !self.eips.contains(required) {
				return Err(ConfigError::MissingDependency {
					eip,
					requires: *required,
				});
			}
		}

		let conflicts: &[u16] = match eip {
			2315 => &[1153, 5656],
			1153 | 5656 => &[2315],
			_ => &[],
		};
		for other in conflicts {
			if self.eips.contains(other) {
				return Err(ConfigError::Conflict(eip, *other));
			}
		}

		self.eips.insert(eip);
		self.rebuild();
		Ok(())
	}

	/// Builder form of [`Config::activate_eip`].
	pub fn with_eip(mut self, eip: u16) -> Result<Config, ConfigError> {
		self.activate_eip(eip)?;
		Ok(self)
	}

	/// The active hardfork.
	pub fn hardfork(&self) -> Hardfork {
		self.hardfork
	}

	/// Whether the active hardfork is `hardfork` or a later one.
	pub fn gte_hardfork(&self, hardfork: Hardfork) -> bool {
		self.hardfork >= hardfork
	}

	/// Whether the EIP is active.
	pub fn is_activated_eip(&self, eip: u16) -> bool {
		self.eips.contains(&eip)
	}

	/// Active EIPs in ascending order.
	pub fn eips(&self) -> impl Iterator<Item = u16> + '_ {
		self.eips.iter().copied()
	}

	/// Cost class of the opcode, or `None` if it is not defined.
	pub fn opcode_cost(&self, opcode: Opcode) -> Option<OpcodeCost> {
		self.opcodes[opcode.as_usize()]
	}

	/// Whether the opcode is defined under the active capability set.
	pub fn is_opcode_defined(&self, opcode: Opcode) -> bool {
		self.opcode_cost(opcode).is_some()
	}

	/// Whether COINBASE reports the block signer.
	pub fn is_proof_of_authority(&self) -> bool {
		self.proof_of_authority && self.hardfork < Hardfork::Merge
	}

	fn rebuild(&mut self) {
		use OpcodeCost::{Dynamic, Fixed};

		let mut table = [None; 256];
		let mut set = |opcode: Opcode, cost: OpcodeCost| table[opcode.as_usize()] = Some(cost);

		set(Opcode::STOP, Fixed(0));
		for opcode in [Opcode::ADD, Opcode::SUB, Opcode::NOT, Opcode::BYTE] {
			set(opcode, Fixed(3));
		}
		for opcode in [
			Opcode::LT,
			Opcode::GT,
			Opcode::SLT,
			Opcode::SGT,
			Opcode::EQ,
			Opcode::ISZERO,
			Opcode::AND,
			Opcode::OR,
			Opcode::XOR,
			Opcode::CALLDATALOAD,
		] {
			set(opcode, Fixed(3));
		}
		for opcode in [
			Opcode::MUL,
			Opcode::DIV,
			Opcode::SDIV,
			Opcode::MOD,
			Opcode::SMOD,
			Opcode::SIGNEXTEND,
		] {
			set(opcode, Fixed(5));
		}
		set(Opcode::ADDMOD, Fixed(8));
		set(Opcode::MULMOD, Fixed(8));
		for opcode in [
			Opcode::ADDRESS,
			Opcode::ORIGIN,
			Opcode::CALLER,
			Opcode::CALLVALUE,
			Opcode::CALLDATASIZE,
			Opcode::CODESIZE,
			Opcode::GASPRICE,
			Opcode::COINBASE,
			Opcode::TIMESTAMP,
			Opcode::NUMBER,
			Opcode::DIFFICULTY,
			Opcode::GASLIMIT,
			Opcode::POP,
			Opcode::PC,
			Opcode::MSIZE,
			Opcode::GAS,
		] {
			set(opcode, Fixed(2));
		}
		set(Opcode::BLOCKHASH, Fixed(20));
		set(Opcode::JUMP, Fixed(8));
		set(Opcode::JUMPI, Fixed(10));
		set(Opcode::JUMPDEST, Fixed(1));
		set(Opcode::INVALID, Fixed(0));
		for byte in Opcode::PUSH1.as_u8()..=Opcode::SWAP16.as_u8() {
			set(Opcode(byte), Fixed(3));
		}
		for opcode in [
			Opcode::EXP,
			Opcode::SHA3,
			Opcode::BALANCE,
			Opcode::CALLDATACOPY,
			Opcode::CODECOPY,
			Opcode::EXTCODESIZE,
			Opcode::EXTCODECOPY,
			Opcode::MLOAD,
			Opcode::MSTORE,
			Opcode::MSTORE8,
			Opcode::SLOAD,
			Opcode::SSTORE,
			Opcode::LOG0,
			Opcode::LOG1,
			Opcode::LOG2,
			Opcode::LOG3,
			Opcode::LOG4,
			Opcode::CREATE,
			Opcode::CALL,
			Opcode::CALLCODE,
			Opcode::RETURN,
			Opcode::SUICIDE,
		] {
			set(opcode, Dynamic);
		}

		let eip = |n: u16| self.eips.contains(&n);
		if eip(7) {
			set(Opcode::DELEGATECALL, Dynamic);
		}
		if eip(140) {
			set(Opcode::REVERT, Dynamic);
		}
		if eip(211) {
			set(Opcode::RETURNDATASIZE, Fixed(2));
			set(Opcode::RETURNDATACOPY, Dynamic);
		}
		if eip(214) {
			set(Opcode::STATICCALL, Dynamic);
		}
		if eip(145) {
			set(Opcode::SHL, Fixed(3));
			set(Opcode::SHR, Fixed(3));
			set(Opcode::SAR, Fixed(3));
		}
		if eip(1014) {
			set(Opcode::CREATE2, Dynamic);
		}
		if eip(1052) {
			set(Opcode::EXTCODEHASH, Dynamic);
		}
		if eip(1344) {
			set(Opcode::CHAINID, Fixed(2));
		}
		if eip(1884) {
			set(Opcode::SELFBALANCE, Fixed(5));
		}
		if eip(3198) {
			set(Opcode::BASEFEE, Fixed(2));
		}
		if eip(3855) {
			set(Opcode::PUSH0, Fixed(2));
		}
		if eip(1153) {
			set(Opcode::TLOAD, Fixed(100));
			set(Opcode::TSTORE, Dynamic);
		}
		if eip(5656) {
			set(Opcode::MCOPY, Dynamic);
		}
		if eip(4844) {
			set(Opcode::BLOBHASH, Fixed(3));
		}
		if eip(7516) {
			set(Opcode::BLOBBASEFEE, Fixed(2));
		}
		if eip(2315) {
			set(Opcode::BEGINSUB, Fixed(2));
			set(Opcode::RETURNSUB, Fixed(5));
			set(Opcode::JUMPSUB, Fixed(10));
		}
		if eip(3074) {
			set(Opcode::AUTH, Dynamic);
			set(Opcode::AUTHCALL, Dynamic);
		}

		self.opcodes = table;
	}
}

// Gas parameters. Each one is a function of the active EIP set.
impl Config {
	/// Gas paid for extcode.
	pub fn gas_ext_code(&self) -> u64 {
		if self.is_activated_eip(150) {
			700
		} else {
			20
		}
	}

	/// Gas paid for extcodehash.
	pub fn gas_ext_code_hash(&self) -> u64 {
		if self.is_activated_eip(1884) {
			700
		} else {
			400
		}
	}

	/// Gas paid for BALANCE opcode.
	pub fn gas_balance(&self) -> u64 {
		if self.is_activated_eip(1884) {
			700
		} else if self.is_activated_eip(150) {
			400
		} else {
			20
		}
	}

	/// Gas paid for SLOAD opcode, and the warm read under access lists.
	pub fn gas_sload(&self) -> u64 {
		if self.is_activated_eip(2929) {
			100
		} else if self.is_activated_eip(1884) {
			800
		} else if self.is_activated_eip(150) {
			200
		} else {
			50
		}
	}

	/// Gas paid for cold SLOAD opcode.
	pub fn gas_sload_cold(&self) -> u64 {
		2100
	}

	/// Gas paid for SSTORE opcode, setting a zero slot.
	pub fn gas_sstore_set(&self) -> u64 {
		20000
	}

	/// Gas paid for SSTORE opcode, changing a nonzero slot.
	pub fn gas_sstore_reset(&self) -> u64 {
		if self.is_activated_eip(2929) {
			2900
		} else {
			5000
		}
	}

	/// Gas refunded for clearing a slot.
	pub fn refund_sstore_clears(&self) -> i64 {
		if self.is_activated_eip(3529) {
			4800
		} else {
			15000
		}
	}

	/// Maximum share of the used gas that can be refunded, as a divisor.
	pub fn max_refund_quotient(&self) -> u64 {
		if self.is_activated_eip(3529) {
			5
		} else {
			2
		}
	}

	/// Gas paid for SUICIDE opcode.
	pub fn gas_suicide(&self) -> u64 {
		if self.is_activated_eip(150) {
			5000
		} else {
			0
		}
	}

	/// Gas paid for SUICIDE opcode when it hits a new account.
	pub fn gas_suicide_new_account(&self) -> u64 {
		if self.is_activated_eip(150) {
			25000
		} else {
			0
		}
	}

	/// Gas paid for CALL opcode.
	pub fn gas_call(&self) -> u64 {
		if self.is_activated_eip(150) {
			700
		} else {
			40
		}
	}

	/// Gas paid for EXP opcode for every byte.
	pub fn gas_expbyte(&self) -> u64 {
		if self.is_activated_eip(160) {
			50
		} else {
			10
		}
	}

	/// Gas paid for the first access of an account in a transaction.
	pub fn gas_account_access_cold(&self) -> u64 {
		2600
	}

	/// Gas paid for a repeated access.
	pub fn gas_storage_read_warm(&self) -> u64 {
		100
	}

	/// Base gas of AUTH.
	pub fn gas_auth_base(&self) -> u64 {
		3100
	}

	/// Gas paid for every byte of deployed code.
	pub fn gas_code_deposit(&self) -> u64 {
		200
	}

	/// Largest deployable code, if limited.
	pub fn create_contract_limit(&self) -> Option<usize> {
		if self.is_activated_eip(170) {
			Some(0x6000)
		} else {
			None
		}
	}

	/// Largest init code, if limited.
	pub fn max_initcode_size(&self) -> Option<usize> {
		if self.is_activated_eip(3860) {
			Some(0xc000)
		} else {
			None
		}
	}

	/// Whether empty accounts are considered exists.
	pub fn empty_considered_exists(&self) -> bool {
		!self.is_activated_eip(161)
	}

	/// Whether create transactions and create opcode increases nonce by one.
	pub fn create_increase_nonce(&self) -> bool {
		self.is_activated_eip(161)
	}

	/// Whether the gasometer is running in EIP-1283 or EIP-2200 mode.
	pub fn sstore_gas_metering(&self) -> bool {
		self.is_activated_eip(1283) || self.is_activated_eip(2200)
	}

	/// Whether SSTORE fails with no more than the call stipend left.
	pub fn sstore_revert_under_stipend(&self) -> bool {
		self.is_activated_eip(2200)
	}

	/// Whether account and storage accesses are priced warm or cold.
	pub fn increase_state_access_gas(&self) -> bool {
		self.is_activated_eip(2929)
	}

	/// Whether to throw out of gas error when CALL/CALLCODE/DELEGATECALL
	/// requires more than maximum amount of gas.
	pub fn err_on_call_with_more_gas(&self) -> bool {
		!self.is_activated_eip(150)
	}

	/// Whether the child gas is capped to all but one 64th of the gas left.
	pub fn call_l64_after_gas(&self) -> bool {
		self.is_activated_eip(150)
	}
}

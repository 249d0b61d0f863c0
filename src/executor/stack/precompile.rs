use crate::{Context, ExitError, ExitFatal, ExitRevert, ExitSucceed};
use alloc::{collections::BTreeMap, vec::Vec};
use primitive_types::{H160, H256};

/// Outcome of a precompile run.
pub type PrecompileResult = Result<PrecompileOutput, PrecompileFailure>;

/// Successful precompile output.
#[derive(Debug, Eq, PartialEq, Clone)]
pub struct PrecompileOutput {
	pub exit_status: ExitSucceed,
	pub output: Vec<u8>,
}

/// Ways a precompile can fail. The executor maps each one onto the
/// matching `ExitReason` of the frame.
#[derive(Debug, Eq, PartialEq, Clone)]
pub enum PrecompileFailure {
	/// Exceptional halt, the grant is consumed.
	Error { exit_status: ExitError },
	/// Revert with `output` as revert data.
	Revert {
		exit_status: ExitRevert,
		output: Vec<u8>,
	},
	/// Host failure, unwinds every frame.
	Fatal { exit_status: ExitFatal },
}

impl From<ExitError> for PrecompileFailure {
	fn from(exit_status: ExitError) -> Self {
		Self::Error { exit_status }
	}
}

/// View of the running frame handed to a precompile.
pub trait PrecompileHandle {
	/// Charge `cost` against the frame, failing with `OutOfGas` when it
	/// does not fit.
	fn record_cost(&mut self, cost: u64) -> Result<(), ExitError>;

	fn remaining_gas(&self) -> u64;

	/// Emit a log from the precompile frame.
	fn log(&mut self, address: H160, topics: Vec<H256>, data: Vec<u8>) -> Result<(), ExitError>;

	/// Address the precompile was reached at.
	fn code_address(&self) -> H160;

	fn input(&self) -> &[u8];

	fn context(&self) -> &Context;

	fn is_static(&self) -> bool;

	/// Gas granted to the frame, `None` when unbounded.
	fn gas_limit(&self) -> Option<u64>;
}

/// Addresses served natively instead of by bytecode.
///
/// Membership only depends on the capability set the set was built for,
/// never on the frame.
pub trait PrecompileSet {
	/// Run the precompile at `handle.code_address()`, or return `None` when
	/// that address is not part of the set.
	fn execute(&self, handle: &mut impl PrecompileHandle) -> Option<PrecompileResult>;

	/// Membership test used for warming and for the empty-code shortcut.
	fn is_precompile(&self, address: H160) -> bool;
}

impl PrecompileSet for () {
	fn execute(&self, _: &mut impl PrecompileHandle) -> Option<PrecompileResult> {
		None
	}

	fn is_precompile(&self, _: H160) -> bool {
		false
	}
}

/// A stateless precompile taking `(input, gas_limit, context, is_static)`
/// and returning its output together with the gas it costs.
pub type PrecompileFn =
	fn(&[u8], Option<u64>, &Context, bool) -> Result<(PrecompileOutput, u64), PrecompileFailure>;

impl PrecompileSet for BTreeMap<H160, PrecompileFn> {
	fn execute(&self, handle: &mut impl PrecompileHandle) -> Option<PrecompileResult> {
		let precompile = *self.get(&handle.code_address())?;

		let run = precompile(
			handle.input(),
			handle.gas_limit(),
			handle.context(),
			handle.is_static(),
		);
		Some(run.and_then(|(output, cost)| {
			handle.record_cost(cost)?;
			Ok(output)
		}))
	}

	fn is_precompile(&self, address: H160) -> bool {
		self.contains_key(&address)
	}
}

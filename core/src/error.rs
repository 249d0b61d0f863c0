use crate::Opcode;
use alloc::borrow::Cow;

/// Trap which indicates that an external opcode has to be handled.
pub type Trap = Opcode;

/// Capture represents the result of execution.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Capture<E, T> {
	/// The machine has exited. It cannot be executed again.
	Exit(E),
	/// The machine has trapped. It is waiting for external information, and can
	/// be executed again.
	Trap(T),
}

/// Exit reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitReason {
	/// Machine has succeeded.
	Succeed(ExitSucceed),
	/// Machine returns a normal EVM error.
	Error(ExitError),
	/// Machine encountered an explicit revert.
	Revert(ExitRevert),
	/// Machine encountered an error that is not supposed to be normal EVM
	/// errors, such as requiring too much memory to execute.
	Fatal(ExitFatal),
}

impl ExitReason {
	/// Whether the exit is succeeded.
	pub fn is_succeed(&self) -> bool {
		matches!(self, Self::Succeed(_))
	}

	/// Whether the exit is error.
	pub fn is_error(&self) -> bool {
		matches!(self, Self::Error(_))
	}

	/// Whether the exit is revert.
	pub fn is_revert(&self) -> bool {
		matches!(self, Self::Revert(_))
	}

	/// Whether the exit is fatal.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::Fatal(_))
	}

	/// Whether the frame that exited this way keeps none of its gas.
	pub fn is_exceptional_halt(&self) -> bool {
		matches!(self, Self::Error(_) | Self::Fatal(_))
	}
}

/// Exit succeed reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitSucceed {
	/// Machine encountered an explicit stop.
	Stopped,
	/// Machine encountered an explicit return.
	Returned,
	/// Machine encountered an explicit suicide.
	Suicided,
}

impl From<ExitSucceed> for ExitReason {
	fn from(s: ExitSucceed) -> Self {
		Self::Succeed(s)
	}
}

/// Exit revert reason.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitRevert {
	/// Machine encountered an explicit revert.
	Reverted,
}

impl From<ExitRevert> for ExitReason {
	fn from(s: ExitRevert) -> Self {
		Self::Revert(s)
	}
}

/// Exit error reason. Every variant is an exceptional halt: the frame loses
/// its whole gas grant and its effects.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitError {
	/// Trying to pop from an empty stack.
	#[cfg_attr(feature = "with-codec", codec(index = 0))]
	StackUnderflow,
	/// Trying to push into a stack over stack limit.
	#[cfg_attr(feature = "with-codec", codec(index = 1))]
	StackOverflow,
	/// Jump destination is invalid.
	#[cfg_attr(feature = "with-codec", codec(index = 2))]
	InvalidJump,
	/// An offset or length does not fit the machine's address space.
	#[cfg_attr(feature = "with-codec", codec(index = 3))]
	OutOfRange,
	/// Encountered an undefined or inactive opcode.
	#[cfg_attr(feature = "with-codec", codec(index = 4))]
	InvalidOpcode(Opcode),
	/// Execution runs out of gas.
	#[cfg_attr(feature = "with-codec", codec(index = 5))]
	OutOfGas,
	/// Not enough gas left to pay for the returned code of a contract
	/// creation.
	#[cfg_attr(feature = "with-codec", codec(index = 6))]
	CodeStoreOutOfGas,
	/// State mutation attempted inside a static frame.
	#[cfg_attr(feature = "with-codec", codec(index = 7))]
	StaticStateChange,
	/// Create address already has a nonce or code.
	#[cfg_attr(feature = "with-codec", codec(index = 8))]
	CreateCollision,
	/// Sender cannot afford the value transfer.
	#[cfg_attr(feature = "with-codec", codec(index = 9))]
	InsufficientBalance,
	/// Crediting the value would overflow the recipient's balance.
	#[cfg_attr(feature = "with-codec", codec(index = 10))]
	ValueOverflow,
	/// Init code is larger than the active limit.
	#[cfg_attr(feature = "with-codec", codec(index = 11))]
	InitcodeSizeViolation,
	/// Deployed code starts with the reserved `0xEF` byte.
	#[cfg_attr(feature = "with-codec", codec(index = 12))]
	InvalidBytecodeResult,
	/// Code claims to be an EOF container but does not validate.
	#[cfg_attr(feature = "with-codec", codec(index = 13))]
	InvalidEofFormat,
	/// `RETURNDATACOPY` reads past the return data buffer.
	#[cfg_attr(feature = "with-codec", codec(index = 14))]
	OutOfOffset,
	/// Call or create nested too deep.
	#[cfg_attr(feature = "with-codec", codec(index = 15))]
	CallTooDeep,
	/// Nonce of the creator reached its maximum.
	#[cfg_attr(feature = "with-codec", codec(index = 16))]
	NonceOverflow,
	/// `BEGINSUB` executed directly.
	#[cfg_attr(feature = "with-codec", codec(index = 17))]
	InvalidBeginSub,
	/// `RETURNSUB` with an empty return stack.
	#[cfg_attr(feature = "with-codec", codec(index = 18))]
	InvalidReturnSub,
	/// `JUMPSUB` to a location that is not `BEGINSUB`.
	#[cfg_attr(feature = "with-codec", codec(index = 19))]
	InvalidJumpSub,
	/// `AUTHCALL` without a preceding successful `AUTH`.
	#[cfg_attr(feature = "with-codec", codec(index = 20))]
	AuthCallUnset,
	/// Other normal errors.
	#[cfg_attr(feature = "with-codec", codec(index = 21))]
	Other(Cow<'static, str>),
}

impl From<ExitError> for ExitReason {
	fn from(s: ExitError) -> Self {
		Self::Error(s)
	}
}

/// Exit fatal reason.
#[derive(Clone, Debug, Eq, PartialEq)]
#[cfg_attr(
	feature = "with-codec",
	derive(scale_codec::Encode, scale_codec::Decode, scale_info::TypeInfo)
)]
#[cfg_attr(feature = "with-serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ExitFatal {
	/// The operation is not supported.
	NotSupported,
	/// The trap (interrupt) is unhandled.
	UnhandledInterrupt,
	/// Other fatal errors.
	Other(Cow<'static, str>),
}

impl From<ExitFatal> for ExitReason {
	fn from(s: ExitFatal) -> Self {
		Self::Fatal(s)
	}
}

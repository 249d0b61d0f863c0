//! A stack-based executor with customizable state.
//! A memory-based state is provided, but can be replaced by a custom
//! implementation, for example one interacting with a database.

mod executor;
mod message;
mod precompile;
mod state;

pub use self::executor::{
	Accessed, StackExecutor, StackExitKind, StackState, StackSubstateMetadata,
};
pub use self::message::{ExecResult, Message};
pub use self::precompile::{
	PrecompileFailure, PrecompileFn, PrecompileHandle, PrecompileOutput, PrecompileResult,
	PrecompileSet,
};
pub use self::state::{MemoryStackState, MemoryStackSubstate};

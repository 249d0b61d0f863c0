//! Message execution over a checkpointed state.

pub mod stack;

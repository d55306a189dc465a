//! Template-variable substitution for user-facing message text.

pub mod context;
pub mod expr;
pub mod processor;

pub use context::{ChannelVars, ServerVars, UserVars, VariableContext};
pub use processor::{variable_reference, VariableProcessor};

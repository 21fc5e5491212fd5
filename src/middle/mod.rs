//! Names are resolved and types are checked here, and the annotated tree is
//! then flattened into IR: straight-line instructions over virtual variables
//! where conditionals, loops, and short-circuit operators become labels and
//! jumps.

pub mod builtin;
pub mod ir;
pub mod scope;
pub mod ty;
pub mod type_checker;

/// Name of the implicit function holding the top-level statements
pub const ENTRY_POINT: &str = "main";

//! Command implementations.
//!
//! Each command is a separate module that declares its own arguments and
//! execution logic.

mod check;
mod run;

pub use check::Check;
pub use run::Run;

//! Common types shared across `sealed` workspace crates: the error taxonomy and
//! the JSON report shapes printed by `sealctl`.

pub mod error;
pub mod protocol;

pub use error::ErrorKind;

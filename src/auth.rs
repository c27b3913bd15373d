//! Token data model shared by the gate, flows, and stores.

pub mod secret;
pub mod token;

pub use secret::*;
pub use token::*;

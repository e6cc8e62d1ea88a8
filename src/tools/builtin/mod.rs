//! Built-in tools.

pub mod employer;

pub use employer::VerifyEmployerTool;

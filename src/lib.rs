//! ChatForm: application-intake validation with AI-assisted red-flag resolution.

pub mod api;
pub mod chat;
pub mod checks;
pub mod config;
pub mod error;
pub mod intake;
pub mod llm;
pub mod rules;
pub mod service;
pub mod sources;
pub mod tools;

#[cfg(test)]
mod test_support;

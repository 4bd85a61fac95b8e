#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![forbid(unsafe_code)]

pub mod config;
pub mod engine;
pub mod entities;
pub mod errors;
pub mod events;
pub mod persistence;
pub mod processors;
pub mod service;

pub use errors::BracketError;
pub use service::BracketService;

//! Runtime configuration types.
//!
//! These are the validated values used by the engine and its processors.
//! Loading and parsing the config file is handled by the server crate.

mod config_store;
mod engine;
mod notifier;

pub use config_store::ConfigStore;
pub use engine::EngineConfig;
pub use notifier::NotifierConfig;

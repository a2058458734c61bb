// src/config/mod.rs

//! Configuration loading and validation for buildgate.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Parse duration strings (`duration.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate basic invariants like app naming (`validate.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path};
pub use model::{AppConfig, ConfigFile, ConfigSection, RawConfigFile};
pub use validate::validate_config;

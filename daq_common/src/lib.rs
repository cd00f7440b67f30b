//! DAQ Common Library
//!
//! This crate provides shared constants, peripheral types and configuration
//! loading utilities for the DAQ simulator workspace crates.
//!
//! # Module Structure
//!
//! - [`periph`] - Peripheral constants, enums, error taxonomy and simulator configuration
//! - [`config`] - Configuration loading traits and types
//! - [`prelude`] - Common re-exports for convenience
//!
//! # Usage
//!
//! Add to your `Cargo.toml`:
//! ```toml
//! [dependencies]
//! daq_common = { path = "../daq_common" }
//! ```
//!
//! Then import:
//! ```rust
//! use daq_common::periph::consts::*;
//! use daq_common::config::{ConfigLoader, SharedConfig};
//! ```

#![deny(missing_docs)]

pub mod config;
pub mod periph;
pub mod prelude;

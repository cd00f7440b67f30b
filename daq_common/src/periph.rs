//! Peripheral simulator shared definitions.
//!
//! This module contains the constants, closed enums, error taxonomy and
//! configuration types shared by the ESP32 and HX711 simulators.

pub mod config;
pub mod consts;
pub mod error;
pub mod types;

//! Peripheral error taxonomy.

use std::fmt;
use thiserror::Error;

/// Fixed-capacity bank an index refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BankKind {
    /// GPIO pins
    Gpio,
    /// ADC channels
    Adc,
    /// DAC channels
    Dac,
    /// Hardware timers
    Timer,
}

impl fmt::Display for BankKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Gpio => "GPIO pin",
            Self::Adc => "ADC channel",
            Self::Dac => "DAC channel",
            Self::Timer => "timer",
        };
        f.write_str(name)
    }
}

/// Errors returned by simulator operations.
///
/// Every failing operation returns before any state is mutated.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PeriphError {
    /// Index outside its fixed-capacity bank
    #[error("Invalid {kind} {index} (capacity {capacity})")]
    InvalidIndex {
        /// Bank the index refers to
        kind: BankKind,
        /// Requested index
        index: u8,
        /// Bank capacity
        capacity: usize,
    },

    /// Argument outside its accepted range
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Simulator or sub-unit has not been initialized
    #[error("Not initialized: {0}")]
    NotInitialized(&'static str),

    /// Operation not allowed in the current state
    #[error("Precondition failed: {0}")]
    PreconditionFailed(String),
}

/// Result alias for simulator operations.
pub type PeriphResult<T> = Result<T, PeriphError>;

//! Bounds-checked access into fixed-capacity peripheral banks, plus the
//! shared argument checks.

use daq_common::periph::error::{BankKind, PeriphError, PeriphResult};

fn invalid(kind: BankKind, index: u8, capacity: usize) -> PeriphError {
    PeriphError::InvalidIndex {
        kind,
        index,
        capacity,
    }
}

/// Shared reference to bank entry `index`.
pub(crate) fn slot<T>(bank: &[T], kind: BankKind, index: u8) -> PeriphResult<&T> {
    bank.get(usize::from(index))
        .ok_or_else(|| invalid(kind, index, bank.len()))
}

/// Mutable reference to bank entry `index`.
pub(crate) fn slot_mut<T>(bank: &mut [T], kind: BankKind, index: u8) -> PeriphResult<&mut T> {
    let capacity = bank.len();
    bank.get_mut(usize::from(index))
        .ok_or_else(|| invalid(kind, index, capacity))
}

/// Reject NaN and infinite injected values.
pub(crate) fn ensure_finite(what: &str, value: f32) -> PeriphResult<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(PeriphError::InvalidArgument(format!(
            "{what} must be finite, got {value}"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite("strain", 0.0), Ok(()));
        assert_eq!(ensure_finite("strain", -1.0e30), Ok(()));
        assert_eq!(
            ensure_finite("strain", f32::NAN),
            Err(PeriphError::InvalidArgument(
                "strain must be finite, got NaN".to_string()
            ))
        );
        assert!(matches!(
            ensure_finite("voltage", f32::NEG_INFINITY),
            Err(PeriphError::InvalidArgument(msg)) if msg.contains("voltage")
        ));
    }

    #[test]
    fn test_slot_in_range() {
        let mut bank = [1u8, 2, 3];
        assert_eq!(slot(&bank, BankKind::Dac, 2), Ok(&3));
        *slot_mut(&mut bank, BankKind::Dac, 0).unwrap() = 9;
        assert_eq!(bank[0], 9);
    }

    #[test]
    fn test_slot_out_of_range() {
        let bank = [0u8; 4];
        assert_eq!(
            slot(&bank, BankKind::Timer, 4),
            Err(PeriphError::InvalidIndex {
                kind: BankKind::Timer,
                index: 4,
                capacity: 4,
            })
        );
    }
}

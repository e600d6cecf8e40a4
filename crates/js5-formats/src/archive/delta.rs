//! Delta encoding for ascending number runs
//!
//! Group numbers, and the file numbers inside each group, are stored as the
//! difference to the previous number in the run. Every run starts from an
//! implicit 0.

use super::error::{ArchiveError, ArchiveResult};

/// Reconstruct a run of numbers from its 16-bit deltas
pub fn decode_deltas(deltas: &[u16]) -> Vec<u32> {
    let mut accumulator = 0u32;
    deltas
        .iter()
        .map(|&delta| {
            accumulator = accumulator.wrapping_add(u32::from(delta));
            accumulator
        })
        .collect()
}

/// Encode a non-decreasing run of numbers as 16-bit deltas
pub fn encode_deltas(values: &[u32]) -> ArchiveResult<Vec<u16>> {
    let mut previous = 0u32;
    values
        .iter()
        .map(|&current| {
            let delta = delta(previous, current)?;
            previous = current;
            Ok(delta)
        })
        .collect()
}

/// Difference between two consecutive numbers of a run
pub(crate) fn delta(previous: u32, current: u32) -> ArchiveResult<u16> {
    let difference = current
        .checked_sub(previous)
        .ok_or(ArchiveError::GroupNumbersNotAscending { previous, current })?;
    u16::try_from(difference).map_err(|_| ArchiveError::DeltaOverflow { previous, current })
}

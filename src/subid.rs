//! Packed 32-bit product sub-identifiers.
//!
//! Bit layout:
//!
//! | bits    | meaning                         |
//! |---------|---------------------------------|
//! | 0..=15  | id                              |
//! | 16..=19 | level of detail                 |
//! | 20      | diffuse-variant flag            |
//! | 21      | alpha-variant flag              |
//! | 22      | auxiliary bundle-data flag      |
//! | 23..=31 | reserved, preserved untouched   |

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::diagnostics;

pub const ID_MASK: u32 = 0x0000_FFFF;
pub const LOD_MASK: u32 = 0x000F_0000;
pub const LOD_SHIFT: u32 = 16;
pub const FLAG_DIFF: u32 = 0x0010_0000;
pub const FLAG_ALPHA: u32 = 0x0020_0000;
pub const FLAG_ABDATA: u32 = 0x0040_0000;

/// Largest id that fits the id field.
pub const MAX_ID: u32 = ID_MASK;
/// Largest level of detail that fits the LOD field.
pub const MAX_LOD: u32 = LOD_MASK >> LOD_SHIFT;

/// What to do when an id or LOD does not fit its field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverflowPolicy {
    /// Warn and keep only the low bits.
    #[default]
    Truncate,
    /// Refuse to pack the value.
    Reject,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubIdError {
    #[error("sub id index {0} exceeds maximum of {MAX_ID}")]
    IdOutOfRange(u32),
    #[error("level of detail {0} exceeds maximum of {MAX_LOD}")]
    LodOutOfRange(u32),
}

/// Extract the id field.
pub fn get_id(packed: u32) -> u32 {
    packed & ID_MASK
}

/// Extract the LOD field.
pub fn get_lod(packed: u32) -> u32 {
    (packed & LOD_MASK) >> LOD_SHIFT
}

/// Pack `id` and `lod` into `existing`, preserving every other bit.
///
/// Out-of-range values are truncated to their field width with a warning.
pub fn construct(id: u32, lod: u32, existing: u32) -> u32 {
    if id > MAX_ID {
        diagnostics::warning(format!(
            "Sub index {id} is too big to fit in the id field, maximum is {MAX_ID}; it will be truncated"
        ));
    }
    if lod > MAX_LOD {
        diagnostics::warning(format!(
            "Level of detail {lod} is too big to fit in the LOD field, maximum is {MAX_LOD}; it will be truncated"
        ));
    }
    pack(id, lod, existing)
}

/// Pack with an explicit overflow policy.
pub fn construct_with_policy(
    id: u32,
    lod: u32,
    existing: u32,
    policy: OverflowPolicy,
) -> Result<u32, SubIdError> {
    match policy {
        OverflowPolicy::Truncate => Ok(construct(id, lod, existing)),
        OverflowPolicy::Reject => {
            if id > MAX_ID {
                return Err(SubIdError::IdOutOfRange(id));
            }
            if lod > MAX_LOD {
                return Err(SubIdError::LodOutOfRange(lod));
            }
            Ok(pack(id, lod, existing))
        }
    }
}

fn pack(id: u32, lod: u32, existing: u32) -> u32 {
    let untouched = existing & !(ID_MASK | LOD_MASK);
    let packed = untouched | (id & ID_MASK) | ((lod << LOD_SHIFT) & LOD_MASK);
    debug_assert_eq!(
        packed & !(ID_MASK | LOD_MASK),
        untouched,
        "packing id {id} lod {lod} modified bits outside the id and LOD fields"
    );
    packed
}

//! Compatibility helpers for products and callers that predate typed
//! registration: type and sub id inference, and bit-flag platforms.

pub mod inference;
pub mod platform;
pub mod sniff;
pub mod table;

pub use inference::{infer_asset_type, infer_sub_id, parse_variant_suffix, VariantSuffix};
pub use platform::{LegacyPlatform, UNKNOWN_PLATFORM};
pub use sniff::sniff_asset_type;

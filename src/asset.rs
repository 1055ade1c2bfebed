//! Asset type and asset id value types.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// UUID classifying a product's content. The nil UUID means "unknown".
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AssetType(Uuid);

impl AssetType {
    pub const NULL: AssetType = AssetType(Uuid::nil());

    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Parse a UUID with or without surrounding braces.
    pub fn parse(text: &str) -> Option<Self> {
        parse_uuid(text).map(Self)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_nil()
    }

    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_braced(f, &self.0)
    }
}

impl From<Uuid> for AssetType {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Identity of a persisted product: source GUID plus product sub id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct AssetId {
    pub guid: Uuid,
    pub sub_id: u32,
}

impl AssetId {
    pub fn new(guid: Uuid, sub_id: u32) -> Self {
        Self { guid, sub_id }
    }

    pub fn is_valid(&self) -> bool {
        !self.guid.is_nil()
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_braced(f, &self.guid)?;
        write!(f, ":{:x}", self.sub_id)
    }
}

pub(crate) fn parse_uuid(text: &str) -> Option<Uuid> {
    let trimmed = text.trim();
    let inner = trimmed.strip_prefix('{').and_then(|t| t.strip_suffix('}')).unwrap_or(trimmed);
    Uuid::parse_str(inner).ok()
}

fn write_braced(f: &mut fmt::Formatter<'_>, uuid: &Uuid) -> fmt::Result {
    write!(f, "{{{}}}", uuid.hyphenated().to_string().to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_braced_and_bare() {
        let braced = AssetType::parse("{59D5E20B-34DB-4D8E-B867-D33CC2556355}").unwrap();
        let bare = AssetType::parse("59d5e20b-34db-4d8e-b867-d33cc2556355").unwrap();
        assert_eq!(braced, bare);
        assert_eq!(braced, AssetType::from_u128(0x59D5E20B_34DB_4D8E_B867_D33CC2556355));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(AssetType::parse("not-a-uuid").is_none());
        assert!(AssetType::parse("").is_none());
    }

    #[test]
    fn test_display_is_braced_uppercase() {
        let ty = AssetType::from_u128(0x59D5E20B_34DB_4D8E_B867_D33CC2556355);
        assert_eq!(ty.to_string(), "{59D5E20B-34DB-4D8E-B867-D33CC2556355}");
    }

    #[test]
    fn test_null_type() {
        assert!(AssetType::NULL.is_null());
        assert!(AssetType::default().is_null());
    }

    #[test]
    fn test_asset_id_display() {
        let id = AssetId::new(Uuid::from_u128(1), 0x1f);
        assert_eq!(id.to_string(), "{00000000-0000-0000-0000-000000000001}:1f");
        assert!(id.is_valid());
        assert!(!AssetId::default().is_valid());
    }
}

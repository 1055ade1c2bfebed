//! Bit-flag platform identifiers for callers that predate string platforms.

use bitflags::bitflags;

use crate::platform::PlatformInfo;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct LegacyPlatform: u32 {
        const PC = 1 << 0;
        const ANDROID = 1 << 1;
        const IOS = 1 << 2;
        const MAC = 1 << 3;
        const PROVO = 1 << 4;
        const SALEM = 1 << 5;
        const JASPER = 1 << 6;
        const LINUX = 1 << 7;
    }
}

/// Returned for flags that do not name exactly one platform.
pub const UNKNOWN_PLATFORM: &str = "unknown platform";

const MAPPING: &[(LegacyPlatform, &str)] = &[
    (LegacyPlatform::PC, "pc"),
    (LegacyPlatform::ANDROID, "android"),
    (LegacyPlatform::IOS, "ios"),
    (LegacyPlatform::MAC, "mac"),
    (LegacyPlatform::PROVO, "provo"),
    (LegacyPlatform::SALEM, "salem"),
    (LegacyPlatform::JASPER, "jasper"),
    (LegacyPlatform::LINUX, "linux"),
];

impl LegacyPlatform {
    /// Case-insensitive lookup; unknown identifiers map to the empty set.
    pub fn from_identifier(identifier: &str) -> Self {
        MAPPING
            .iter()
            .find(|(_, name)| name.eq_ignore_ascii_case(identifier))
            .map(|(flag, _)| *flag)
            .unwrap_or_else(LegacyPlatform::empty)
    }

    pub fn identifier(self) -> &'static str {
        MAPPING
            .iter()
            .find(|(flag, _)| *flag == self)
            .map(|(_, name)| *name)
            .unwrap_or(UNKNOWN_PLATFORM)
    }

    /// Union of the flags of every recognized platform in `platforms`.
    pub fn from_platforms(platforms: &[PlatformInfo]) -> Self {
        platforms
            .iter()
            .map(|p| Self::from_identifier(&p.identifier))
            .fold(Self::empty(), |acc, flag| acc | flag)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_names() {
        for (flag, name) in MAPPING {
            assert_eq!(LegacyPlatform::from_identifier(name), *flag);
            assert_eq!(flag.identifier(), *name);
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(LegacyPlatform::from_identifier("PC"), LegacyPlatform::PC);
        assert_eq!(LegacyPlatform::from_identifier("Android"), LegacyPlatform::ANDROID);
    }

    #[test]
    fn test_unknown() {
        assert_eq!(LegacyPlatform::from_identifier("xbox"), LegacyPlatform::empty());
        assert_eq!(LegacyPlatform::empty().identifier(), UNKNOWN_PLATFORM);
        assert_eq!((LegacyPlatform::PC | LegacyPlatform::IOS).identifier(), UNKNOWN_PLATFORM);
    }

    #[test]
    fn test_from_platforms() {
        let platforms = vec![
            PlatformInfo::new("pc", ["tools"]),
            PlatformInfo::new("ios", ["mobile"]),
            PlatformInfo::new("server", ["headless"]),
        ];
        assert_eq!(
            LegacyPlatform::from_platforms(&platforms),
            LegacyPlatform::PC | LegacyPlatform::IOS
        );
    }
}

use serde::{Deserialize, Serialize};

/// Platform identifiers a provider can declare support for.
///
/// `Win32Gte8` (Windows 8 or newer) and `MountainLion` (macOS 10.8 or newer)
/// refine the generic entries and take precedence over them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKey {
    Win32,
    Darwin,
    Linux,
    Win32Gte8,
    MountainLion,
}

impl PlatformKey {
    fn precedence(self) -> u8 {
        match self {
            Self::Win32Gte8 => 2,
            Self::MountainLion => 1,
            Self::Win32 | Self::Darwin | Self::Linux => 0,
        }
    }
}

/// The set of platform keys matching the running machine, most specific first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Platform {
    keys: Vec<PlatformKey>,
}

impl Platform {
    pub fn new(keys: impl IntoIterator<Item = PlatformKey>) -> Self {
        let mut keys: Vec<PlatformKey> = keys.into_iter().collect();
        keys.sort_by_key(|k| std::cmp::Reverse(k.precedence()));
        keys.dedup();
        Self { keys }
    }

    pub fn keys(&self) -> &[PlatformKey] {
        &self.keys
    }

    pub fn matches(&self, key: PlatformKey) -> bool {
        self.keys.contains(&key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_ordered_by_precedence() {
        let platform = Platform::new([PlatformKey::Win32, PlatformKey::Win32Gte8]);
        assert_eq!(platform.keys(), &[PlatformKey::Win32Gte8, PlatformKey::Win32]);

        let platform = Platform::new([PlatformKey::Darwin, PlatformKey::MountainLion]);
        assert_eq!(platform.keys(), &[PlatformKey::MountainLion, PlatformKey::Darwin]);
        assert!(!platform.matches(PlatformKey::Linux));
    }
}

//! Decoding of RenderWare library version words.
//!
//! Section headers carry a 32-bit word identifying the RenderWare release that
//! wrote them. Three shapes of that word are found in the wild:
//!
//! - Streams written before 3.1 store the version compactly, e.g. `0x0310`,
//!   which expands to `0x31000` by shifting it left a byte.
//! - Later streams store a library id stamp such as `0x1803FFFF`, packing the
//!   version in the high 16 bits and a build number in the low 16 bits.
//! - Tooling (and the tables below) use the already expanded `0x3Mmrb` form,
//!   e.g. `0x36003` for 3.6.0.3.

use std::str::FromStr;

use derive_more::Display;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Game release a RenderWare version is associated with
#[derive(Debug, Display, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GameLabel {
    #[display("GTA III")]
    Gta3,
    #[display("Vice City")]
    ViceCity,
    #[display("San Andreas")]
    SanAndreas,
    #[display("Liberty City Stories")]
    LibertyCityStories,
    #[display("Vice City Stories")]
    ViceCityStories,
    #[display("Unknown")]
    Unknown,
}

/// Expanded versions shipped by each game
const KNOWN_VERSIONS: &[(u32, GameLabel)] = &[
    (0x31001, GameLabel::Gta3),
    (0x33002, GameLabel::ViceCity),
    (0x34003, GameLabel::SanAndreas),
    (0x36003, GameLabel::SanAndreas),
    (0x35000, GameLabel::LibertyCityStories),
    (0x35002, GameLabel::ViceCityStories),
];

/// Library id stamps accepted as valid even though they are not expanded versions
const EXTENDED_STAMPS: &[u32] = &[
    0x0800FFFF, 0x1003FFFF, 0x1005FFFF, 0x1401FFFF, 0x1400FFFF, 0x1803FFFF, 0x1C020037,
];

const EXPANDED_RANGE: std::ops::RangeInclusive<u32> = 0x30000..=0x3FFFF;

/// Decoded library version word
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct VersionInfo {
    /// The word as stored in the section header
    pub raw: u32,
    /// Version in its expanded `0x3Mmrb` form
    pub version: u32,
    /// Build number, only present in library id stamps
    pub build: Option<u16>,
    /// Game this version belongs to
    pub game: GameLabel,
}

/// Decode a raw library version word.
pub fn decode_version(raw: u32) -> VersionInfo {
    let (version, build) = if EXPANDED_RANGE.contains(&raw) {
        (raw, None)
    } else if raw & 0xFFFF_0000 != 0 {
        let version = (((raw >> 14) & 0x3FF00) + 0x30000) | ((raw >> 16) & 0x3F);
        (version, Some((raw & 0xFFFF) as u16))
    } else {
        (raw << 8, None)
    };

    let game = KNOWN_VERSIONS
        .iter()
        .find(|(known, _)| *known == version)
        .map(|(_, game)| *game)
        .unwrap_or(GameLabel::Unknown);

    VersionInfo {
        raw,
        version,
        build,
        game,
    }
}

impl VersionInfo {
    pub fn major(&self) -> u32 {
        (self.version >> 16) & 0xFF
    }

    pub fn minor(&self) -> u32 {
        (self.version >> 12) & 0xF
    }

    pub fn revision(&self) -> u32 {
        (self.version >> 8) & 0xF
    }

    pub fn patch(&self) -> u32 {
        self.version & 0xFF
    }

    /// Dotted form of the version, e.g. `3.6.0.3`
    pub fn version_string(&self) -> String {
        format!(
            "{}.{}.{}.{}",
            self.major(),
            self.minor(),
            self.revision(),
            self.patch()
        )
    }

    /// Whether the word looks like something a RenderWare release wrote
    pub fn is_valid(&self) -> bool {
        EXPANDED_RANGE.contains(&self.version) || EXTENDED_STAMPS.contains(&self.raw)
    }
}

impl From<u32> for VersionInfo {
    fn from(value: u32) -> Self {
        decode_version(value)
    }
}

impl std::fmt::Display for VersionInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.game {
            GameLabel::Unknown => f.write_str(&self.version_string()),
            game => write!(f, "{} ({})", self.version_string(), game),
        }
    }
}

impl FromStr for VersionInfo {
    type Err = Error;

    /// Parses `major.minor.revision[.patch]` back into its expanded word
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || Error::InvalidVersionString(s.to_owned());

        let parts = s
            .trim()
            .split('.')
            .map(u32::from_str)
            .collect::<Result<Vec<u32>, _>>()
            .map_err(|_| invalid())?;

        let [major, minor, revision, patch] = match parts[..] {
            [major, minor, revision] => [major, minor, revision, 0],
            [major, minor, revision, patch] => [major, minor, revision, patch],
            _ => return Err(invalid()),
        };
        if major > 0xFF || minor > 0xF || revision > 0xF || patch > 0xFF {
            return Err(invalid());
        }

        // Only expanded words decode back to the same version
        let word = (major << 16) | (minor << 12) | (revision << 8) | patch;
        if !EXPANDED_RANGE.contains(&word) {
            return Err(invalid());
        }

        Ok(decode_version(word))
    }
}

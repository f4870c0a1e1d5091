//! Profile Schema Types
//!
//! A profile is a named bundle of annotation settings stored as TOML:
//!
//! ```toml
//! [profile]
//! name = "fast-extruder"
//! description = "Higher maximum rate"
//!
//! [settings]
//! dwell = false
//!
//! [settings.strategy]
//! mode = "bit-expression"
//! maximum_extrusion_rate = 120
//! ```

use serde::Deserialize;

use crate::settings::Settings;

/// Root profile file structure (matches TOML)
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProfileFile {
    pub profile: ProfileMeta,
    #[serde(default)]
    pub settings: Settings,
}

/// Profile metadata
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct ProfileMeta {
    pub name: String,
    pub description: Option<String>,
}

/// Runtime profile
#[derive(Debug, Clone, PartialEq)]
pub struct Profile {
    pub name: String,
    pub description: Option<String>,
    pub settings: Settings,
}

impl From<ProfileFile> for Profile {
    fn from(file: ProfileFile) -> Self {
        Self {
            name: file.profile.name,
            description: file.profile.description,
            settings: file.settings,
        }
    }
}

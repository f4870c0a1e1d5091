//! Extruder profiles
//!
//! Named settings bundles, loaded from the built-in set and from profile
//! directories, plus the slicer plugin's JSON settings format.

pub mod cura;
pub mod manager;
pub mod schema;

pub use cura::CuraSettings;
pub use manager::{
    load_settings_file, LoadedProfile, ProfileManager, ProfilePriority, Selection,
    DEFAULT_PROFILE,
};
pub use schema::{Profile, ProfileFile, ProfileMeta};

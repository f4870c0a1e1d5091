//! Profile management
//!
//! This module handles:
//! - Loading profile definitions from TOML files
//! - Loading priority: built-in < user-global < workspace < custom directory
//! - Profile selection via modeline, command-line or built-in default
//! - Reading standalone settings files (TOML or slicer JSON)

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use anyhow::{anyhow, Context, Result};
use regex::Regex;

use crate::config::Config;
use crate::profile::cura::CuraSettings;
use crate::profile::schema::{Profile, ProfileFile};
use crate::settings::Settings;

/// Profile used when neither a modeline nor the command line names one
pub const DEFAULT_PROFILE: &str = "bit-expression";

const BUILT_IN_PROFILES: [(&str, &str); 2] = [
    (
        "bit-expression.toml",
        include_str!("../../resources/profiles/bit-expression.toml"),
    ),
    (
        "state-change.toml",
        include_str!("../../resources/profiles/state-change.toml"),
    ),
];

/// Number of lines at each end of a file searched for a modeline
const MODELINE_SCAN_LINES: usize = 5;

/// Represents the loading priority of profiles
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ProfilePriority {
    BuiltIn = 0,
    UserGlobal = 1,
    Workspace = 2,
    Custom = 3,
}

/// A loaded profile with its source and priority
#[derive(Debug, Clone)]
pub struct LoadedProfile {
    pub profile: Profile,
    pub priority: ProfilePriority,
    pub source_path: Option<PathBuf>,
}

/// Where the effective profile came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    Modeline,
    CommandLine,
    Default,
}

/// Loads profiles and resolves which one a run uses
#[derive(Debug, Default)]
pub struct ProfileManager {
    profiles: HashMap<String, LoadedProfile>,
    /// Directories to scan, lowest priority first
    profile_dirs: Vec<(PathBuf, ProfilePriority)>,
    /// Profile explicitly named on the command line
    cli_profile: Option<String>,
}

impl ProfileManager {
    /// Create a manager for the directories and selection in `config`
    pub fn new(config: &Config) -> Self {
        Self {
            profiles: HashMap::new(),
            profile_dirs: config.profile_dirs.clone(),
            cli_profile: config.cli_profile.clone(),
        }
    }

    /// Create a manager scanning only the given directories
    pub fn with_dirs(profile_dirs: Vec<(PathBuf, ProfilePriority)>) -> Self {
        Self {
            profile_dirs,
            ..Self::default()
        }
    }

    pub fn set_cli_profile(&mut self, name: Option<String>) {
        self.cli_profile = name;
    }

    /// Load built-in profiles, then every configured directory
    ///
    /// A file that fails to parse is skipped with a warning; an unreadable
    /// directory is an error.
    pub fn load_all(&mut self) -> Result<()> {
        let mut profiles = HashMap::new();

        self.load_built_in_profiles(&mut profiles)?;

        for (dir, priority) in &self.profile_dirs {
            self.load_profiles_from_directory(dir, *priority, &mut profiles)?;
        }

        log::info!("Loaded {} extruder profiles", profiles.len());
        self.profiles = profiles;
        Ok(())
    }

    fn load_built_in_profiles(&self, profiles: &mut HashMap<String, LoadedProfile>) -> Result<()> {
        for (file_name, content) in BUILT_IN_PROFILES {
            let profile = parse_profile_content(content, None)
                .with_context(|| format!("Failed to load built-in profile {file_name}"))?;
            insert_profile(profiles, profile, ProfilePriority::BuiltIn, None);
        }
        Ok(())
    }

    fn load_profiles_from_directory(
        &self,
        dir: &Path,
        priority: ProfilePriority,
        profiles: &mut HashMap<String, LoadedProfile>,
    ) -> Result<()> {
        if !dir.exists() {
            return Ok(());
        }

        let mut paths = fs::read_dir(dir)
            .with_context(|| format!("Failed to read profile directory: {}", dir.display()))?
            .filter_map(|entry| entry.ok().map(|entry| entry.path()))
            .filter(|path| path.extension().and_then(|s| s.to_str()) == Some("toml"))
            .collect::<Vec<_>>();
        paths.sort();

        for path in paths {
            match load_profile_file(&path) {
                Ok(profile) => {
                    log::debug!("Loaded profile '{}' from {}", profile.name, path.display());
                    insert_profile(profiles, profile, priority, Some(path));
                }
                Err(e) => log::warn!("Failed to load profile file {}: {e:#}", path.display()),
            }
        }

        Ok(())
    }

    /// Get a profile by name
    pub fn get_profile(&self, name: &str) -> Option<&LoadedProfile> {
        self.profiles.get(name)
    }

    /// List all available profile names, sorted
    pub fn list_profile_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.profiles.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Detect a profile name from a modeline in the G-code
    ///
    /// Only the first and last few lines are searched, e.g.
    /// `; extruder_profile=state-change`.
    pub fn detect_modeline_profile(&self, content: &str) -> Option<String> {
        static MODELINE: OnceLock<Option<Regex>> = OnceLock::new();
        let modeline = MODELINE
            .get_or_init(|| Regex::new(r"^\s*;.*\bextruder_profile\s*=\s*([\w.-]+)").ok())
            .as_ref()?;

        let lines: Vec<&str> = content.lines().collect();
        let check_lines: Vec<&str> = if lines.len() <= MODELINE_SCAN_LINES * 2 {
            lines
        } else {
            let mut check = Vec::with_capacity(MODELINE_SCAN_LINES * 2);
            check.extend_from_slice(&lines[..MODELINE_SCAN_LINES]);
            check.extend_from_slice(&lines[lines.len() - MODELINE_SCAN_LINES..]);
            check
        };

        check_lines.into_iter().find_map(|line| {
            modeline
                .captures(line)
                .and_then(|captures| captures.get(1))
                .map(|name| name.as_str().to_string())
        })
    }

    /// Resolve the profile for `content`
    ///
    /// Priority: modeline > command line > built-in default. Naming a
    /// profile that does not exist is an error.
    pub fn effective_profile(&self, content: &str) -> Result<(&LoadedProfile, Selection)> {
        let (name, selection) = match self.detect_modeline_profile(content) {
            Some(name) => (name, Selection::Modeline),
            None => match &self.cli_profile {
                Some(name) => (name.clone(), Selection::CommandLine),
                None => (DEFAULT_PROFILE.to_string(), Selection::Default),
            },
        };

        let profile = self.get_profile(&name).ok_or_else(|| {
            anyhow!(
                "unknown extruder profile '{name}' (available: {})",
                self.list_profile_names().join(", ")
            )
        })?;
        Ok((profile, selection))
    }
}

fn insert_profile(
    profiles: &mut HashMap<String, LoadedProfile>,
    profile: Profile,
    priority: ProfilePriority,
    source_path: Option<PathBuf>,
) {
    // Equal priority replaces, so later files in a directory win
    let should_load = match profiles.get(&profile.name) {
        Some(existing) => priority >= existing.priority,
        None => true,
    };

    if should_load {
        profiles.insert(
            profile.name.clone(),
            LoadedProfile {
                profile,
                priority,
                source_path,
            },
        );
    }
}

/// Load a single profile file
pub fn load_profile_file(path: &Path) -> Result<Profile> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile file: {}", path.display()))?;
    parse_profile_content(&content, Some(path))
}

/// Parse profile content from a TOML string
pub fn parse_profile_content(content: &str, source_path: Option<&Path>) -> Result<Profile> {
    let file: ProfileFile = toml::from_str(content).with_context(|| match source_path {
        Some(path) => format!("Failed to parse profile TOML: {}", path.display()),
        None => "Failed to parse built-in profile TOML".to_string(),
    })?;
    Ok(Profile::from(file))
}

/// Read a standalone settings file
///
/// `.json` files use the slicer plugin's key/value format; anything else is
/// read as a TOML settings table.
pub fn load_settings_file(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;

    if path.extension().and_then(|s| s.to_str()) == Some("json") {
        let cura = CuraSettings::from_json(&content)
            .with_context(|| format!("Failed to parse settings JSON: {}", path.display()))?;
        Ok(cura.into_settings())
    } else {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse settings TOML: {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::StrategySettings;

    fn loaded() -> ProfileManager {
        let mut manager = ProfileManager::with_dirs(Vec::new());
        manager.load_all().unwrap();
        manager
    }

    #[test]
    fn test_built_in_profiles() {
        let manager = loaded();
        assert_eq!(
            manager.list_profile_names(),
            vec!["bit-expression", "state-change"]
        );

        let bits = manager.get_profile("bit-expression").unwrap();
        assert_eq!(bits.priority, ProfilePriority::BuiltIn);
        assert_eq!(bits.profile.settings, Settings::default());

        let state = manager.get_profile("state-change").unwrap();
        assert!(matches!(
            state.profile.settings.strategy,
            StrategySettings::StateChange(_)
        ));
        assert!(state.profile.settings.compile().is_ok());
    }

    #[test]
    fn test_modeline_detection() {
        let manager = loaded();
        assert_eq!(
            manager.detect_modeline_profile("; extruder_profile=state-change\nG1 X1\n"),
            Some("state-change".to_string())
        );
        assert_eq!(
            manager.detect_modeline_profile(";vim: extruder_profile = fast.v2\n"),
            Some("fast.v2".to_string())
        );
        assert_eq!(manager.detect_modeline_profile("G1 X1\n"), None);
        // not a comment
        assert_eq!(
            manager.detect_modeline_profile("M117 extruder_profile=state-change\n"),
            None
        );
    }

    #[test]
    fn test_modeline_only_near_the_ends() {
        let manager = loaded();
        let mut content = "G1 X1\n".repeat(6);
        content.push_str("; extruder_profile=state-change\n");
        content.push_str(&"G1 X1\n".repeat(6));
        assert_eq!(manager.detect_modeline_profile(&content), None);

        content.push_str("; extruder_profile=state-change\n");
        assert_eq!(
            manager.detect_modeline_profile(&content),
            Some("state-change".to_string())
        );
    }

    #[test]
    fn test_effective_profile_precedence() {
        let mut manager = loaded();

        let (profile, selection) = manager.effective_profile("G1 X1\n").unwrap();
        assert_eq!(profile.profile.name, DEFAULT_PROFILE);
        assert_eq!(selection, Selection::Default);

        manager.set_cli_profile(Some("state-change".to_string()));
        let (profile, selection) = manager.effective_profile("G1 X1\n").unwrap();
        assert_eq!(profile.profile.name, "state-change");
        assert_eq!(selection, Selection::CommandLine);

        let (profile, selection) = manager
            .effective_profile("; extruder_profile=bit-expression\n")
            .unwrap();
        assert_eq!(profile.profile.name, "bit-expression");
        assert_eq!(selection, Selection::Modeline);
    }

    #[test]
    fn test_unknown_profile_is_an_error() {
        let mut manager = loaded();
        manager.set_cli_profile(Some("missing".to_string()));
        let err = manager.effective_profile("").unwrap_err();
        assert!(err.to_string().contains("missing"));
        assert!(err.to_string().contains("state-change"));
    }
}

//! Application settings loaded from config.toml
//!
//! Every section is optional. A missing file yields the built-in defaults, which
//! match the behaviour of a small self-hosted family installation: at most 20
//! members per family, one family per user, cancelled reservations deleted.

use crate::errors::{Error, Result};
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Environment variable naming the settings file
pub const CONFIG_PATH_ENV: &str = "WISHLIST_CONFIG";

/// Settings file used when [`CONFIG_PATH_ENV`] is unset
pub const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration structure representing the entire config.toml file
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Family membership rules
    pub families: FamilySettings,
    /// Reservation lifecycle rules
    pub reservations: ReservationSettings,
    /// Login lockout rules
    pub security: SecuritySettings,
    /// Request throttling for the API surface
    pub rate_limit: RateLimitSettings,
}

/// Whether a user may belong to more than one family at a time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MembershipPolicy {
    /// Joining through `leave_and_join` drops every other active membership
    #[default]
    SingleFamily,
    /// Memberships accumulate; `leave_and_join` only joins
    MultiFamily,
}

/// What happens to a reservation when its holder cancels it
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancellationMode {
    /// Delete the reservation row
    #[default]
    Delete,
    /// Keep the row with status CANCELLED for history
    Retain,
}

/// `[families]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FamilySettings {
    /// Hard cap on active members per family
    pub max_members: u64,
    /// Single- or multi-family membership
    pub membership_policy: MembershipPolicy,
}

impl Default for FamilySettings {
    fn default() -> Self {
        Self {
            max_members: 20,
            membership_policy: MembershipPolicy::SingleFamily,
        }
    }
}

/// `[reservations]` section
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReservationSettings {
    /// Cancellation behaviour
    pub on_cancel: CancellationMode,
}

/// `[security]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SecuritySettings {
    /// Failed logins before the account is locked
    pub max_failed_logins: i32,
    /// Length of a lockout
    pub lockout_minutes: i64,
}

impl Default for SecuritySettings {
    fn default() -> Self {
        Self {
            max_failed_logins: 5,
            lockout_minutes: 15,
        }
    }
}

/// `[rate_limit]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RateLimitSettings {
    /// Requests allowed per key and window
    pub max_requests: u32,
    /// Window length
    pub window_seconds: u64,
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            max_requests: 30,
            window_seconds: 60,
        }
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
/// - A value fails validation (e.g. `max_members` of zero)
pub fn load_settings<P: AsRef<Path>>(path: P) -> Result<Settings> {
    let path_ref = path.as_ref();
    debug!("Loading settings from {:?}", path_ref);
    let contents = std::fs::read_to_string(path_ref).map_err(|e| Error::Config {
        message: format!("Failed to read config file {}: {e}", path_ref.display()),
    })?;
    parse_settings(&contents)
}

/// Parses and validates settings from TOML text.
pub fn parse_settings(contents: &str) -> Result<Settings> {
    let settings: Settings = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse config.toml: {e}"),
    })?;

    if settings.families.max_members == 0 {
        return Err(Error::Config {
            message: "families.max_members must be at least 1".to_string(),
        });
    }
    if settings.security.max_failed_logins < 1 {
        return Err(Error::Config {
            message: "security.max_failed_logins must be at least 1".to_string(),
        });
    }
    if settings.rate_limit.window_seconds == 0 {
        return Err(Error::Config {
            message: "rate_limit.window_seconds must be at least 1".to_string(),
        });
    }

    Ok(settings)
}

/// Loads settings from `$WISHLIST_CONFIG` or `./config.toml`, falling back to
/// defaults when the file does not exist.
pub fn load_default_settings() -> Result<Settings> {
    let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    if Path::new(&path).exists() {
        load_settings(&path)
    } else {
        info!("No settings file at {path}; using defaults.");
        Ok(Settings::default())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_settings() {
        let toml_str = r#"
            [families]
            max_members = 12
            membership_policy = "multi_family"

            [reservations]
            on_cancel = "retain"

            [security]
            max_failed_logins = 3
            lockout_minutes = 30

            [rate_limit]
            max_requests = 10
            window_seconds = 5
        "#;

        let settings = parse_settings(toml_str).unwrap();
        assert_eq!(settings.families.max_members, 12);
        assert_eq!(
            settings.families.membership_policy,
            MembershipPolicy::MultiFamily
        );
        assert_eq!(settings.reservations.on_cancel, CancellationMode::Retain);
        assert_eq!(settings.security.max_failed_logins, 3);
        assert_eq!(settings.security.lockout_minutes, 30);
        assert_eq!(settings.rate_limit.max_requests, 10);
        assert_eq!(settings.rate_limit.window_seconds, 5);
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let settings = parse_settings("").unwrap();
        assert_eq!(settings.families.max_members, 20);
        assert_eq!(
            settings.families.membership_policy,
            MembershipPolicy::SingleFamily
        );
        assert_eq!(settings.reservations.on_cancel, CancellationMode::Delete);
        assert_eq!(settings.security.max_failed_logins, 5);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let settings = parse_settings("[families]\nmax_members = 4\n").unwrap();
        assert_eq!(settings.families.max_members, 4);
        assert_eq!(
            settings.families.membership_policy,
            MembershipPolicy::SingleFamily
        );
    }

    #[test]
    fn test_rejects_zero_member_cap() {
        let result = parse_settings("[families]\nmax_members = 0\n");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }

    #[test]
    fn test_rejects_unknown_policy() {
        let result = parse_settings("[families]\nmembership_policy = \"sometimes\"\n");
        assert!(matches!(result.unwrap_err(), Error::Config { message: _ }));
    }
}

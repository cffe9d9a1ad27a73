/// Database connection and schema management
pub mod database;

/// Application settings loaded from config.toml
pub mod settings;

pub use settings::{
    CancellationMode, FamilySettings, MembershipPolicy, RateLimitSettings, ReservationSettings,
    SecuritySettings, Settings,
};

//! Configuration types for shelfsync
//!
//! This module defines all configuration structures used throughout the crate.

use serde::{Deserialize, Serialize};

/// Main synchronizer configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,

    /// Days between loan date and due date when the caller gives none
    #[serde(default = "default_loan_term_days")]
    pub loan_term_days: u32,

    /// How `compute_stats` classifies overdue loans
    #[serde(default)]
    pub overdue_policy: OverduePolicy,

    /// Guard the available counter with a conditional update on issue
    ///
    /// Off by default: without it two writers can both take the last copy.
    #[serde(default)]
    pub availability_guard: bool,

    /// Capacity of the synchronizer event channel
    ///
    /// When full, new events are dropped (with a warning log).
    ///
    /// Default: 256 events
    #[serde(default = "default_event_channel_capacity")]
    pub event_channel_capacity: usize,
}

impl SyncConfig {
    /// Create a new configuration with defaults
    pub fn new() -> Self {
        Self {
            store: StoreConfig::default(),
            loan_term_days: default_loan_term_days(),
            overdue_policy: OverduePolicy::default(),
            availability_guard: false,
            event_channel_capacity: default_event_channel_capacity(),
        }
    }

    /// Set the record store configuration
    pub fn with_store(mut self, store: StoreConfig) -> Self {
        self.store = store;
        self
    }

    /// Set the default loan term
    pub fn with_loan_term_days(mut self, days: u32) -> Self {
        self.loan_term_days = days;
        self
    }

    /// Set the overdue policy
    pub fn with_overdue_policy(mut self, policy: OverduePolicy) -> Self {
        self.overdue_policy = policy;
        self
    }

    /// Enable or disable the availability guard
    pub fn with_availability_guard(mut self, enabled: bool) -> Self {
        self.availability_guard = enabled;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        if self.loan_term_days == 0 {
            return Err(crate::Error::config("Loan term must be at least one day"));
        }
        if self.loan_term_days > MAX_LOAN_TERM_DAYS {
            return Err(crate::Error::config(format!(
                "Loan term must be at most {} days, got {}",
                MAX_LOAN_TERM_DAYS, self.loan_term_days
            )));
        }
        if self.event_channel_capacity == 0 {
            return Err(crate::Error::config("Event channel capacity must be > 0"));
        }

        self.store.validate()
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Upper bound accepted for a loan term
pub const MAX_LOAN_TERM_DAYS: u32 = 365;

/// Source of truth for the overdue classification in aggregates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OverduePolicy {
    /// Overdue = not returned and due date before today
    #[default]
    Derived,
    /// Overdue = stored status value `atrasado`
    Stored,
}

impl std::str::FromStr for OverduePolicy {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "derived" => Ok(OverduePolicy::Derived),
            "stored" => Ok(OverduePolicy::Stored),
            other => Err(crate::Error::config(format!(
                "Unknown overdue policy '{}'. Valid: derived, stored",
                other
            ))),
        }
    }
}

/// Record store configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StoreConfig {
    /// In-memory store (not persistent)
    #[default]
    Memory,

    /// JSON-file store
    File {
        /// Path to the store file
        path: String,
    },

    /// PostgREST / Supabase HTTP API
    Postgrest {
        /// Project URL (e.g. "https://xyz.supabase.co")
        url: String,
        /// API key, sent as `apikey` header and bearer token
        api_key: String,
        /// Optional schema profile (`Accept-Profile` / `Content-Profile`)
        #[serde(default)]
        schema: Option<String>,
    },

    /// Custom store
    Custom {
        /// Factory name to use
        factory: String,
        /// Custom configuration data
        config: serde_json::Value,
    },
}

impl StoreConfig {
    /// Validate the store configuration
    pub fn validate(&self) -> Result<(), crate::Error> {
        match self {
            StoreConfig::Memory => Ok(()),
            StoreConfig::File { path } => {
                if path.is_empty() {
                    return Err(crate::Error::config("File store path cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Postgrest { url, api_key, .. } => {
                if url.is_empty() {
                    return Err(crate::Error::config("PostgREST URL cannot be empty"));
                }
                if !url.starts_with("https://") && !url.starts_with("http://") {
                    return Err(crate::Error::config(format!(
                        "PostgREST URL must use HTTP or HTTPS scheme. Got: {}",
                        url
                    )));
                }
                if api_key.is_empty() {
                    return Err(crate::Error::config("PostgREST API key cannot be empty"));
                }
                Ok(())
            }
            StoreConfig::Custom { factory, config } => {
                if factory.is_empty() {
                    return Err(crate::Error::config("Custom store factory cannot be empty"));
                }
                if config.is_null() {
                    return Err(crate::Error::config("Custom store config cannot be null"));
                }
                Ok(())
            }
        }
    }

    /// Get the store type name
    pub fn type_name(&self) -> &str {
        match self {
            StoreConfig::Memory => "memory",
            StoreConfig::File { .. } => "file",
            StoreConfig::Postgrest { .. } => "postgrest",
            StoreConfig::Custom { factory, .. } => factory,
        }
    }
}

fn default_loan_term_days() -> u32 {
    14
}

fn default_event_channel_capacity() -> usize {
    256
}

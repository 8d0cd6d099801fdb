// # shelfsync - Library status report
//
// This binary is a THIN integration layer over shelfsync-core:
// - DO NOT add synchronization or availability logic here
// - All library logic lives in shelfsync-core
// - Configuration is via environment variables ONLY
//
// The binary is responsible for:
// 1. Reading configuration from environment variables
// 2. Initializing logging and the runtime
// 3. Registering record stores and building the configured one
// 4. Loading the mirror and logging a status report
//
// ## Configuration
//
// ### Record Store
// - `SHELFSYNC_STORE_TYPE`: Type of record store (file, memory, postgrest)
// - `SHELFSYNC_STORE_PATH`: Path to the store file (for file)
// - `SHELFSYNC_POSTGREST_URL`: Project URL (for postgrest)
// - `SHELFSYNC_POSTGREST_API_KEY`: API key (for postgrest)
// - `SHELFSYNC_POSTGREST_SCHEMA`: Schema profile (optional, for postgrest)
//
// ### Synchronizer
// - `SHELFSYNC_LOAN_TERM_DAYS`: Default loan term in days
// - `SHELFSYNC_OVERDUE_POLICY`: How overdue loans are counted (derived, stored)
// - `SHELFSYNC_AVAILABILITY_GUARD`: Conditional decrement on issue (true, false)
//
// ### Logging
// - `SHELFSYNC_LOG_LEVEL`: trace, debug, info, warn, error
//
// ## Example
//
// ```bash
// export SHELFSYNC_STORE_TYPE=postgrest
// export SHELFSYNC_POSTGREST_URL=https://xyz.supabase.co
// export SHELFSYNC_POSTGREST_API_KEY=your_key
//
// shelfsync
// ```

use anyhow::{Context, Result};
use shelfsync_core::{
    LibrarySynchronizer, OverduePolicy, StoreConfig, StoreRegistry, SyncConfig, SyncEvent,
    SystemClock,
};
use std::env;
use std::process::ExitCode;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{Level, error, info, warn};
use tracing_subscriber::FmtSubscriber;

/// Number of rows shown in the report lists
const REPORT_LIMIT: usize = 5;

/// Exit codes for different termination scenarios
///
/// - 0: Report produced
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy)]
enum ShelfsyncExitCode {
    /// Report produced (normal exit)
    Clean = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<ShelfsyncExitCode> for ExitCode {
    fn from(code: ShelfsyncExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Application configuration
struct Config {
    store_type: String,
    store_path: Option<String>,
    postgrest_url: Option<String>,
    postgrest_api_key: Option<String>,
    postgrest_schema: Option<String>,
    loan_term_days: Option<u32>,
    overdue_policy: OverduePolicy,
    availability_guard: bool,
    log_level: String,
}

impl Config {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration from any key lookup
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Ok(Self {
            store_type: non_empty("SHELFSYNC_STORE_TYPE")
                .unwrap_or_else(|| "file".to_string())
                .to_lowercase(),
            store_path: non_empty("SHELFSYNC_STORE_PATH"),
            postgrest_url: non_empty("SHELFSYNC_POSTGREST_URL"),
            postgrest_api_key: non_empty("SHELFSYNC_POSTGREST_API_KEY"),
            postgrest_schema: non_empty("SHELFSYNC_POSTGREST_SCHEMA"),
            loan_term_days: non_empty("SHELFSYNC_LOAN_TERM_DAYS")
                .map(|s| {
                    s.trim()
                        .parse()
                        .with_context(|| format!("SHELFSYNC_LOAN_TERM_DAYS is not a number: '{}'", s))
                })
                .transpose()?,
            overdue_policy: non_empty("SHELFSYNC_OVERDUE_POLICY")
                .map(|s| OverduePolicy::from_str(s.trim()))
                .transpose()?
                .unwrap_or_default(),
            availability_guard: non_empty("SHELFSYNC_AVAILABILITY_GUARD")
                .map(|s| parse_flag("SHELFSYNC_AVAILABILITY_GUARD", &s))
                .transpose()?
                .unwrap_or(false),
            log_level: non_empty("SHELFSYNC_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
        })
    }

    /// Validate the configuration
    ///
    /// This checks:
    /// - Store type enumeration and the fields each type requires
    /// - URL scheme and API key sanity for postgrest
    /// - Loan term range
    /// - Log level
    fn validate(&self) -> Result<()> {
        match self.store_type.as_str() {
            "memory" => {
                eprintln!(
                    "WARNING: SHELFSYNC_STORE_TYPE=memory starts from an empty library. \
                    The report will show zeros."
                );
            }
            "file" => {
                let Some(path) = self.store_path.as_ref() else {
                    anyhow::bail!(
                        "SHELFSYNC_STORE_PATH is required when SHELFSYNC_STORE_TYPE=file. \
                        Set it via: export SHELFSYNC_STORE_PATH=/var/lib/shelfsync/library.json"
                    );
                };

                if let Some(parent) = std::path::Path::new(path).parent()
                    && !parent.as_os_str().is_empty()
                    && !parent.exists()
                {
                    anyhow::bail!(
                        "SHELFSYNC_STORE_PATH parent directory does not exist: {}. \
                        Create it first: mkdir -p {}",
                        parent.display(),
                        parent.display()
                    );
                }
            }
            "postgrest" => self.validate_postgrest()?,
            other => anyhow::bail!(
                "SHELFSYNC_STORE_TYPE '{}' is not supported. \
                Supported types: file, memory, postgrest",
                other
            ),
        }

        if let Some(days) = self.loan_term_days
            && !(1..=shelfsync_core::config::MAX_LOAN_TERM_DAYS).contains(&days)
        {
            anyhow::bail!(
                "SHELFSYNC_LOAN_TERM_DAYS must be between 1 and {}. Got: {}",
                shelfsync_core::config::MAX_LOAN_TERM_DAYS,
                days
            );
        }

        match self.log_level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!(
                "SHELFSYNC_LOG_LEVEL '{}' is not valid. \
                Valid levels: trace, debug, info, warn, error",
                self.log_level
            ),
        }

        Ok(())
    }

    fn validate_postgrest(&self) -> Result<()> {
        if !cfg!(feature = "postgrest") {
            anyhow::bail!(
                "SHELFSYNC_STORE_TYPE=postgrest requires the 'postgrest' feature. \
                Rebuild with: cargo build --features postgrest"
            );
        }

        let Some(url) = self.postgrest_url.as_ref() else {
            anyhow::bail!("SHELFSYNC_POSTGREST_URL is required when SHELFSYNC_STORE_TYPE=postgrest");
        };
        if !url.starts_with("https://") && !url.starts_with("http://") {
            anyhow::bail!(
                "SHELFSYNC_POSTGREST_URL must use HTTP or HTTPS scheme. Got: {}",
                url
            );
        }
        if url.starts_with("http://") {
            eprintln!(
                "WARNING: SHELFSYNC_POSTGREST_URL uses HTTP (not HTTPS). \
                The API key will travel in clear text."
            );
        }

        let Some(key) = self.postgrest_api_key.as_ref() else {
            anyhow::bail!(
                "SHELFSYNC_POSTGREST_API_KEY is required when SHELFSYNC_STORE_TYPE=postgrest. \
                Set it via: export SHELFSYNC_POSTGREST_API_KEY=your_key"
            );
        };

        // Check for obvious placeholder keys (common mistake)
        let key_lower = key.to_lowercase();
        if key_lower.contains("your_key") || key_lower.contains("replace_me") || key_lower == "key" {
            anyhow::bail!(
                "SHELFSYNC_POSTGREST_API_KEY appears to be a placeholder. \
                Use the API key from your project settings."
            );
        }

        Ok(())
    }

    fn store_config(&self) -> StoreConfig {
        match self.store_type.as_str() {
            "memory" => StoreConfig::Memory,
            "postgrest" => StoreConfig::Postgrest {
                url: self.postgrest_url.clone().unwrap_or_default(),
                api_key: self.postgrest_api_key.clone().unwrap_or_default(),
                schema: self.postgrest_schema.clone(),
            },
            _ => StoreConfig::File {
                path: self.store_path.clone().unwrap_or_default(),
            },
        }
    }

    fn sync_config(&self) -> SyncConfig {
        let mut config = SyncConfig::new()
            .with_store(self.store_config())
            .with_overdue_policy(self.overdue_policy)
            .with_availability_guard(self.availability_guard);
        if let Some(days) = self.loan_term_days {
            config = config.with_loan_term_days(days);
        }
        config
    }

    fn tracing_level(&self) -> Level {
        match self.log_level.to_lowercase().as_str() {
            "trace" => Level::TRACE,
            "debug" => Level::DEBUG,
            "warn" => Level::WARN,
            "error" => Level::ERROR,
            _ => Level::INFO,
        }
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("{} must be true or false. Got: '{}'", key, other),
    }
}

fn main() -> ExitCode {
    // Load configuration from environment
    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return ShelfsyncExitCode::ConfigError.into();
        }
    };

    // Validate configuration
    if let Err(e) = config.validate() {
        eprintln!("Configuration validation error: {}", e);
        return ShelfsyncExitCode::ConfigError.into();
    }

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.tracing_level())
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return ShelfsyncExitCode::ConfigError.into();
    }

    info!("Starting shelfsync");
    info!("Record store type: {}", config.store_type);

    // Enter tokio runtime
    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return ShelfsyncExitCode::RuntimeError.into();
        }
    };

    let result = rt.block_on(async {
        if let Err(e) = run_report(config).await {
            error!("Report failed: {:#}", e);
            ShelfsyncExitCode::RuntimeError
        } else {
            ShelfsyncExitCode::Clean
        }
    });

    result.into()
}

/// Load the library and log its status
async fn run_report(config: Config) -> Result<()> {
    let registry = StoreRegistry::with_builtin();

    #[cfg(feature = "postgrest")]
    {
        info!("Registering PostgREST record store");
        shelfsync_postgrest::register(&registry);
    }

    let sync_config = config.sync_config();
    let store = registry
        .create_store(&sync_config.store)
        .await
        .context("Failed to create record store")?;

    let (sync, mut events) = LibrarySynchronizer::new(store, Arc::new(SystemClock), sync_config)
        .context("Failed to create synchronizer")?;

    sync.initialize().await;

    let mut degraded = 0;
    while let Ok(event) = events.try_recv() {
        match event {
            SyncEvent::LoadDegraded { table, error } => {
                warn!("Table {} could not be loaded: {}", table, error);
                degraded += 1;
            }
            SyncEvent::RowsSkipped { table, skipped } => {
                warn!("{} rows of {} could not be read and are not counted", skipped, table);
            }
            _ => {}
        }
    }
    if degraded == shelfsync_core::Table::ALL.len() {
        anyhow::bail!("No table could be loaded from the record store");
    }

    let today = sync.today();
    let stats = sync.compute_stats();
    let snapshot = sync.snapshot();

    info!("Library status on {}", today);
    info!(
        "Books: {} titles, {} copies, {} titles available",
        stats.total_titles, stats.total_copies, stats.titles_available
    );
    info!("Members: {} active of {}", stats.active_members, snapshot.members.len());
    info!(
        "Loans: {} open, {} overdue, {} returned",
        stats.open_loans, stats.overdue_loans, stats.returned_loans
    );

    let overdue: Vec<_> = snapshot
        .loans
        .iter()
        .filter(|loan| loan.is_overdue(today))
        .collect();
    for loan in &overdue {
        let title = snapshot
            .book(&loan.book_id)
            .map_or("<deleted book>", |b| b.title.as_str());
        let name = snapshot
            .member(&loan.member_id)
            .map_or("<deleted member>", |m| m.name.as_str());
        warn!(
            "Overdue: '{}' with {} since {} ({} days)",
            title,
            name,
            loan.due_date,
            loan.days_overdue(today)
        );
    }

    for book in snapshot.most_borrowed(REPORT_LIMIT) {
        if book.copies_out() > 0 {
            info!("Most borrowed: '{}' ({} of {} out)", book.title, book.copies_out(), book.quantity);
        }
    }

    info!("Report complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_to_file_store_and_derived_policy() {
        let config = config(&[("SHELFSYNC_STORE_PATH", "library.json")]).unwrap();

        assert_eq!(config.store_type, "file");
        assert_eq!(config.overdue_policy, OverduePolicy::Derived);
        assert!(!config.availability_guard);
        assert!(config.validate().is_ok());

        let sync = config.sync_config();
        assert_eq!(sync.loan_term_days, 14);
        assert!(matches!(sync.store, StoreConfig::File { .. }));
    }

    #[test]
    fn file_store_requires_path() {
        let config = config(&[]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn parses_synchronizer_settings() {
        let config = config(&[
            ("SHELFSYNC_STORE_TYPE", "Memory"),
            ("SHELFSYNC_LOAN_TERM_DAYS", "7"),
            ("SHELFSYNC_OVERDUE_POLICY", "stored"),
            ("SHELFSYNC_AVAILABILITY_GUARD", "yes"),
        ])
        .unwrap();

        let sync = config.sync_config();
        assert_eq!(sync.loan_term_days, 7);
        assert_eq!(sync.overdue_policy, OverduePolicy::Stored);
        assert!(sync.availability_guard);
        assert!(matches!(sync.store, StoreConfig::Memory));
    }

    #[test]
    fn rejects_malformed_values() {
        assert!(config(&[("SHELFSYNC_LOAN_TERM_DAYS", "two weeks")]).is_err());
        assert!(config(&[("SHELFSYNC_OVERDUE_POLICY", "sometimes")]).is_err());
        assert!(config(&[("SHELFSYNC_AVAILABILITY_GUARD", "maybe")]).is_err());

        let out_of_range = config(&[
            ("SHELFSYNC_STORE_TYPE", "memory"),
            ("SHELFSYNC_LOAN_TERM_DAYS", "0"),
        ])
        .unwrap();
        assert!(out_of_range.validate().is_err());

        let bad_level = config(&[
            ("SHELFSYNC_STORE_TYPE", "memory"),
            ("SHELFSYNC_LOG_LEVEL", "loud"),
        ])
        .unwrap();
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn postgrest_requires_url_and_real_key() {
        let missing_key = config(&[
            ("SHELFSYNC_STORE_TYPE", "postgrest"),
            ("SHELFSYNC_POSTGREST_URL", "https://demo.supabase.co"),
        ])
        .unwrap();
        assert!(missing_key.validate().is_err());

        let placeholder = config(&[
            ("SHELFSYNC_STORE_TYPE", "postgrest"),
            ("SHELFSYNC_POSTGREST_URL", "https://demo.supabase.co"),
            ("SHELFSYNC_POSTGREST_API_KEY", "your_key"),
        ])
        .unwrap();
        assert!(placeholder.validate().is_err());

        let bad_scheme = config(&[
            ("SHELFSYNC_STORE_TYPE", "postgrest"),
            ("SHELFSYNC_POSTGREST_URL", "demo.supabase.co"),
            ("SHELFSYNC_POSTGREST_API_KEY", "eyJhbGciOiJIUzI1NiJ9.demo"),
        ])
        .unwrap();
        assert!(bad_scheme.validate().is_err());
    }

    #[test]
    fn unknown_store_type_is_rejected() {
        let config = config(&[("SHELFSYNC_STORE_TYPE", "redis")]).unwrap();
        assert!(config.validate().is_err());
    }
}

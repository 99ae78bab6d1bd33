// Account Service - Core Library
// Exposes all modules for use in the admin CLI, the API server, and tests

pub mod coerce;
pub mod db;
pub mod entities;
pub mod error;
pub mod operations;
pub mod store;

// Only compile the HTTP layer when the server feature is enabled
#[cfg(feature = "server")]
pub mod api;

// Re-export commonly used types
pub use db::{count_accounts, open_database, setup_database, SqliteAccountStore};
pub use entities::{Account, AccountPatch, NewAccount};
pub use error::{AccountError, AccountResult};
pub use operations::{deposit, parse_amount, update_fields, withdraw, FieldUpdate};
pub use store::{AccountStore, InMemoryAccountStore};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default `RUST_LOG` filter for both binaries
pub const DEFAULT_LOG_FILTER: &str = "info,account_service=debug,tower_http=debug";

/// Install the tracing subscriber, honouring `RUST_LOG` when set
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| DEFAULT_LOG_FILTER.into()))
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

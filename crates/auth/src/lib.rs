//! Redirect sign-in for the sign-up demo.
//!
//! This crate provides:
//! - OIDC flows with Google and Apple providers
//! - The two identity layer strategies and their session storage
//! - Tab storage, the entry-page resolver and the dashboard guard
//! - Axum extractors and auth routes

mod busy;
mod config;
mod error;
mod extractors;
mod flash;
mod guard;
mod handlers;
mod layers;
mod providers;
mod resolver;
mod sessions;
mod state;
mod tab;

#[cfg(test)]
mod test_support;

pub use busy::{BusyFlags, BusyGuard};
pub use config::{AppleConfig, AuthConfig, ProviderConfig};
pub use error::AuthError;
pub use extractors::{CurrentIdentity, Visitor};
pub use flash::{redirect_with_flash, FlashMessage, FLASH_COOKIE};
pub use guard::{guard_dashboard, sign_out, DashboardOutcome};
pub use handlers::auth_routes;
pub use layers::{build_layer, DirectRedirectLayer, ManagedSessionLayer};
#[cfg(feature = "mock")]
pub use providers::MockProvider;
pub use providers::{AppleProvider, GoogleProvider, ProviderRegistry};
pub use resolver::{resolve_entry, EntryOutcome, EntryView};
pub use sessions::InMemorySessionStore;
#[cfg(feature = "sqlite")]
pub use sessions::SqliteSessionStore;
pub use state::AuthState;
pub use tab::{BrowserTab, MemoryTabStorage};

#[cfg(feature = "mock")]
pub mod mock_idp;

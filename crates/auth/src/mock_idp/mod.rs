//! Mock identity provider for development.
//!
//! Serves fake Google and Apple authorization pages so the full redirect flow
//! can be exercised without real provider credentials.

mod server;
mod templates;

pub use server::MockIdpServer;

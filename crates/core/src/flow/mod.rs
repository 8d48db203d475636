//! Decisions the entry and dashboard pages make, kept free of I/O.

mod latch;
mod resolution;
mod status;

pub use latch::NavigationLatch;
pub use resolution::RedirectResolution;
pub use status::{Status, StatusKind};

/// Path of the entry page.
pub const ENTRY_PATH: &str = "/";

/// Path of the protected page.
pub const DASHBOARD_PATH: &str = "/dashboard";

/// Query flag marking the synthetic Apple callback.
pub const APPLE_MOCK_FLAG: &str = "appleMockRedirect";

//! Per-tab browser storage: the keys, the values kept under them, and the
//! storage abstraction itself.

mod debug;
mod keys;
mod marker;
mod traits;
mod types;

pub use debug::{DebugTrail, DEBUG_TRAIL_CAPACITY};
pub use keys::{AUTH_ATTEMPT_KEY, DEBUG_LINES_KEY, LAST_PROVIDER_KEY, MOCK_APPLE_USER_KEY};
pub use marker::AttemptMarker;
pub use traits::TabStorage;
pub use types::TabId;

/// Identity fabricated by the Apple mock round trip.
pub const MOCK_APPLE_USER_KEY: &str = "mockAppleUser";

/// Provider a redirect was started for. Removed once the result is read.
pub const AUTH_ATTEMPT_KEY: &str = "authAttemptProvider";

/// Provider of the most recent attempt, used to label the success status.
pub const LAST_PROVIDER_KEY: &str = "lastProvider";

/// JSON array backing the debug trail.
pub const DEBUG_LINES_KEY: &str = "authDebugLines";

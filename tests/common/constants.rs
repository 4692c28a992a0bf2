//! Shared constants for end-to-end tests
//!
//! When test data changes (member credentials, provider ids, etc.),
//! update only this file.

// ============================================================================
// Test Member Credentials
// ============================================================================

/// Regular test member handle
pub const TEST_USER: &str = "testuser";

/// Regular test member password
pub const TEST_PASS: &str = "testpass123";

/// Second member, used for visibility and ownership checks
pub const OTHER_USER: &str = "otheruser";

/// Second member password
pub const OTHER_PASS: &str = "otherpass123";

/// Secret the test server signs tokens with
pub const TEST_JWT_SECRET: &str = "e2e-test-secret";

// ============================================================================
// Test Catalog References
// ============================================================================

/// Provider track code of "Blue Hour"
pub const TRACK_1_CODE: &str = "trk-blue-hour";

/// Provider track code of "Night Drive"
pub const TRACK_2_CODE: &str = "trk-night-drive";

/// Provider address id of "Han River Park"
pub const PLACE_1_ID: i64 = 1001;
pub const PLACE_1_NAME: &str = "Han River Park";

/// Provider address id of "Hanok Cafe"
pub const PLACE_2_ID: i64 = 1002;
pub const PLACE_2_NAME: &str = "Hanok Cafe";

/// Provider address id of "Seoul Station"
pub const PLACE_3_ID: i64 = 1003;
pub const PLACE_3_NAME: &str = "Seoul Station";

// ============================================================================
// Test Timeouts and Configuration
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

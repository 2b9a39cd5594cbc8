//! Shared constants for end-to-end tests
//!
//! When seeded test data changes, update only this file.

// ============================================================================
// Test Users
// ============================================================================

/// Regular test user id, sent in the author header
pub const TEST_USER_ID: i64 = 1;

/// A second user, for authorship checks
pub const OTHER_USER_ID: i64 = 2;

// ============================================================================
// Seeded Songs (inserted oldest first)
// ============================================================================

pub const SONG_1_TITLE: &str = "Love me";
pub const SONG_1_COMPOSER: &str = "John Smith";
pub const SONG_1_ARRANGER: &str = "Jane Doe";

pub const SONG_2_TITLE: &str = "Lovely Day";
pub const SONG_2_COMPOSER: &str = "Mary Johnson";
pub const SONG_2_ARRANGER: &str = "Bob Williams";

pub const SONG_3_TITLE: &str = "Yesterday";
pub const SONG_3_COMPOSER: &str = "Paul McCartney";

// ============================================================================
// Timeouts
// ============================================================================

/// How long to wait for a spawned server to answer
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 20;

pub const REQUEST_TIMEOUT_SECS: u64 = 10;

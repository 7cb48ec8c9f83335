//! Shared constants for end-to-end tests

#![allow(dead_code)]

// ============================================================================
// Access tokens
// ============================================================================

/// First accepted owner
pub const OWNER_1_TOKEN: &str = "owner-one-token";

/// Second accepted owner
pub const OWNER_2_TOKEN: &str = "owner-two-token";

/// Never configured on the test server
pub const UNKNOWN_TOKEN: &str = "not-a-real-token";

// ============================================================================
// Track metadata
// ============================================================================

pub const ARTIST_1: &str = "The Test Band";
pub const ARTIST_2: &str = "Jazz Ensemble";

pub const ALBUM_1: &str = "First Album";
pub const ALBUM_2: &str = "Jazz Collection";

pub const TITLE_1: &str = "Opening Track";
pub const TITLE_2: &str = "Middle Track";
pub const TITLE_3: &str = "Smooth Jazz";

pub const GENRE: &str = "Rock";
pub const YEAR: i32 = 1999;

pub const IMAGE_URL: &str = "https://images.example.com/cover.jpg";

// ============================================================================
// Limits configured on the test server
// ============================================================================

pub const TEST_MAX_FILES_PER_OWNER: usize = 3;
pub const TEST_MAX_FILE_SIZE_BYTES: u64 = 64 * 1024;
pub const TEST_RECENT_LIST_LIMIT: usize = 2;

// ============================================================================
// Timeouts
// ============================================================================

/// Maximum time to wait for server to become ready (milliseconds)
pub const SERVER_READY_TIMEOUT_MS: u64 = 5000;

/// Timeout for individual HTTP requests (seconds)
pub const REQUEST_TIMEOUT_SECS: u64 = 10;

/// Polling interval when waiting for server ready (milliseconds)
pub const SERVER_READY_POLL_INTERVAL_MS: u64 = 50;

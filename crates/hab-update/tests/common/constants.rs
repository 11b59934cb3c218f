//! Shared constants for test infrastructure

use hab_update::Platform;

// Repository served by the mock API
pub const REPO_OWNER: &str = "test-owner";
pub const REPO_NAME: &str = "test-repo";

// Tool under test
pub const TOOL_NAME: &str = "ha-ws-client";
pub const TOOL_TAG: &str = "ha-ws-client-go";
pub const OTHER_TOOL_NAME: &str = "validate-blueprint";
pub const OTHER_TOOL_TAG: &str = "validate-blueprint-go";

// Platform every updater test pins
pub const TEST_ASSET_NAME: &str = "ha-ws-client-linux-amd64";

// Version constants
pub const VERSION_1_5_0: &str = "1.5.0";
pub const VERSION_1_5_4: &str = "1.5.4";
pub const VERSION_1_6_0: &str = "1.6.0";
pub const VERSION_2_0_0: &str = "2.0.0";

// Binary content for testing
pub const ORIGINAL_CONTENT: &[u8] = b"original binary v1.5.4";
pub const NEW_CONTENT: &[u8] = b"new binary v1.6.0";
pub const CORRUPTED_CONTENT: &[u8] = b"corrupted binary";

// Checksum constants
pub const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";
pub const WRONG_CHECKSUM: &str = "0000000000000000000000000000000000000000000000000000000000000000";

/// The linux-amd64 platform, independent of the host running the tests
pub fn test_platform() -> Platform {
    Platform::new("linux", "amd64", None).expect("linux-amd64 is supported")
}

/// Tag of a tool-specific release
pub fn tool_tag(version: &str) -> String {
    format!("{}/v{}", TOOL_TAG, version)
}

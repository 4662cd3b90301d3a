//! Path utilities for locating test data files.
//!
//! Text rendering tests need a TrueType font; this module finds one across
//! the usual install locations, supporting both local development and CI.

use std::path::PathBuf;

/// Common install locations of TrueType fonts with CJK or Latin glyphs.
const SYSTEM_FONTS: [&str; 6] = [
    "/usr/share/fonts/truetype/wqy/wqy-microhei.ttc",
    "/usr/share/fonts/truetype/droid/DroidSansFallbackFull.ttf",
    "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/dejavu/DejaVuSans.ttf",
    "/usr/share/fonts/TTF/DejaVuSans.ttf",
    "/Library/Fonts/Arial Unicode.ttf",
];

/// Finds a TrueType font for text rendering tests.
///
/// Checks `TEST_FONT` first, then a few well-known system locations.
pub fn find_test_font() -> Option<PathBuf> {
    if let Ok(font) = std::env::var("TEST_FONT") {
        let path = PathBuf::from(font);
        if path.exists() {
            return Some(path);
        }
    }
    SYSTEM_FONTS
        .iter()
        .map(PathBuf::from)
        .find(|path| path.exists())
}

/// Creates a temporary directory for test output.
///
/// The directory is automatically cleaned up when the returned `TempDir` is dropped.
pub fn temp_test_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("qpf_test_")
        .tempdir()
        .expect("Failed to create temporary test directory")
}

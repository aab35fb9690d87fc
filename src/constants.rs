// SPDX-License-Identifier: GPL-3.0-only

//! Application-wide constants

use std::time::Duration;

/// Scan loop timing defaults
pub mod timing {
    use super::Duration;

    /// Default interval between scan attempts, in seconds
    pub const DEFAULT_SCAN_INTERVAL_SECS: f32 = 0.5;

    /// Delay before an auto-started session performs its first scan
    /// (gives live cameras time to deliver real frames)
    pub const DEFAULT_STARTUP_DELAY_SECS: f32 = 1.0;

    /// How often the threaded loop checks the clock between commands
    pub const LOOP_POLL_INTERVAL: Duration = Duration::from_millis(20);
}

/// Frame readiness and sizing
pub mod frames {
    /// Frames narrower than this are treated as "source still initialising"
    pub const MIN_READY_WIDTH: u32 = 100;

    /// Default upper bound for the longest side when downscaling is enabled
    pub const DEFAULT_MAX_DIMENSION: u32 = 1024;
}

/// Frame brightness diagnostics thresholds (0-255 luminance)
pub mod diagnostics {
    /// Number of pixels sampled per frame
    pub const SAMPLE_COUNT: usize = 1000;

    /// A sample darker than this counts as black
    pub const BLACK_LEVEL: f32 = 50.0;

    /// A sample brighter than this counts as white
    pub const WHITE_LEVEL: f32 = 200.0;

    /// Average brightness below this means the scene is too dark
    pub const TOO_DARK: f32 = 30.0;

    /// Average brightness above this means the scene is overexposed
    pub const TOO_BRIGHT: f32 = 225.0;
}

/// Debug image dump naming
pub mod debug_dump {
    /// File name used by the fixed naming scheme
    pub const FILE_NAME: &str = "debug_camera.png";

    /// Prefix for timestamped dumps (`frame_20240101_120000_000.png`)
    pub const TIMESTAMP_PREFIX: &str = "frame";

    /// Directory created under the platform data dir
    pub const DATA_SUBDIR: &str = "barscan";
}

/// Supported input file formats for the image file source
pub mod file_formats {
    /// Supported image file extensions
    pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

    /// Check if a file extension is a supported image format
    pub fn is_image_extension(ext: &str) -> bool {
        IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str())
    }
}

/// Application information utilities
pub mod app_info {
    /// Application name used for config and data directories
    pub const APP_NAME: &str = "barscan";

    /// Config file name inside the config directory
    pub const CONFIG_FILE: &str = "config.json";

    /// Get the application version from build-time environment
    pub fn version() -> &'static str {
        env!("GIT_VERSION")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension_case_insensitive() {
        assert!(file_formats::is_image_extension("png"));
        assert!(file_formats::is_image_extension("JPG"));
        assert!(!file_formats::is_image_extension("mp4"));
    }

    #[test]
    fn test_diagnostic_thresholds_ordered() {
        assert!(diagnostics::TOO_DARK < diagnostics::BLACK_LEVEL);
        assert!(diagnostics::BLACK_LEVEL < diagnostics::WHITE_LEVEL);
        assert!(diagnostics::WHITE_LEVEL < diagnostics::TOO_BRIGHT);
    }
}

use serde::{Deserialize, Serialize};

pub const DEFAULT_FFMPEG_PATH: &str = "ffmpeg";
pub const DEFAULT_EXTENSION: &str = "mp4";

/// How the external remux tool is invoked.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RemuxConfig {
    /// Path or name of the ffmpeg binary. `FFMPEG_PATH` overrides the default.
    pub binary_path: String,
    /// Replace an existing output file instead of failing the job.
    pub overwrite: bool,
    /// Container extension of the output file, without the dot.
    pub extension: String,
}

impl Default for RemuxConfig {
    fn default() -> Self {
        Self {
            binary_path: std::env::var("FFMPEG_PATH")
                .ok()
                .filter(|p| !p.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_FFMPEG_PATH.to_string()),
            overwrite: false,
            extension: DEFAULT_EXTENSION.to_string(),
        }
    }
}

impl RemuxConfig {
    pub fn with_binary_path(mut self, path: impl Into<String>) -> Self {
        self.binary_path = path.into();
        self
    }

    pub fn with_overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }

    /// First line of `ffmpeg -version`, if the binary can be run.
    pub fn detect_version(&self) -> Option<String> {
        process_utils::query_version(&self.binary_path, "-version")
    }
}

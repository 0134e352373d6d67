use serde::{Deserialize, Serialize};
use std::process::Command;

/// External programs the pipeline shells out to
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ToolType {
    YtDlp,
    Ffmpeg,
    Python,
}

impl ToolType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "yt-dlp",
            ToolType::Ffmpeg => "ffmpeg",
            ToolType::Python => "python3",
        }
    }

    fn version_arg(&self) -> &'static str {
        match self {
            ToolType::YtDlp => "--version",
            ToolType::Ffmpeg => "-version", // single dash
            ToolType::Python => "--version",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInfo {
    pub name: String,
    pub tool_type: ToolType,
    pub version: Option<String>,
    pub path: Option<String>,
    pub is_available: bool,
}

/// Locates tools, honoring explicit overrides from the config
#[derive(Debug, Clone, Default)]
pub struct ToolManager {
    ytdlp_override: Option<String>,
    ffmpeg_override: Option<String>,
    python_override: Option<String>,
}

impl ToolManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(
        ytdlp: Option<String>,
        ffmpeg: Option<String>,
        python: Option<String>,
    ) -> Self {
        Self {
            ytdlp_override: ytdlp,
            ffmpeg_override: ffmpeg,
            python_override: python,
        }
    }

    /// Path to run for this tool: the override, a detected path, or the bare name
    pub fn resolve_path(&self, tool_type: ToolType) -> String {
        self.override_for(tool_type)
            .or_else(|| Self::detect_path(tool_type))
            .unwrap_or_else(|| tool_type.as_str().to_string())
    }

    pub fn get_tool_info(&self, tool_type: ToolType) -> ToolInfo {
        let path = self
            .override_for(tool_type)
            .or_else(|| Self::detect_path(tool_type));
        let version = path
            .as_deref()
            .and_then(|p| Self::get_version(p, tool_type));

        ToolInfo {
            name: tool_type.as_str().to_string(),
            tool_type,
            // An override that does not run is reported as unavailable
            is_available: version.is_some(),
            version,
            path,
        }
    }

    pub fn get_all_tools(&self) -> Vec<ToolInfo> {
        vec![
            self.get_tool_info(ToolType::YtDlp),
            self.get_tool_info(ToolType::Ffmpeg),
            self.get_tool_info(ToolType::Python),
        ]
    }

    fn override_for(&self, tool_type: ToolType) -> Option<String> {
        match tool_type {
            ToolType::YtDlp => self.ytdlp_override.clone(),
            ToolType::Ffmpeg => self.ffmpeg_override.clone(),
            ToolType::Python => self.python_override.clone(),
        }
    }

    fn detect_path(tool_type: ToolType) -> Option<String> {
        let binary_name = tool_type.as_str();

        // 1. Try common paths first
        let common_paths = [
            format!("/opt/homebrew/bin/{}", binary_name),
            format!("/usr/local/bin/{}", binary_name),
            format!("/usr/bin/{}", binary_name),
        ];

        for path in common_paths {
            if std::path::Path::new(&path).exists() {
                return Some(path);
            }
        }

        // 2. Try PATH
        if let Ok(output) = Command::new("which").arg(binary_name).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }

        None
    }

    fn get_version(path: &str, tool_type: ToolType) -> Option<String> {
        match Command::new(path).arg(tool_type.version_arg()).output() {
            Ok(output) if output.status.success() => {
                // python2 prints to stderr; ffmpeg prints a banner
                let raw = if output.stdout.is_empty() {
                    output.stderr
                } else {
                    output.stdout
                };
                let out = String::from_utf8_lossy(&raw);
                out.lines().next().map(|l| l.trim().to_string())
            }
            _ => None,
        }
    }
}

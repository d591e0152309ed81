use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::layout_engine::SchemeChoice;

pub fn config_file() -> PathBuf {
    dirs::home_dir().unwrap_or_default().join(".splitwm.toml")
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default)]
    settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
pub struct Config {
    pub settings: Settings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    #[serde(default)]
    pub tiling: TilingSettings,
    /// Gap configuration for window spacing
    #[serde(default)]
    pub gaps: GapSettings,
    #[serde(default)]
    pub workspaces: WorkspaceSettings,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct TilingSettings {
    /// Smallest share either side of a proportional split may get.
    #[serde(default = "default_min_ratio")]
    pub min_ratio: f64,
    /// Number of discrete ratio positions used when stepping a split from
    /// the keyboard.
    #[serde(default = "default_ratio_steps")]
    pub ratio_steps: u32,
    /// Ratio of the first automatic split in a fresh workspace.
    #[serde(default = "default_first_split_ratio")]
    pub first_split_ratio: f64,
    /// Ratio of every later automatic split.
    #[serde(default = "default_split_ratio")]
    pub split_ratio: f64,
    /// How far apart (in pixels) two edges may be and still count as touching
    /// during neighbor search.
    #[serde(default = "default_adjacency_slack")]
    pub adjacency_slack: i32,
    /// Scheme new workspaces start with.
    #[serde(default)]
    pub default_scheme: SchemeChoice,
}

impl Default for TilingSettings {
    fn default() -> Self {
        Self {
            min_ratio: default_min_ratio(),
            ratio_steps: default_ratio_steps(),
            first_split_ratio: default_first_split_ratio(),
            split_ratio: default_split_ratio(),
            adjacency_slack: default_adjacency_slack(),
            default_scheme: SchemeChoice::default(),
        }
    }
}

/// Gap configuration for window spacing
#[derive(Serialize, Deserialize, Debug, PartialEq, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct GapSettings {
    /// Outer gaps (space between the workspace and the display edges)
    #[serde(default)]
    pub outer: OuterGaps,
    /// Inner gaps (space between a window and its partition)
    #[serde(default)]
    pub inner: InnerGaps,
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct OuterGaps {
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub bottom: i32,
    #[serde(default)]
    pub right: i32,
}

impl Default for OuterGaps {
    fn default() -> Self { Self { top: 30, left: 25, bottom: 20, right: 25 } }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct InnerGaps {
    #[serde(default)]
    pub horizontal: i32,
    #[serde(default)]
    pub vertical: i32,
}

impl Default for InnerGaps {
    fn default() -> Self { Self { horizontal: 10, vertical: 10 } }
}

#[derive(Serialize, Deserialize, Debug, PartialEq, Clone)]
#[serde(deny_unknown_fields)]
pub struct WorkspaceSettings {
    /// Virtual workspaces per display.
    #[serde(default = "default_workspace_count")]
    pub count: usize,
}

impl Default for WorkspaceSettings {
    fn default() -> Self { Self { count: default_workspace_count() } }
}

impl Settings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.tiling.validate());
        issues.extend(self.gaps.validate());
        issues.extend(self.workspaces.validate());
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        self.tiling.auto_fix_values() + self.gaps.auto_fix_values() + self.workspaces.auto_fix_values()
    }
}

fn ratio_in_band(ratio: f64, min_ratio: f64) -> bool {
    ratio.is_finite() && ratio >= min_ratio && ratio <= 1.0 - min_ratio
}

impl TilingSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if !(0.0..0.5).contains(&self.min_ratio) {
            issues.push(format!("min_ratio must be in [0, 0.5), got {}", self.min_ratio));
        }

        if self.ratio_steps < 2 {
            issues.push(format!("ratio_steps must be at least 2, got {}", self.ratio_steps));
        }

        if !ratio_in_band(self.first_split_ratio, self.min_ratio) {
            issues.push(format!(
                "first_split_ratio must be within [min_ratio, 1 - min_ratio], got {}",
                self.first_split_ratio
            ));
        }

        if !ratio_in_band(self.split_ratio, self.min_ratio) {
            issues.push(format!(
                "split_ratio must be within [min_ratio, 1 - min_ratio], got {}",
                self.split_ratio
            ));
        }

        if self.adjacency_slack < 0 {
            issues.push(format!(
                "adjacency_slack must be non-negative, got {}",
                self.adjacency_slack
            ));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if !(0.0..0.5).contains(&self.min_ratio) {
            self.min_ratio = default_min_ratio();
            fixes += 1;
        }

        if self.ratio_steps < 2 {
            self.ratio_steps = default_ratio_steps();
            fixes += 1;
        }

        if !ratio_in_band(self.first_split_ratio, self.min_ratio) {
            self.first_split_ratio = default_first_split_ratio();
            fixes += 1;
        }

        if !ratio_in_band(self.split_ratio, self.min_ratio) {
            self.split_ratio = default_split_ratio();
            fixes += 1;
        }

        if self.adjacency_slack < 0 {
            self.adjacency_slack = 0;
            fixes += 1;
        }

        fixes
    }
}

impl GapSettings {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();
        issues.extend(self.outer.validate());
        issues.extend(self.inner.validate());
        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        self.outer.auto_fix_values() + self.inner.auto_fix_values()
    }
}

impl OuterGaps {
    pub fn validate(&self) -> Vec<String> {
        [("top", self.top), ("left", self.left), ("bottom", self.bottom), ("right", self.right)]
            .into_iter()
            .filter(|(_, v)| *v < 0)
            .map(|(name, v)| format!("outer.{name} gap must be non-negative, got {v}"))
            .collect()
    }

    /// Attempts to fix outer gap configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;
        for gap in [&mut self.top, &mut self.left, &mut self.bottom, &mut self.right] {
            if *gap < 0 {
                *gap = 0;
                fixes += 1;
            }
        }
        fixes
    }
}

impl InnerGaps {
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.horizontal < 0 {
            issues.push(format!(
                "inner.horizontal gap must be non-negative, got {}",
                self.horizontal
            ));
        }

        if self.vertical < 0 {
            issues.push(format!("inner.vertical gap must be non-negative, got {}", self.vertical));
        }

        issues
    }

    pub fn auto_fix_values(&mut self) -> usize {
        let mut fixes = 0;

        if self.horizontal < 0 {
            self.horizontal = 0;
            fixes += 1;
        }

        if self.vertical < 0 {
            self.vertical = 0;
            fixes += 1;
        }

        fixes
    }
}

impl WorkspaceSettings {
    pub fn validate(&self) -> Vec<String> {
        if self.count == 0 {
            vec!["workspaces.count must be at least 1".to_string()]
        } else {
            Vec::new()
        }
    }

    pub fn auto_fix_values(&mut self) -> usize {
        if self.count == 0 {
            self.count = 1;
            1
        } else {
            0
        }
    }
}

fn default_min_ratio() -> f64 { 0.05 }

fn default_ratio_steps() -> u32 { 6 }

fn default_first_split_ratio() -> f64 { 0.67 }

fn default_split_ratio() -> f64 { 0.5 }

fn default_adjacency_slack() -> i32 { 1 }

fn default_workspace_count() -> usize { 3 }

impl Config {
    pub fn read(path: &Path) -> anyhow::Result<Config> {
        let buf = std::fs::read_to_string(path)?;
        Self::parse(&buf)
    }

    pub fn default() -> Config {
        Self::parse(include_str!("../../splitwm.default.toml"))
            .unwrap_or_else(|_| Config { settings: Settings::default() })
    }

    /// Save the current config to a file
    pub fn save(&self, path: &Path) -> anyhow::Result<()> {
        let config_file = ConfigFile { settings: self.settings.clone() };
        let toml_string = toml::to_string_pretty(&config_file)?;
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        std::fs::write(path, toml_string.as_bytes())?;
        Ok(())
    }

    /// Validates the entire configuration and returns a list of issues found.
    pub fn validate(&self) -> Vec<String> { self.settings.validate() }

    /// Attempts to fix configuration values automatically.
    /// Returns the number of fixes applied.
    pub fn auto_fix_values(&mut self) -> usize { self.settings.auto_fix_values() }

    pub fn parse(buf: &str) -> anyhow::Result<Config> {
        let c: ConfigFile = toml::from_str(buf)?;
        Ok(Config { settings: c.settings })
    }
}

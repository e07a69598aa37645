/*
 *  config.rs
 *
 *  OnAir - broadcast overlay engine
 *  (c) 2020-26 Stuart Hunter
 *
 *  Runner configuration - YAML scene file layered under CLI overrides
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use crate::overlay::{AlertLevel, Theme, TickerMode, WidgetConfig, WidgetKind};
use chrono::{Duration as ChronoDuration, SecondsFormat, Utc};
use clap::{ArgAction, Parser, ValueHint};
use dirs_next::home_dir;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

pub const DEFAULT_FPS: u32 = 30;
pub const MAX_FPS: u32 = 240;

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// One named widget in the scene.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneEntry {
    pub name: String,
    #[serde(flatten)]
    pub widget: WidgetConfig,
}

/// Top-level runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>, // e.g., "info" | "debug"
    pub fps: Option<u32>,          // snapshot polling rate
    pub run_for_secs: Option<u64>, // stop after this long, run forever when unset
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scene: Vec<SceneEntry>,
}

impl Config {
    pub fn fps(&self) -> u32 {
        self.fps.unwrap_or(DEFAULT_FPS)
    }

    pub fn log_filter(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn from_yaml_str(s: &str) -> Result<Config, ConfigError> {
        Ok(serde_yaml::from_str(s)?)
    }

    /// Built-in scene used when no file provides one: one widget of every kind.
    pub fn demo_scene() -> Vec<SceneEntry> {
        let expires = (Utc::now() + ChronoDuration::hours(2)).to_rfc3339_opts(SecondsFormat::Secs, true);

        let breaking = WidgetConfig::new(WidgetKind::BreakingTicker).with_items([
            "MAJOR EARTHQUAKE STRIKES PACIFIC REGION",
            "TSUNAMI WARNING ISSUED FOR COASTAL AREAS",
            "EMERGENCY SERVICES ON HIGH ALERT",
            "PRESIDENT TO ADDRESS NATION SHORTLY",
        ]);
        let ticker = WidgetConfig::new(WidgetKind::NewsTicker)
            .with_items([
                "Stock markets reach all-time high as tech stocks surge",
                "New climate agreement signed by world leaders",
                "Local sports team advances to championship finals",
                "Breakthrough in renewable energy technology announced",
                "Traffic updates: Major highway construction begins next week",
            ])
            .with_mode(TickerMode::Continuous)
            .with_position(0, 50);
        let mut lower_third = WidgetConfig::new(WidgetKind::LowerThird)
            .with_items(["Sarah Johnson", "Chief International Correspondent", "London, United Kingdom"])
            .with_position(0, 500);
        lower_third.theme = Theme::News;
        let mut alert = WidgetConfig::new(WidgetKind::WeatherAlert)
            .with_items(["TORNADO WARNING"])
            .with_expires(expires)
            .with_position(20, 100);
        alert.alert = AlertLevel::Severe;
        let mut score = WidgetConfig::new(WidgetKind::ScoreBug)
            .with_items(["Lakers 108", "Warriors 102", "Q4 2:45"])
            .with_position(600, 20);
        score.theme = Theme::Sports;

        [
            ("breaking", breaking),
            ("ticker", ticker),
            ("lower-third", lower_third),
            ("weather-alert", alert),
            ("score-bug", score),
        ]
        .into_iter()
        .map(|(name, widget)| SceneEntry { name: name.to_string(), widget })
        .collect()
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "onair", about = "OnAir broadcast overlay engine", version)]
pub struct Cli {
    /// Path to a YAML scene file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Snapshot polling rate
    #[arg(long)]
    pub fps: Option<u32>,
    /// Exit after this many seconds
    #[arg(long)]
    pub run_for_secs: Option<u64>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<(Config, Cli), ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;
    Ok((cfg, cli))
}

/// Everything `load` does after argument parsing.
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        log::debug!("Using scene file {}", p.display());
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    if cfg.scene.is_empty() {
        log::info!("No scene configured, mounting the demo scene");
        cfg.scene = Config::demo_scene();
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;

    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/onair/scene.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/onair/scene.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/onair.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["onair.yaml", "scene.yaml", "config/onair.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    Config::from_yaml_str(&s)
}

/// Shallow merge `src` into `dst`, Option-by-Option. A non-empty scene
/// replaces the whole scene.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some()    { dst.log_level = src.log_level; }
    if src.fps.is_some()          { dst.fps = src.fps; }
    if src.run_for_secs.is_some() { dst.run_for_secs = src.run_for_secs; }
    if !src.scene.is_empty()      { dst.scene = src.scene; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some()    { cfg.log_level = cli.log_level.clone(); }
    if cli.debug                  { cfg.log_level = Some("debug".to_string()); }
    if cli.fps.is_some()          { cfg.fps = cli.fps; }
    if cli.run_for_secs.is_some() { cfg.run_for_secs = cli.run_for_secs; }
}

/// Put any invariants here (required fields, ranges, etc.)
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(fps) = cfg.fps {
        if fps == 0 || fps > MAX_FPS {
            return Err(ConfigError::Validation(format!("fps must be 1..={}", MAX_FPS)));
        }
    }
    if cfg.scene.is_empty() {
        return Err(ConfigError::Validation("scene has no widgets".into()));
    }
    let mut names = HashSet::new();
    for entry in &cfg.scene {
        if entry.name.trim().is_empty() {
            return Err(ConfigError::Validation("scene widget with an empty name".into()));
        }
        if !names.insert(entry.name.as_str()) {
            return Err(ConfigError::Validation(format!("duplicate widget name '{}'", entry.name)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::overlay::SpeedClass;

    const SCENE: &str = r#"
log_level: warn
fps: 25
scene:
  - name: breaking
    kind: breaking_ticker
    speed: fast
    items: ["one", "two"]
  - name: alert
    kind: weather_alert
    auto_hide: true
    alert: watch
    expires: "2030-01-01T00:00:00Z"
    position: { x: 20, y: 100 }
"#;

    #[test]
    fn test_parse_scene() {
        let cfg = Config::from_yaml_str(SCENE).unwrap();
        assert_eq!(cfg.fps(), 25);
        assert_eq!(cfg.log_filter(), "warn");
        assert_eq!(cfg.scene.len(), 2);
        assert_eq!(cfg.scene[0].widget.speed, SpeedClass::Fast);
        assert_eq!(cfg.scene[1].widget.kind, WidgetKind::WeatherAlert);
        assert!(cfg.scene[1].widget.auto_hide);
        assert_eq!(cfg.scene[1].widget.alert, AlertLevel::Watch);
        assert_eq!(cfg.scene[1].widget.position.y, 100);
        assert!(validate(&cfg).is_ok());
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut cfg = Config::from_yaml_str(SCENE).unwrap();
        let cli = Cli { fps: Some(60), debug: true, run_for_secs: Some(5), ..Cli::default() };
        apply_cli_overrides(&mut cfg, &cli);
        assert_eq!(cfg.fps(), 60);
        assert_eq!(cfg.log_filter(), "debug");
        assert_eq!(cfg.run_for_secs, Some(5));
    }

    #[test]
    fn test_merge_keeps_unset_fields() {
        let mut cfg = Config { fps: Some(50), ..Config::default() };
        merge(&mut cfg, Config { log_level: Some("trace".into()), ..Config::default() });
        assert_eq!(cfg.fps(), 50);
        assert_eq!(cfg.log_filter(), "trace");
    }

    #[test]
    fn test_validation_errors() {
        let mut cfg = Config::from_yaml_str(SCENE).unwrap();
        cfg.fps = Some(0);
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        let mut cfg = Config::from_yaml_str(SCENE).unwrap();
        cfg.scene[1].name = "breaking".into();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));

        let cfg = Config::default();
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_bad_yaml() {
        assert!(matches!(Config::from_yaml_str("scene: [ {name: x, kind: hologram} ]"), Err(ConfigError::Yaml(_))));
    }

    #[test]
    fn test_demo_scene_is_valid() {
        let cfg = Config { scene: Config::demo_scene(), ..Config::default() };
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.fps(), DEFAULT_FPS);
        assert!(cfg.scene.iter().any(|e| e.widget.kind == WidgetKind::ScoreBug));
    }

    #[test]
    fn test_missing_explicit_file() {
        let cli = Cli { config: Some(PathBuf::from("/nonexistent/onair-scene.yaml")), ..Cli::default() };
        assert!(matches!(load_with(&cli), Err(ConfigError::Validation(_))));
    }
}

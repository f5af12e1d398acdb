/// External configuration loader.
///
/// Reads `config.toml` from the executable's directory (or CWD).
/// Falls back to sensible defaults if the file is missing or incomplete.

use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

// ── Public Config Struct ──

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub general: GeneralConfig,
    pub multiplayer: MultiplayerConfig,
}

#[derive(Clone, Debug)]
pub struct GeneralConfig {
    /// Optional level catalog replacing the built-in one.
    pub catalog: Option<PathBuf>,
    pub log_level: String,
    pub frame: Duration,
    /// How long a cutscene stays up before loading continues.
    pub cutscene: Duration,
}

#[derive(Clone, Debug)]
pub struct MultiplayerConfig {
    pub nickname: String,
    pub timeout: Duration,
    pub countdown: Duration,
    pub fallback_level: String,
}

// ── TOML Schema (with serde defaults) ──

#[derive(Deserialize, Debug, Default)]
struct TomlConfig {
    #[serde(default)]
    general: TomlGeneral,
    #[serde(default)]
    multiplayer: TomlMultiplayer,
}

#[derive(Deserialize, Debug)]
struct TomlGeneral {
    #[serde(default)]
    catalog: Option<String>,
    #[serde(default = "default_log_level")]
    log_level: String,
    #[serde(default = "default_frame_ms")]
    frame_ms: u64,
    #[serde(default = "default_cutscene_secs")]
    cutscene_secs: u64,
}

#[derive(Deserialize, Debug)]
struct TomlMultiplayer {
    #[serde(default = "default_nickname")]
    nickname: String,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
    #[serde(default = "default_countdown_secs")]
    countdown_secs: u64,
    #[serde(default = "default_fallback_level")]
    fallback_level: String,
}

// ── Defaults ──

fn default_log_level() -> String { "info".into() }
fn default_frame_ms() -> u64 { 16 }
fn default_cutscene_secs() -> u64 { 4 }
fn default_nickname() -> String { "Player".into() }
fn default_timeout_secs() -> u64 { 30 }
fn default_countdown_secs() -> u64 { 60 }
fn default_fallback_level() -> String { "level_1".into() }

impl Default for TomlGeneral {
    fn default() -> Self {
        TomlGeneral {
            catalog: None,
            log_level: default_log_level(),
            frame_ms: default_frame_ms(),
            cutscene_secs: default_cutscene_secs(),
        }
    }
}

impl Default for TomlMultiplayer {
    fn default() -> Self {
        TomlMultiplayer {
            nickname: default_nickname(),
            timeout_secs: default_timeout_secs(),
            countdown_secs: default_countdown_secs(),
            fallback_level: default_fallback_level(),
        }
    }
}

// ── Loading ──

impl AppConfig {
    /// Load config from `config.toml`.
    /// Search order: (1) exe directory, (2) current working directory.
    /// Missing file or missing keys gracefully fall back to defaults.
    pub fn load() -> Self {
        let search_dirs = candidate_dirs();
        let toml_cfg = load_toml(&search_dirs);
        Self::resolve(toml_cfg, &search_dirs)
    }

    fn resolve(toml_cfg: TomlConfig, search_dirs: &[PathBuf]) -> Self {
        // A relative catalog path is looked up next to config.toml first.
        let catalog = toml_cfg.general.catalog.map(|c| {
            let p = PathBuf::from(&c);
            if p.is_absolute() {
                p
            } else {
                search_dirs.iter()
                    .map(|d| d.join(&c))
                    .find(|p| p.is_file())
                    .unwrap_or(p)
            }
        });

        AppConfig {
            general: GeneralConfig {
                catalog,
                log_level: toml_cfg.general.log_level,
                frame: Duration::from_millis(toml_cfg.general.frame_ms.max(1)),
                cutscene: Duration::from_secs(toml_cfg.general.cutscene_secs),
            },
            multiplayer: MultiplayerConfig {
                nickname: toml_cfg.multiplayer.nickname,
                timeout: Duration::from_secs(toml_cfg.multiplayer.timeout_secs),
                countdown: Duration::from_secs(toml_cfg.multiplayer.countdown_secs.max(1)),
                fallback_level: toml_cfg.multiplayer.fallback_level,
            },
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::resolve(TomlConfig::default(), &[])
    }
}

/// Candidate directories to search: exe dir + CWD + XDG data dir (deduplicated).
fn candidate_dirs() -> Vec<PathBuf> {
    let mut dirs = vec![];

    // 1. Directory of the running executable
    if let Ok(exe) = std::env::current_exe() {
        let resolved = exe.canonicalize().unwrap_or(exe);
        if let Some(parent) = resolved.parent() {
            dirs.push(parent.to_path_buf());
        }
    }

    // 2. Current working directory
    if let Ok(cwd) = std::env::current_dir() {
        if !dirs.iter().any(|d| d == &cwd) {
            dirs.push(cwd);
        }
    }

    // 3. XDG data home (~/.local/share/spacenauts)
    if let Ok(home) = std::env::var("HOME") {
        let xdg = PathBuf::from(&home).join(".local/share/spacenauts");
        if xdg.is_dir() && !dirs.iter().any(|d| d == &xdg) {
            dirs.push(xdg);
        }
    }

    if dirs.is_empty() {
        dirs.push(PathBuf::from("."));
    }

    dirs
}

/// Search for config.toml in candidate directories.
///
/// Runs before logging is up, so problems go to stderr.
fn load_toml(search_dirs: &[PathBuf]) -> TomlConfig {
    for dir in search_dirs {
        let path = dir.join("config.toml");
        if path.exists() {
            match std::fs::read_to_string(&path) {
                Ok(text) => return parse_or_default(&text),
                Err(e) => {
                    eprintln!("Warning: could not read {}: {e}", path.display());
                }
            }
        }
    }
    TomlConfig::default()
}

fn parse_or_default(text: &str) -> TomlConfig {
    match toml::from_str::<TomlConfig>(text) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Warning: config.toml parse error: {e}");
            eprintln!("Using default settings.");
            TomlConfig::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shipped_game() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.multiplayer.countdown, Duration::from_secs(60));
        assert_eq!(cfg.multiplayer.fallback_level, "level_1");
        assert_eq!(cfg.general.catalog, None);
        assert_eq!(cfg.general.log_level, "info");
    }

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let raw = parse_or_default("[multiplayer]\nnickname = \"Alice\"\n");
        let cfg = AppConfig::resolve(raw, &[]);
        assert_eq!(cfg.multiplayer.nickname, "Alice");
        assert_eq!(cfg.multiplayer.timeout, Duration::from_secs(30));
        assert_eq!(cfg.general.frame, Duration::from_millis(16));
    }

    #[test]
    fn invalid_toml_falls_back() {
        let raw = parse_or_default("[multiplayer\nnickname = ");
        assert_eq!(raw.multiplayer.nickname, "Player");
    }

    #[test]
    fn relative_catalog_found_in_search_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("levels.toml"), "").unwrap();
        let raw = parse_or_default("[general]\ncatalog = \"levels.toml\"\n");
        let cfg = AppConfig::resolve(raw, &[dir.path().to_path_buf()]);
        assert_eq!(cfg.general.catalog, Some(dir.path().join("levels.toml")));
    }

    #[test]
    fn zero_countdown_clamped_to_one_second() {
        let raw = parse_or_default("[multiplayer]\ncountdown_secs = 0\n");
        let cfg = AppConfig::resolve(raw, &[]);
        assert_eq!(cfg.multiplayer.countdown, Duration::from_secs(1));
    }
}

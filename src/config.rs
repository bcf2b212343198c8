use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::warn;

fn project_dirs() -> Option<ProjectDirs> {
  ProjectDirs::from("", "", "popcorn")
}

/// User preferences stored in `prefs.toml`.
#[derive(Serialize, Deserialize, Default, Debug, Clone, PartialEq)]
pub struct Config {
  pub theme_name: Option<String>,
  pub poster_mode: Option<String>,
  pub api_key: Option<String>,
  pub base_url: Option<String>,
}

impl Config {
  pub fn load() -> Self {
    if let Some(proj_dirs) = project_dirs() {
      let config_file = proj_dirs.config_dir().join("prefs.toml");
      if let Ok(content) = std::fs::read_to_string(&config_file) {
        match toml::from_str(&content) {
          Ok(config) => return config,
          Err(e) => warn!(path = %config_file.display(), err = %e, "ignoring malformed prefs"),
        }
      }
    }
    Self::default()
  }

  pub fn save(&self) {
    if let Some(proj_dirs) = project_dirs() {
      let config_dir = proj_dirs.config_dir();
      if std::fs::create_dir_all(config_dir).is_ok() {
        let config_file = config_dir.join("prefs.toml");
        if let Ok(content) = toml::to_string(self) {
          let _ = std::fs::write(config_file, content);
        }
      }
    }
  }

  /// API key from the command line or environment, then prefs, then the build environment.
  pub fn resolve_api_key(&self, cli: Option<&str>) -> Option<String> {
    let present = |key: &&str| !key.trim().is_empty();
    cli
      .filter(present)
      .or_else(|| self.api_key.as_deref().filter(present))
      .or_else(|| option_env!("OMDB_API_KEY").filter(present))
      .map(|key| key.trim().to_string())
  }
}

/// Directory for the watched list and logs.
pub fn data_dir() -> PathBuf {
  project_dirs().map(|d| d.data_dir().to_path_buf()).unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn cli_key_wins() {
    let config = Config { api_key: Some("from-prefs".to_string()), ..Config::default() };
    assert_eq!(config.resolve_api_key(Some("from-cli")).as_deref(), Some("from-cli"));
    assert_eq!(config.resolve_api_key(None).as_deref(), Some("from-prefs"));
  }

  #[test]
  fn blank_cli_key_falls_through() {
    let config = Config { api_key: Some(" from-prefs ".to_string()), ..Config::default() };
    assert_eq!(config.resolve_api_key(Some("")).as_deref(), Some("from-prefs"));
  }

  #[test]
  fn prefs_round_trip() {
    let config = Config {
      theme_name: Some("matinee".to_string()),
      poster_mode: Some("ascii".to_string()),
      api_key: None,
      base_url: Some("http://localhost:8080/".to_string()),
    };
    let text = toml::to_string(&config).unwrap();
    assert_eq!(toml::from_str::<Config>(&text).unwrap(), config);
  }
}

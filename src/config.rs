//! Server configuration
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (--config, $GIT_LFS_SERVE_CONFIG, ~/.git-lfs-serve.toml
//!    or /etc/git-lfs-serve.toml, first one found)
//! 3. Environment variables (GIT_LFS_SERVE_* prefix)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::{env, fs};

use crate::error::StartupError;

/// Environment variable naming an explicit config file
pub const CONFIG_ENV: &str = "GIT_LFS_SERVE_CONFIG";

/// Prefix of per-setting environment overrides
pub const ENV_PREFIX: &str = "GIT_LFS_SERVE_";

const USER_CONFIG_NAME: &str = ".git-lfs-serve.toml";
const SYSTEM_CONFIG_PATH: &str = "/etc/git-lfs-serve.toml";

/// Configuration for one server process
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
	/// Storage root; must exist
	pub base_path: Option<PathBuf>,

	/// Delta cache directory, created at startup if missing
	pub delta_cache_path: Option<PathBuf>,

	/// Append log lines here; no logging when unset
	pub log_file: Option<PathBuf>,

	/// Log at debug level, including request and response JSON
	pub debug_log: bool,

	/// Accept an absolute repository path argument
	pub allow_absolute_paths: bool,

	/// Check uploaded content against its SHA-256 oid before publishing
	pub verify_content: bool,
}

impl Config {
	pub fn from_toml_str(text: &str) -> Result<Config, toml::de::Error> {
		toml::from_str(text)
	}

	pub fn from_file(path: &Path) -> Result<Config, StartupError> {
		let text = fs::read_to_string(path).map_err(|e| StartupError::Config {
			path: path.to_path_buf(),
			message: e.to_string(),
		})?;
		Config::from_toml_str(&text).map_err(|e| StartupError::Config {
			path: path.to_path_buf(),
			message: e.to_string(),
		})
	}

	/// Load from the first config file found, then apply environment overrides
	pub fn load(explicit: Option<&Path>) -> Result<Config, StartupError> {
		let path = match explicit {
			Some(p) => Some(p.to_path_buf()),
			None => find_config_file(),
		};
		let mut config = match path {
			Some(p) => Config::from_file(&p)?,
			None => Config::default(),
		};
		config.apply_env(|key| env::var(key).ok());
		Ok(config)
	}

	/// Override settings from `GIT_LFS_SERVE_*` variables
	pub fn apply_env<F>(&mut self, lookup: F)
	where
		F: Fn(&str) -> Option<String>,
	{
		let var = |name: &str| lookup(&format!("{}{}", ENV_PREFIX, name)).filter(|v| !v.is_empty());

		if let Some(v) = var("BASE_PATH") {
			self.base_path = Some(PathBuf::from(v));
		}
		if let Some(v) = var("DELTA_CACHE_PATH") {
			self.delta_cache_path = Some(PathBuf::from(v));
		}
		if let Some(v) = var("LOG_FILE") {
			self.log_file = Some(PathBuf::from(v));
		}
		if let Some(v) = var("DEBUG_LOG") {
			self.debug_log = parse_bool(&v);
		}
		if let Some(v) = var("ALLOW_ABSOLUTE_PATHS") {
			self.allow_absolute_paths = parse_bool(&v);
		}
		if let Some(v) = var("VERIFY_CONTENT") {
			self.verify_content = parse_bool(&v);
		}
	}

	/// The storage root, which must be set and be an existing directory
	pub fn check_base_path(&self) -> Result<&Path, StartupError> {
		let path = match &self.base_path {
			Some(p) if !p.as_os_str().is_empty() => p.as_path(),
			_ => return Err(StartupError::MissingBasePath),
		};
		if !path.is_dir() {
			return Err(StartupError::InvalidBasePath { path: path.to_path_buf() });
		}
		Ok(path)
	}
}

/// Default config file locations in priority order
pub fn config_candidates() -> Vec<PathBuf> {
	let mut candidates = Vec::new();
	if let Ok(home) = env::var("HOME") {
		candidates.push(PathBuf::from(home).join(USER_CONFIG_NAME));
	}
	candidates.push(PathBuf::from(SYSTEM_CONFIG_PATH));
	candidates
}

fn find_config_file() -> Option<PathBuf> {
	// Named explicitly, so it is used even if missing and fails loudly
	if let Some(p) = env::var_os(CONFIG_ENV).filter(|p| !p.is_empty()) {
		return Some(PathBuf::from(p));
	}
	config_candidates().into_iter().find(|p| p.is_file())
}

fn parse_bool(value: &str) -> bool {
	matches!(value.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashMap;

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert!(config.base_path.is_none());
		assert!(!config.debug_log);
		assert!(!config.allow_absolute_paths);
		assert!(!config.verify_content);
	}

	#[test]
	fn test_config_from_toml() {
		let config = Config::from_toml_str(
			r#"
			base-path = "/srv/lfs"
			log-file = "/var/log/lfs.log"
			debug-log = true
			"#,
		)
		.unwrap();
		assert_eq!(config.base_path, Some(PathBuf::from("/srv/lfs")));
		assert_eq!(config.log_file, Some(PathBuf::from("/var/log/lfs.log")));
		assert!(config.debug_log);
		assert!(config.delta_cache_path.is_none());
	}

	#[test]
	fn test_config_rejects_wrong_types() {
		assert!(Config::from_toml_str("debug-log = \"maybe\"").is_err());
	}

	#[test]
	fn test_env_overrides_file() {
		let mut config = Config::from_toml_str("base-path = \"/from/file\"").unwrap();
		let vars: HashMap<&str, &str> = [
			("GIT_LFS_SERVE_BASE_PATH", "/from/env"),
			("GIT_LFS_SERVE_VERIFY_CONTENT", "yes"),
			("GIT_LFS_SERVE_LOG_FILE", ""),
		]
		.iter()
		.cloned()
		.collect();
		config.apply_env(|k| vars.get(k).map(|v| v.to_string()));

		assert_eq!(config.base_path, Some(PathBuf::from("/from/env")));
		assert!(config.verify_content);
		assert!(config.log_file.is_none());
	}

	#[test]
	fn test_check_base_path() {
		assert!(matches!(Config::default().check_base_path(), Err(StartupError::MissingBasePath)));

		let missing = Config { base_path: Some(PathBuf::from("/no/such/dir/x")), ..Config::default() };
		assert_eq!(missing.check_base_path().unwrap_err().exit_code(), 14);

		let dir = std::env::temp_dir();
		let present = Config { base_path: Some(dir.clone()), ..Config::default() };
		assert_eq!(present.check_base_path().unwrap(), dir.as_path());
	}

	#[test]
	fn test_parse_bool() {
		assert!(parse_bool("TRUE"));
		assert!(parse_bool(" 1 "));
		assert!(!parse_bool("0"));
		assert!(!parse_bool("nope"));
	}
}

// vim: ts=4

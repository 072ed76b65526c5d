// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, anyhow, bail};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use winlens_app::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE, StylingStrategy};

pub const APP_NAME: &str = "winlens";
const CONFIG_VERSION: i64 = 1;
const DEFAULT_BASE_URL: &str = "http://localhost:8000";
const DEFAULT_TIMEOUT: &str = "10s";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub version: i64,
    #[serde(default)]
    pub server: Server,
    #[serde(default)]
    pub pagination: Pagination,
    #[serde(default)]
    pub render: Render,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            server: Server::default(),
            pagination: Pagination::default(),
            render: Render::default(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Server {
    pub base_url: Option<String>,
    pub timeout: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Pagination {
    pub page_size: Option<i64>,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            page_size: Some(DEFAULT_PAGE_SIZE as i64),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Render {
    pub style: Option<String>,
}

impl Default for Render {
    fn default() -> Self {
        Self {
            style: Some(StylingStrategy::default().as_str().to_owned()),
        }
    }
}

impl Config {
    pub fn default_path() -> Result<PathBuf> {
        if let Some(path) = env::var_os("WINLENS_CONFIG_PATH") {
            return Ok(PathBuf::from(path));
        }

        let config_root = dirs::config_dir().ok_or_else(|| {
            anyhow!("cannot resolve config directory; set WINLENS_CONFIG_PATH to the config file")
        })?;

        let app_dir = config_root.join(APP_NAME);
        fs::create_dir_all(&app_dir)
            .with_context(|| format!("create config directory {}", app_dir.display()))?;
        Ok(app_dir.join("config.toml"))
    }

    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let raw = fs::read_to_string(path)
            .with_context(|| format!("read config file {}", path.display()))?;
        let value: toml::Value = toml::from_str(&raw)
            .with_context(|| format!("parse TOML config {}", path.display()))?;

        let version = value
            .get("version")
            .and_then(toml::Value::as_integer)
            .ok_or_else(|| {
                anyhow!(
                    "config file {} has no version; add `version = 1` and put values under [server], [pagination], and [render]",
                    path.display()
                )
            })?;

        if version != CONFIG_VERSION {
            bail!(
                "unsupported config version {} in {}; expected version = 1",
                version,
                path.display()
            );
        }

        let config: Config = value
            .try_into()
            .with_context(|| format!("decode config {}", path.display()))?;
        config.validate(path)?;
        Ok(config)
    }

    fn validate(&self, path: &Path) -> Result<()> {
        if let Some(base_url) = &self.server.base_url
            && base_url.trim().is_empty()
        {
            bail!(
                "server.base_url in {} is empty; remove it to use {}",
                path.display(),
                DEFAULT_BASE_URL
            );
        }

        if let Some(timeout) = &self.server.timeout {
            let parsed = parse_duration(timeout)?;
            if parsed <= Duration::ZERO {
                bail!(
                    "server.timeout in {} must be positive, got {}",
                    path.display(),
                    timeout
                );
            }
        }

        if let Some(page_size) = self.pagination.page_size
            && !(1..=MAX_PAGE_SIZE as i64).contains(&page_size)
        {
            bail!(
                "pagination.page_size in {} must be between 1 and {}, got {}",
                path.display(),
                MAX_PAGE_SIZE,
                page_size
            );
        }

        if let Some(style) = &self.render.style
            && StylingStrategy::parse(style).is_none()
        {
            let known: Vec<&str> = StylingStrategy::ALL
                .iter()
                .map(|strategy| strategy.as_str())
                .collect();
            bail!(
                "render.style in {} must be one of {}, got {:?}",
                path.display(),
                known.join(", "),
                style
            );
        }

        Ok(())
    }

    /// The config file wins; `WINLENS_SERVER_URL` only fills the gap.
    pub fn base_url(&self) -> String {
        let raw = match &self.server.base_url {
            Some(url) => url.clone(),
            None => env::var("WINLENS_SERVER_URL")
                .ok()
                .filter(|url| !url.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_owned()),
        };
        raw.trim().trim_end_matches('/').to_owned()
    }

    pub fn timeout(&self) -> Result<Duration> {
        parse_duration(self.server.timeout.as_deref().unwrap_or(DEFAULT_TIMEOUT))
    }

    pub fn page_size(&self) -> u64 {
        self.pagination
            .page_size
            .and_then(|size| u64::try_from(size).ok())
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    pub fn style(&self) -> StylingStrategy {
        self.render
            .style
            .as_deref()
            .and_then(StylingStrategy::parse)
            .unwrap_or_default()
    }

    pub fn example_config(path: &Path) -> String {
        format!(
            "# winlens config\n# Place this file at: {}\n\nversion = 1\n\n[server]\n# Unset falls back to WINLENS_SERVER_URL, then {}\n# base_url = \"{}\"\ntimeout = \"{}\"\n\n[pagination]\n# Windows fetched per request (1-{})\npage_size = {}\n\n[render]\n# \"percentile\" or \"intensity\"\nstyle = \"{}\"\n",
            path.display(),
            DEFAULT_BASE_URL,
            DEFAULT_BASE_URL,
            DEFAULT_TIMEOUT,
            MAX_PAGE_SIZE,
            DEFAULT_PAGE_SIZE,
            StylingStrategy::default().as_str(),
        )
    }
}

fn parse_duration(raw: &str) -> Result<Duration> {
    let trimmed = raw.trim();
    let unit_start = trimmed
        .find(|ch: char| !ch.is_ascii_digit())
        .unwrap_or(trimmed.len());
    let (digits, unit) = trimmed.split_at(unit_start);
    let value: u64 = digits.parse().with_context(|| {
        format!("invalid duration {raw:?}; expected a whole number followed by ms, s or m")
    })?;

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        "s" => Ok(Duration::from_secs(value)),
        "m" => value
            .checked_mul(60)
            .map(Duration::from_secs)
            .ok_or_else(|| anyhow!("duration {raw:?} is too large")),
        _ => bail!(
            "invalid duration {raw:?}; use one of: <N>ms, <N>s, <N>m (for example 500ms or 10s)"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::{Config, parse_duration};
    use anyhow::Result;
    use std::path::PathBuf;
    use std::sync::{Mutex, OnceLock};
    use std::time::Duration;
    use winlens_app::StylingStrategy;

    fn write_config(content: &str) -> Result<(tempfile::TempDir, PathBuf)> {
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        std::fs::write(&path, content)?;
        Ok((temp, path))
    }

    fn env_lock() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        match ENV_LOCK.get_or_init(|| Mutex::new(())).lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    #[test]
    fn missing_config_uses_defaults() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("WINLENS_SERVER_URL");
        }
        let config = Config::load(&temp.path().join("missing.toml"))?;
        assert_eq!(config.version, 1);
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.timeout()?, Duration::from_secs(10));
        assert_eq!(config.page_size(), 500);
        assert_eq!(config.style(), StylingStrategy::Percentile);
        Ok(())
    }

    #[test]
    fn unversioned_config_is_rejected_with_actionable_message() -> Result<()> {
        let (_temp, path) = write_config("[server]\nbase_url=\"http://x\"\n")?;
        let error = Config::load(&path).expect_err("unversioned config should fail");
        let message = error.to_string();
        assert!(message.contains("version = 1"));
        assert!(message.contains("[server], [pagination], and [render]"));
        Ok(())
    }

    #[test]
    fn v1_config_parses() -> Result<()> {
        let (_temp, path) = write_config(
            "version = 1\n[server]\nbase_url = \"http://analysis:9000\"\ntimeout = \"750ms\"\n[pagination]\npage_size = 250\n[render]\nstyle = \"intensity\"\n",
        )?;

        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://analysis:9000");
        assert_eq!(config.timeout()?, Duration::from_millis(750));
        assert_eq!(config.page_size(), 250);
        assert_eq!(config.style(), StylingStrategy::Intensity);
        Ok(())
    }

    #[test]
    fn malformed_config_returns_parse_error() -> Result<()> {
        let (_temp, path) = write_config("{{not toml")?;
        let error = Config::load(&path).expect_err("malformed config should fail");
        assert!(error.to_string().contains("parse TOML config"));
        Ok(())
    }

    #[test]
    fn unsupported_config_version_is_rejected() -> Result<()> {
        let (_temp, path) = write_config("version = 2\n")?;
        let error = Config::load(&path).expect_err("v2 config should fail");
        assert!(error.to_string().contains("unsupported config version 2"));
        Ok(())
    }

    #[test]
    fn default_path_honors_env_override() -> Result<()> {
        let _guard = env_lock();
        let temp = tempfile::tempdir()?;
        let override_path = temp.path().join("custom-config.toml");
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("WINLENS_CONFIG_PATH", &override_path);
        }
        let resolved = Config::default_path()?;
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("WINLENS_CONFIG_PATH");
        }
        assert_eq!(resolved, override_path);
        Ok(())
    }

    #[test]
    fn default_path_uses_config_toml_suffix_when_no_env_override() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("WINLENS_CONFIG_PATH");
        }
        let path = Config::default_path()?;
        assert!(path.ends_with("winlens/config.toml"));
        Ok(())
    }

    #[test]
    fn base_url_prefers_config_over_env_override() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) =
            write_config("version = 1\n[server]\nbase_url = \"http://from-config:8000\"\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("WINLENS_SERVER_URL", "http://from-env:8000");
        }
        let config = Config::load(&path)?;
        let resolved = config.base_url();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("WINLENS_SERVER_URL");
        }
        assert_eq!(resolved, "http://from-config:8000");
        Ok(())
    }

    #[test]
    fn base_url_uses_env_override_when_config_is_silent() -> Result<()> {
        let _guard = env_lock();
        let (_temp, path) = write_config("version = 1\n")?;
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::set_var("WINLENS_SERVER_URL", "http://from-env:8000/");
        }
        let config = Config::load(&path)?;
        let resolved = config.base_url();
        // SAFETY: test cleanup for process-local env mutation.
        unsafe {
            std::env::remove_var("WINLENS_SERVER_URL");
        }
        assert_eq!(resolved, "http://from-env:8000");
        Ok(())
    }

    #[test]
    fn base_url_trims_trailing_slashes() -> Result<()> {
        let (_temp, path) =
            write_config("version = 1\n[server]\nbase_url = \"http://localhost:8000///\"\n")?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://localhost:8000");
        Ok(())
    }

    #[test]
    fn timeout_parses_ms_seconds_and_minutes() -> Result<()> {
        assert_eq!(parse_duration("500ms")?, Duration::from_millis(500));
        assert_eq!(parse_duration("5s")?, Duration::from_secs(5));
        assert_eq!(parse_duration("2m")?, Duration::from_secs(120));
        Ok(())
    }

    #[test]
    fn timeout_rejects_invalid_duration() {
        for raw in ["oops", "5h", "ms", "1.5s"] {
            let error = parse_duration(raw).expect_err("invalid duration should fail");
            assert!(
                error.to_string().contains("invalid duration"),
                "unexpected message for {raw:?}: {error}"
            );
        }
    }

    #[test]
    fn timeout_rejects_non_positive_values_in_config() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[server]\ntimeout = \"0s\"\n")?;
        let error = Config::load(&path).expect_err("zero timeout should fail");
        assert!(error.to_string().contains("must be positive"));
        Ok(())
    }

    #[test]
    fn page_size_is_bounded() -> Result<()> {
        for bad in ["0", "-5", "2001"] {
            let (_temp, path) =
                write_config(&format!("version = 1\n[pagination]\npage_size = {bad}\n"))?;
            let error = Config::load(&path).expect_err("out of range page size should fail");
            assert!(
                error.to_string().contains("between 1 and 2000"),
                "page_size = {bad}"
            );
        }

        let (_temp, path) = write_config("version = 1\n[pagination]\npage_size = 2000\n")?;
        assert_eq!(Config::load(&path)?.page_size(), 2000);
        Ok(())
    }

    #[test]
    fn unknown_render_style_lists_choices() -> Result<()> {
        let (_temp, path) = write_config("version = 1\n[render]\nstyle = \"rainbow\"\n")?;
        let error = Config::load(&path).expect_err("unknown style should fail");
        let message = error.to_string();
        assert!(message.contains("percentile, intensity"), "{message}");
        assert!(message.contains("rainbow"));
        Ok(())
    }

    #[test]
    fn example_config_parses_back_to_defaults() -> Result<()> {
        let _guard = env_lock();
        // SAFETY: test-only process-local env mutation.
        unsafe {
            std::env::remove_var("WINLENS_SERVER_URL");
        }
        let temp = tempfile::tempdir()?;
        let path = temp.path().join("config.toml");
        let example = Config::example_config(&path);
        assert!(example.contains("version = 1"));
        assert!(example.contains("[server]"));
        assert!(example.contains("[pagination]"));
        assert!(example.contains("[render]"));

        std::fs::write(&path, &example)?;
        let config = Config::load(&path)?;
        assert_eq!(config.base_url(), "http://localhost:8000");
        assert_eq!(config.page_size(), 500);
        assert_eq!(config.style(), StylingStrategy::Percentile);
        Ok(())
    }
}

//! Configuration loader and path helpers.
//!
//! Uses Figment to merge `config.toml` + `config.<env>.toml` + `APP_*` env vars
//! (`__` separates nesting, so `APP_OCR__KEY` sets `ocr.key`). Typed sections
//! fall back to their defaults when absent. Paths expand `~` and `${VAR}` and
//! resolve against the directory the config files were loaded from.
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::types::BBox;

pub struct Config {
    figment: Figment,
    base: PathBuf,
}

impl Config {
    pub fn load() -> anyhow::Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(base: &Path) -> anyhow::Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::new().merge(Toml::file(base.join("config.toml")));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file(base.join("config.dev.toml"))),
            "prod" | "production" => figment = figment.merge(Toml::file(base.join("config.prod.toml"))),
            "test" | "testing" => figment = figment.merge(Toml::file(base.join("config.test.toml"))),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, base: base.to_path_buf() };
        config.validate_for_env(&env_name)?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| anyhow::anyhow!("Failed to get '{}': {}", key, e))
    }

    /// Like [`Config::get`], but an absent section yields `T::default()`.
    pub fn section<T>(&self, key: &str) -> anyhow::Result<T>
    where
        T: serde::de::DeserializeOwned + Default,
    {
        if self.figment.find_value(key).is_err() {
            return Ok(T::default());
        }
        self.get(key)
    }

    pub fn plan(&self) -> anyhow::Result<PlanSettings> { self.section("plan") }
    pub fn ocr(&self) -> anyhow::Result<OcrSettings> { self.section("ocr") }
    pub fn retry(&self) -> anyhow::Result<RetrySettings> { self.section("retry") }
    pub fn ingest(&self) -> anyhow::Result<IngestSettings> { self.section("ingest") }
    pub fn rasterize(&self) -> anyhow::Result<RasterizeSettings> { self.section("rasterize") }

    /// Resolve a configured path against the config directory.
    pub fn path<S: AsRef<str>>(&self, p: S) -> PathBuf { resolve_with_base(&self.base, p) }

    fn validate_for_env(&self, env: &str) -> anyhow::Result<()> {
        let plan = self.plan()?;
        let region = plan.page_number_region;
        if region.left > region.right || region.top > region.bottom {
            anyhow::bail!("plan.page_number_region has inverted edges: {region}");
        }
        let retry = self.retry()?;
        if retry.max_attempts == 0 {
            anyhow::bail!("retry.max_attempts must be at least 1");
        }
        if retry.multiplier < 1.0 {
            anyhow::bail!("retry.multiplier must be >= 1.0, got {}", retry.multiplier);
        }
        if self.ingest()?.concurrency == 0 {
            anyhow::bail!("ingest.concurrency must be at least 1");
        }
        match env {
            "prod" | "production" => {
                if self.ocr()?.endpoint.is_empty() {
                    anyhow::bail!("ocr.endpoint must be set in production");
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            _ => {}
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanSettings {
    /// Folder holding one `.png` per plan page.
    pub dir: String,
    /// OCR snapshot JSON, reused across runs to skip repeat OCR calls.
    pub snapshot: String,
    /// Curated detail-graphic registrations.
    pub registry: String,
    /// Where every page carries its own page number.
    pub page_number_region: BBox,
}

impl Default for PlanSettings {
    fn default() -> Self {
        Self {
            dir: "static/plan".to_string(),
            snapshot: "static/plan/ocr_snapshot.json".to_string(),
            registry: "static/plan/graphics.json".to_string(),
            page_number_region: BBox::new(3645, 2376, 4050, 2700),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OcrSettings {
    pub endpoint: String,
    pub key: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for OcrSettings {
    fn default() -> Self {
        Self { endpoint: String::new(), key: String::new(), language: "unk".to_string(), timeout_secs: 120 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Total tries, including the first one.
    pub max_attempts: usize,
    pub initial_delay_ms: u64,
    pub multiplier: f32,
    pub max_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self { max_attempts: 6, initial_delay_ms: 5_000, multiplier: 1.5, max_delay_ms: 60_000 }
    }
}

impl RetrySettings {
    pub fn initial_delay(&self) -> Duration { Duration::from_millis(self.initial_delay_ms) }
    pub fn max_delay(&self) -> Duration { Duration::from_millis(self.max_delay_ms) }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestSettings {
    /// Pages sent to the OCR provider at once.
    pub concurrency: usize,
}

impl Default for IngestSettings {
    fn default() -> Self { Self { concurrency: 4 } }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RasterizeSettings {
    pub long_edge_px: u32,
    pub binary: String,
}

impl Default for RasterizeSettings {
    fn default() -> Self { Self { long_edge_px: 2400, binary: "pdftoppm".to_string() } }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

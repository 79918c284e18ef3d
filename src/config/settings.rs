use anyhow::{Context, Result};
use directories::BaseDirs;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::ConfigError;

/// Values containing this marker are unconfigured placeholders.
pub const PLACEHOLDER_MARKER: &str = "<your-";

pub const DEFAULT_COLLECTION_URL: &str = "https://dev.azure.com/<your-org>";
pub const DEFAULT_PROJECT: &str = "<your-project>";
pub const DEFAULT_REPO: &str = "<your-repository>";

pub const LOCAL_CONFIG_FILE: &str = "ado.json";
const GLOBAL_CONFIG_FILE: &str = "config.json";
const CONFIG_DIR_NAME: &str = "ado";

pub const ENV_PAT: &str = "DEVOPS_PAT";
pub const ENV_COLLECTION_URL: &str = "ADO_COLLECTION_URL";
pub const ENV_PROJECT: &str = "ADO_PROJECT";
pub const ENV_REPO: &str = "ADO_REPO";
pub const ENV_INSECURE: &str = "ADO_INSECURE";

pub fn is_placeholder(value: &str) -> bool {
    value.contains(PLACEHOLDER_MARKER)
}

/// One configuration source. Config files use exactly this shape.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigLayer {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pat: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,
}

impl ConfigLayer {
    /// Build the environment layer. Empty variables count as unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            pat: get(ENV_PAT),
            collection_url: get(ENV_COLLECTION_URL),
            project: get(ENV_PROJECT),
            repo: get(ENV_REPO),
            insecure: get(ENV_INSECURE)
                .map(|v| v.trim() == "1" || v.trim().eq_ignore_ascii_case("true")),
        }
    }

    /// Read a config file. Missing files are empty; unreadable or malformed
    /// files are empty too, with a warning.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            debug!(path = %path.display(), "config file not present");
            return Self::default();
        }

        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "failed to read config file, ignoring it");
                return Self::default();
            }
        };

        match serde_json::from_str(&content) {
            Ok(layer) => layer,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "malformed config file, ignoring it");
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let mut content = serde_json::to_string_pretty(self).context("Failed to serialize config")?;
        content.push('\n');

        fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        #[cfg(unix)]
        if self.pat.is_some() {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(path, fs::Permissions::from_mode(0o600)).with_context(|| {
                format!("Failed to restrict permissions on {}", path.display())
            })?;
        }

        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSource {
    Env,
    LocalFile,
    GlobalFile,
    Default,
}

impl ConfigSource {
    pub fn label(self) -> &'static str {
        match self {
            Self::Env => "env",
            Self::LocalFile => "local (ado.json)",
            Self::GlobalFile => "global config",
            Self::Default => "default",
        }
    }
}

/// A merged value and the layer it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolved<T> {
    pub value: T,
    pub source: ConfigSource,
}

/// The three on-disk/env sources, highest priority first.
#[derive(Debug, Clone, Default)]
pub struct ConfigLayers {
    pub env: ConfigLayer,
    pub local: ConfigLayer,
    pub global: ConfigLayer,
}

impl ConfigLayers {
    pub fn load() -> Result<Self> {
        Ok(Self {
            env: ConfigLayer::from_env(),
            local: ConfigLayer::load(&local_config_path()?),
            global: ConfigLayer::load(&global_config_path()?),
        })
    }

    fn pick<T>(&self, field: impl Fn(&ConfigLayer) -> Option<T>) -> Option<Resolved<T>> {
        [
            (&self.env, ConfigSource::Env),
            (&self.local, ConfigSource::LocalFile),
            (&self.global, ConfigSource::GlobalFile),
        ]
        .into_iter()
        .find_map(|(layer, source)| field(layer).map(|value| Resolved { value, source }))
    }

    /// Merge the layers field by field without validating anything.
    pub fn effective(&self) -> EffectiveConfig {
        let text = |s: &Option<String>| {
            s.as_deref()
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };
        let or_default = |resolved: Option<Resolved<String>>, default: &str| {
            resolved.unwrap_or_else(|| Resolved {
                value: default.to_string(),
                source: ConfigSource::Default,
            })
        };

        EffectiveConfig {
            pat: self.pick(|l| text(&l.pat)),
            collection_url: or_default(
                self.pick(|l| text(&l.collection_url)),
                DEFAULT_COLLECTION_URL,
            ),
            project: or_default(self.pick(|l| text(&l.project)), DEFAULT_PROJECT),
            repo: or_default(self.pick(|l| text(&l.repo)), DEFAULT_REPO),
            insecure: self.pick(|l| l.insecure).unwrap_or(Resolved {
                value: false,
                source: ConfigSource::Default,
            }),
        }
    }
}

/// Merged but unvalidated configuration, used by `ado config` to show
/// incomplete setups as well as complete ones.
pub struct EffectiveConfig {
    pub pat: Option<Resolved<String>>,
    pub collection_url: Resolved<String>,
    pub project: Resolved<String>,
    pub repo: Resolved<String>,
    pub insecure: Resolved<bool>,
}

impl EffectiveConfig {
    pub fn validate(self) -> Result<Config, ConfigError> {
        let pat = self.pat.ok_or(ConfigError::MissingToken)?.value;

        let missing: Vec<&'static str> = [
            ("collection URL", &self.collection_url.value),
            ("project", &self.project.value),
            ("repo", &self.repo.value),
        ]
        .into_iter()
        .filter(|(_, value)| is_placeholder(value))
        .map(|(name, _)| name)
        .collect();

        if !missing.is_empty() {
            return Err(ConfigError::Incomplete { missing });
        }

        Ok(Config {
            pat: SecretString::from(pat),
            collection_url: self.collection_url.value,
            project: self.project.value,
            repo: self.repo.value,
            insecure_tls: self.insecure.value,
        })
    }
}

/// Fully resolved configuration, built once per invocation.
#[derive(Debug)]
pub struct Config {
    pub pat: SecretString,
    pub collection_url: String,
    pub project: String,
    pub repo: String,
    pub insecure_tls: bool,
}

impl Config {
    /// Resolve from env, `./ado.json` and the global config file.
    pub fn resolve() -> Result<Self> {
        let layers = ConfigLayers::load()?;
        Ok(layers.effective().validate()?)
    }

    /// An explicit repository argument wins over the configured default.
    pub fn pick_repo<'a>(&'a self, explicit: Option<&'a str>) -> &'a str {
        explicit
            .map(str::trim)
            .filter(|r| !r.is_empty())
            .unwrap_or(self.repo.as_str())
    }
}

/// Redact a token for display: first 4, stars, last 4.
pub fn censor_pat(pat: &str) -> String {
    let chars: Vec<char> = pat.chars().collect();
    if chars.len() <= 8 {
        return "****".to_string();
    }

    let head: String = chars[..4].iter().collect();
    let tail: String = chars[chars.len() - 4..].iter().collect();
    format!("{}{}{}", head, "*".repeat(chars.len() - 8), tail)
}

pub fn local_config_path() -> Result<PathBuf> {
    let cwd = std::env::current_dir().context("Failed to determine current directory")?;
    Ok(cwd.join(LOCAL_CONFIG_FILE))
}

pub fn global_config_dir() -> Result<PathBuf> {
    global_config_dir_from(std::env::var_os("XDG_CONFIG_HOME"))
}

pub fn global_config_path() -> Result<PathBuf> {
    Ok(global_config_dir()?.join(GLOBAL_CONFIG_FILE))
}

fn global_config_dir_from(xdg_config_home: Option<OsString>) -> Result<PathBuf> {
    if let Some(xdg) = xdg_config_home.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(xdg).join(CONFIG_DIR_NAME));
    }

    let base = BaseDirs::new().context("Failed to determine home directory")?;
    Ok(base.home_dir().join(".config").join(CONFIG_DIR_NAME))
}

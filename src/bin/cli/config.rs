use graphload::IngestOptions;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Option values that replace the configured ones when present.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct IngestOverrides {
    pub node_dir: Option<String>,
    pub edge_dir: Option<String>,
    pub node_discriminator: Option<String>,
    pub edge_discriminator: Option<String>,
    pub primary_key: Option<String>,
    pub file_extension: Option<String>,
    pub namespace_separator: Option<String>,
    pub max_attempts: Option<u32>,
    pub backoff_ms: Option<u64>,
}

impl IngestOverrides {
    pub fn apply(&self, opts: &mut IngestOptions) {
        fn set<T: Clone>(slot: &mut T, value: &Option<T>) {
            if let Some(value) = value {
                *slot = value.clone();
            }
        }
        set(&mut opts.node_dir, &self.node_dir);
        set(&mut opts.edge_dir, &self.edge_dir);
        set(&mut opts.node_discriminator, &self.node_discriminator);
        set(&mut opts.edge_discriminator, &self.edge_discriminator);
        set(&mut opts.primary_key, &self.primary_key);
        set(&mut opts.file_extension, &self.file_extension);
        set(&mut opts.namespace_separator, &self.namespace_separator);
        set(&mut opts.max_attempts, &self.max_attempts);
        set(&mut opts.backoff_ms, &self.backoff_ms);
    }
}

#[derive(Debug, Clone)]
pub struct Profile {
    pub name: String,
    pub dataset: Option<PathBuf>,
    pub database: Option<PathBuf>,
    pub shell: Option<PathBuf>,
    pub shell_args: Vec<String>,
    pub overrides: IngestOverrides,
}

#[derive(Debug, Default)]
pub struct CliConfig {
    path: Option<PathBuf>,
    data: RawConfig,
    profiles: HashMap<String, Profile>,
}

impl CliConfig {
    pub fn load(explicit: Option<PathBuf>) -> Result<Self, ConfigError> {
        let path = explicit.or_else(default_config_path);
        let data = match path.as_ref() {
            Some(config_path) if config_path.exists() => read_file(config_path)?,
            _ => RawConfig::default(),
        };
        let profiles = parse_profiles(&data)?;
        Ok(Self {
            path,
            data,
            profiles,
        })
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn default_profile_name(&self) -> Option<&str> {
        self.data
            .default_profile
            .as_deref()
            .filter(|name| self.profiles.contains_key(*name))
    }

    pub fn profile(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    /// Picks `requested`, else the configured default profile.
    pub fn select_profile(&self, requested: Option<&str>) -> Result<Option<&Profile>, ConfigError> {
        match requested {
            Some(name) => self
                .profile(name)
                .map(Some)
                .ok_or_else(|| ConfigError::ProfileNotFound {
                    name: name.to_string(),
                }),
            None => Ok(self.default_profile_name().and_then(|name| self.profile(name))),
        }
    }

    /// Built-in defaults, then the `[ingest]` section, then the profile.
    pub fn ingest_options(&self, profile: Option<&Profile>) -> IngestOptions {
        let mut opts = self.data.ingest.clone();
        if let Some(profile) = profile {
            profile.overrides.apply(&mut opts);
        }
        opts
    }
}

fn read_file(path: &Path) -> Result<RawConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

fn parse_profiles(data: &RawConfig) -> Result<HashMap<String, Profile>, ConfigError> {
    let profiles: HashMap<String, Profile> = data
        .profiles
        .iter()
        .map(|(name, raw)| (name.clone(), convert_profile(name, raw)))
        .collect();
    if let Some(default_name) = data.default_profile.as_ref() {
        if !profiles.contains_key(default_name) {
            return Err(ConfigError::ProfileNotFound {
                name: default_name.clone(),
            });
        }
    }
    Ok(profiles)
}

fn convert_profile(name: &str, raw: &RawProfile) -> Profile {
    Profile {
        name: name.to_string(),
        dataset: raw.dataset.clone(),
        database: raw.database.clone(),
        shell: raw.shell.clone(),
        shell_args: raw.shell_args.clone(),
        overrides: raw.ingest.clone(),
    }
}

#[derive(Debug, Default, Deserialize)]
struct RawConfig {
    #[serde(default)]
    ingest: IngestOptions,
    #[serde(default)]
    profiles: HashMap<String, RawProfile>,
    #[serde(default)]
    default_profile: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawProfile {
    dataset: Option<PathBuf>,
    database: Option<PathBuf>,
    shell: Option<PathBuf>,
    #[serde(default)]
    shell_args: Vec<String>,
    #[serde(flatten)]
    ingest: IngestOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read CLI config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse CLI config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },
}

pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|base| base.join("graphload").join("cli.toml"))
}

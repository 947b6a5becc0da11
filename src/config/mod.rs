//! Provisioning layout: every path a step may touch, resolved once at startup.
pub mod toml_loader;

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Filesystem layout and identity threaded into every install step.
///
/// Steps never consult the environment for paths; everything they need is
/// carried here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Home directory of the provisioned user.
    pub home: PathBuf,
    /// Root of per-component destinations (`$HOME/dist`).
    pub dist_dir: PathBuf,
    /// Install prefix binaries end up in (`$HOME/bin`).
    pub bin_dir: PathBuf,
    /// Parent of per-step scratch directories.
    ///
    /// Lives next to the destinations so publishing is a same-filesystem
    /// rename.
    pub scratch_root: PathBuf,
    /// Local bare repositories the collaborator steps clone from.
    pub repositories_dir: PathBuf,
    /// Directory holding ssh keys and the gpg home to copy into place.
    pub keys_dir: PathBuf,
    /// Login user whose shell gets switched to fish.
    pub user: String,
}

/// Optional overrides read from `config.toml`.
///
/// Relative paths are resolved against the home directory.
#[derive(Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigFile {
    /// Override for [`Config::dist_dir`].
    pub dist_dir: Option<PathBuf>,
    /// Override for [`Config::bin_dir`].
    pub bin_dir: Option<PathBuf>,
    /// Override for [`Config::scratch_root`].
    pub scratch_root: Option<PathBuf>,
    /// Override for [`Config::repositories_dir`].
    pub repositories_dir: Option<PathBuf>,
    /// Override for [`Config::keys_dir`].
    pub keys_dir: Option<PathBuf>,
    /// Override for [`Config::user`].
    pub user: Option<String>,
}

impl Config {
    /// Default layout rooted at `home`.
    #[must_use]
    pub fn new(home: impl Into<PathBuf>, user: impl Into<String>) -> Self {
        let home = home.into();
        let dist_dir = home.join("dist");
        Self {
            bin_dir: home.join("bin"),
            scratch_root: dist_dir.join(".scratch"),
            repositories_dir: home.join("repositories"),
            keys_dir: home.join("keys"),
            dist_dir,
            home,
            user: user.into(),
        }
    }

    /// Resolve the layout from CLI overrides, the environment and the config
    /// file.
    ///
    /// `config_file` must exist when given explicitly; the default location
    /// (`$XDG_CONFIG_HOME/provision/config.toml`) is optional.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory or login user cannot be
    /// determined, or the config file cannot be read or parsed.
    pub fn load(home: Option<&Path>, config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let home = match home {
            Some(home) => home.to_path_buf(),
            None => std::env::var_os("HOME")
                .filter(|h| !h.is_empty())
                .map(PathBuf::from)
                .ok_or(ConfigError::HomeNotSet)?,
        };

        let overrides: ConfigFile = match config_file {
            Some(path) if !path.exists() => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source: std::io::Error::from(std::io::ErrorKind::NotFound),
                });
            }
            Some(path) => toml_loader::load_config(path)?,
            None => toml_loader::load_config(&default_config_path(&home))?,
        };

        let user = overrides
            .user
            .clone()
            .or_else(login_user)
            .ok_or(ConfigError::UserNotSet)?;

        Ok(Self::new(home, user).with_overrides(overrides))
    }

    /// Apply file overrides on top of this layout.
    #[must_use]
    pub fn with_overrides(mut self, file: ConfigFile) -> Self {
        let home = self.home.clone();
        let resolve = |p: PathBuf| if p.is_absolute() { p } else { home.join(p) };
        if let Some(dist_dir) = file.dist_dir {
            self.dist_dir = resolve(dist_dir);
            // Keep the default scratch root on the same filesystem as dist.
            self.scratch_root = self.dist_dir.join(".scratch");
        }
        if let Some(bin_dir) = file.bin_dir {
            self.bin_dir = resolve(bin_dir);
        }
        if let Some(scratch_root) = file.scratch_root {
            self.scratch_root = resolve(scratch_root);
        }
        if let Some(repositories_dir) = file.repositories_dir {
            self.repositories_dir = resolve(repositories_dir);
        }
        if let Some(keys_dir) = file.keys_dir {
            self.keys_dir = resolve(keys_dir);
        }
        if let Some(user) = file.user {
            self.user = user;
        }
        self
    }

    /// `GOROOT` of the provisioned Go toolchain.
    #[must_use]
    pub fn goroot(&self) -> PathBuf {
        self.dist_dir.join("go")
    }

    /// Destination directory for a component.
    #[must_use]
    pub fn dist(&self, component: &str) -> PathBuf {
        self.dist_dir.join(component)
    }
}

/// `$XDG_CONFIG_HOME/provision/config.toml`, defaulting to `~/.config`.
fn default_config_path(home: &Path) -> PathBuf {
    std::env::var_os("XDG_CONFIG_HOME")
        .filter(|d| !d.is_empty())
        .map_or_else(|| home.join(".config"), PathBuf::from)
        .join("provision")
        .join("config.toml")
}

fn login_user() -> Option<String> {
    ["USER", "LOGNAME"]
        .iter()
        .find_map(|var| std::env::var(var).ok().filter(|u| !u.is_empty()))
}

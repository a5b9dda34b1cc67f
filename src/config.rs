use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Where we look for a config file when --config isn't given.
pub const DEFAULT_CONFIG_FILE: &str = "madang.toml";

#[derive(Error, Debug)]
pub enum ConfError {
    // The generated code for returning an error is cheaper than maybe panicking.
    #[error("a prior check guaranteed that this error would never happen.")]
    Impossible,
}

/// Stuff the app needs that's sourced from configuration.
#[derive(Clone, Debug)]
pub struct MadangConfig {
    /// Whether we're running in production or not. Currently not really consulted
    /// for anything.
    pub production: bool,
    /// Whether to apply pending schema migrations at startup. If false, we
    /// check them instead and refuse to serve on a mismatch.
    pub migrate_on_startup: bool,
    /// The port to listen on.
    pub port: u16,
    /// The location of the database file. Created if it doesn't exist.
    pub db_file: PathBuf,
    /// The directory with static CSS assets.
    pub assets_dir: PathBuf,
    /// If present, logs also go to daily files in this directory.
    pub log_dir: Option<PathBuf>,
}

/// The intermediate struct used for deserializing the config file and
/// generating a usable MadangConfig struct. Every key is optional.
#[derive(Debug, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct PreMadangConfig {
    production: bool,
    migrate_on_startup: bool,
    port: u16,
    // These file paths can be absolute, or relative to the config file's dir.
    db_file: String,
    assets_dir: String,
    log_dir: Option<String>,
}

impl Default for PreMadangConfig {
    fn default() -> Self {
        Self {
            production: false,
            migrate_on_startup: true,
            port: 8501,
            db_file: "madang.db".to_string(),
            assets_dir: "public".to_string(),
            log_dir: None,
        }
    }
}

impl PreMadangConfig {
    fn finalize(self, base_dir: &Path) -> MadangConfig {
        let db_file = base_dir.join(&self.db_file);
        let assets_dir = base_dir.join(&self.assets_dir);
        let log_dir = self.log_dir.as_ref().map(|d| base_dir.join(d));
        let Self {
            production,
            migrate_on_startup,
            port,
            ..
        } = self;
        MadangConfig {
            production,
            migrate_on_startup,
            port,
            db_file,
            assets_dir,
            log_dir,
        }
    }
}

impl MadangConfig {
    /// Load app configuration from a config file. The provided path can be absolute
    /// or relative to the current working directory.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        let abs_path = cwd.join(path.as_ref());
        // This runs before we have a tracing subscriber, so we have to log rudely.
        println!("Startup: loading config file from {:?}", &abs_path);
        let base_dir = abs_path.parent().ok_or(ConfError::Impossible)?;
        let conf_text = std::fs::read_to_string(&abs_path)?;
        Self::from_toml(&conf_text, base_dir)
    }

    /// Parse config text, resolving relative paths against `base_dir`.
    pub fn from_toml(conf_text: &str, base_dir: &Path) -> anyhow::Result<Self> {
        let pre: PreMadangConfig = toml::from_str(conf_text)?;
        Ok(pre.finalize(base_dir))
    }

    /// Built-in defaults, with paths relative to the current working directory.
    pub fn defaults() -> anyhow::Result<Self> {
        let cwd = std::env::current_dir()?;
        Ok(PreMadangConfig::default().finalize(&cwd))
    }

    /// Use the explicitly requested config file, or madang.toml if there's
    /// one in the working directory, or else the defaults.
    pub fn discover(explicit: Option<PathBuf>) -> anyhow::Result<Self> {
        match explicit {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE),
            None => {
                println!("Startup: no {DEFAULT_CONFIG_FILE} found; using defaults");
                Self::defaults()
            }
        }
    }

    #[cfg(test)]
    pub fn test_config() -> anyhow::Result<Self> {
        // tests build their own in-memory db anyway.
        Self::from_toml(
            r#"
                db_file = "ignore_me"
            "#,
            &std::env::current_dir()?,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_means_defaults() {
        let conf = MadangConfig::from_toml("", Path::new("/srv/madang")).unwrap();
        assert!(!conf.production);
        assert!(conf.migrate_on_startup);
        assert_eq!(conf.port, 8501);
        assert_eq!(conf.db_file, PathBuf::from("/srv/madang/madang.db"));
        assert_eq!(conf.assets_dir, PathBuf::from("/srv/madang/public"));
        assert_eq!(conf.log_dir, None);
    }

    #[test]
    fn paths_resolve_against_config_dir() {
        let conf = MadangConfig::from_toml(
            r#"
                port = 3000
                db_file = "data/store.db"
                log_dir = "/var/log/madang"
                migrate_on_startup = false
            "#,
            Path::new("/srv/madang"),
        )
        .unwrap();
        assert_eq!(conf.port, 3000);
        assert!(!conf.migrate_on_startup);
        assert_eq!(conf.db_file, PathBuf::from("/srv/madang/data/store.db"));
        // absolute paths win
        assert_eq!(conf.log_dir, Some(PathBuf::from("/var/log/madang")));
    }

    #[test]
    fn typos_are_errors() {
        assert!(MadangConfig::from_toml("dbfile = \"x.db\"", Path::new("/")).is_err());
    }
}

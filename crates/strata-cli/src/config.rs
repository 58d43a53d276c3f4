//! Configuration file handling for strata.
//!
//! Looks for `.config/strata.styx` in the current directory or any parent directory.

pub use strata_config::{Config, Mode};

use std::path::{Path, PathBuf};

use strata::IntrospectOptions;

const CONFIG_FILE: &str = ".config/strata.styx";

/// Load configuration from `.config/strata.styx`, searching up the directory tree.
pub fn load() -> Result<(Config, PathBuf), ConfigError> {
    let cwd = std::env::current_dir().map_err(|e| ConfigError::Io(e.to_string()))?;
    load_from(&cwd)
}

/// Load configuration starting from a specific directory.
pub fn load_from(start: &Path) -> Result<(Config, PathBuf), ConfigError> {
    let config_path = find_config_file(start)?;
    let content =
        std::fs::read_to_string(&config_path).map_err(|e| ConfigError::Io(e.to_string()))?;

    let config: Config =
        facet_styx::from_str(&content).map_err(|e| ConfigError::Parse(e.to_string()))?;

    Ok((config, config_path))
}

/// Find `.config/strata.styx` by searching up the directory tree.
fn find_config_file(start: &Path) -> Result<PathBuf, ConfigError> {
    let mut current = start.to_path_buf();

    loop {
        let config_path = current.join(CONFIG_FILE);
        if config_path.exists() {
            return Ok(config_path);
        }

        if !current.pop() {
            return Err(ConfigError::NotFound);
        }
    }
}

/// A validated configuration, ready to run a command with.
#[derive(Debug, Clone)]
pub struct Settings {
    pub project_name: String,
    pub mode: Mode,
    /// Resolved against the directory holding `.config/`.
    pub output_dir: Option<PathBuf>,
    pub database_url: String,
    pub options: IntrospectOptions,
}

/// Check `config` and resolve the database URL.
///
/// The URL comes from `flag_url` (`--database-url`), then `env_url`
/// (`DATABASE_URL`), then the file.
pub fn resolve(
    config: &Config,
    root: &Path,
    flag_url: Option<String>,
    env_url: Option<String>,
) -> Result<Settings, ConfigError> {
    if config.project_name.trim().is_empty() {
        return Err(ConfigError::Missing {
            field: "project_name",
        });
    }

    let output_dir = config.output_dir.as_deref().map(|dir| root.join(dir));
    if config.mode == Mode::Db && output_dir.is_none() {
        return Err(ConfigError::Missing {
            field: "output_dir",
        });
    }

    let database_url = flag_url
        .or(env_url)
        .or_else(|| config.database_url.clone())
        .filter(|url| !url.trim().is_empty())
        .ok_or(ConfigError::Missing {
            field: "database_url",
        })?;

    let options = match &config.exclude_schemas {
        Some(schemas) => IntrospectOptions::with_excluded_schemas(schemas.iter().cloned()),
        None => IntrospectOptions::default(),
    };

    Ok(Settings {
        project_name: config.project_name.clone(),
        mode: config.mode,
        output_dir,
        database_url,
        options,
    })
}

/// Project root for a config file found at `<root>/.config/strata.styx`.
pub fn project_root(config_path: &Path) -> &Path {
    config_path
        .parent()
        .and_then(Path::parent)
        .unwrap_or(config_path)
}

/// Errors that can occur when loading configuration.
#[derive(Debug)]
pub enum ConfigError {
    /// No `.config/strata.styx` found in any parent directory
    NotFound,
    /// I/O error reading the file
    Io(String),
    /// Parse error in the Styx file
    Parse(String),
    /// A required setting has no value
    Missing { field: &'static str },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::NotFound => {
                write!(
                    f,
                    "No .config/strata.styx found in current directory or any parent"
                )
            }
            ConfigError::Io(e) => write!(f, "Failed to read .config/strata.styx: {}", e),
            ConfigError::Parse(e) => write!(f, "Failed to parse .config/strata.styx: {}", e),
            ConfigError::Missing {
                field: "database_url",
            } => write!(
                f,
                "No database URL: pass --database-url, set DATABASE_URL, or add database_url to .config/strata.styx"
            ),
            ConfigError::Missing { field } => {
                write!(f, "Missing `{}` in .config/strata.styx", field)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config {
            project_name: "shop".to_string(),
            ..Default::default()
        }
    }

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("strata-cli-{}-{}", name, std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_flag_beats_env_beats_file() {
        let cfg = Config {
            database_url: Some("postgres://file".to_string()),
            ..config()
        };
        let root = Path::new("/srv/shop");

        let s = resolve(
            &cfg,
            root,
            Some("postgres://flag".to_string()),
            Some("postgres://env".to_string()),
        )
        .unwrap();
        assert_eq!(s.database_url, "postgres://flag");

        let s = resolve(&cfg, root, None, Some("postgres://env".to_string())).unwrap();
        assert_eq!(s.database_url, "postgres://env");

        let s = resolve(&cfg, root, None, None).unwrap();
        assert_eq!(s.database_url, "postgres://file");
    }

    #[test]
    fn test_missing_database_url() {
        let err = resolve(&config(), Path::new("."), None, Some(" ".to_string())).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Missing {
                field: "database_url"
            }
        ));
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn test_blank_project_name() {
        let cfg = Config {
            project_name: "  ".to_string(),
            ..config()
        };
        let err = resolve(&cfg, Path::new("."), Some("postgres://x".to_string()), None)
            .unwrap_err();
        assert_eq!(err.to_string(), "Missing `project_name` in .config/strata.styx");
    }

    #[test]
    fn test_db_mode_needs_output_dir() {
        let cfg = Config {
            mode: Mode::Db,
            ..config()
        };
        let url = || Some("postgres://x".to_string());
        assert!(matches!(
            resolve(&cfg, Path::new("."), url(), None),
            Err(ConfigError::Missing {
                field: "output_dir"
            })
        ));

        let cfg = Config {
            output_dir: Some("src/models".to_string()),
            ..cfg
        };
        let s = resolve(&cfg, Path::new("/srv/shop"), url(), None).unwrap();
        assert_eq!(s.output_dir.unwrap(), Path::new("/srv/shop/src/models"));
    }

    #[test]
    fn test_exclude_schemas_replace_defaults() {
        let url = || Some("postgres://x".to_string());
        let s = resolve(&config(), Path::new("."), url(), None).unwrap();
        assert!(s.options.is_excluded("pg_catalog"));

        let cfg = Config {
            exclude_schemas: Some(vec!["staging".to_string()]),
            ..config()
        };
        let s = resolve(&cfg, Path::new("."), url(), None).unwrap();
        assert!(s.options.is_excluded("staging"));
        assert!(!s.options.is_excluded("pg_catalog"));
    }

    #[test]
    fn test_project_root() {
        let path = Path::new("/srv/shop/.config/strata.styx");
        assert_eq!(project_root(path), Path::new("/srv/shop"));
    }

    #[test]
    fn test_find_walks_up() {
        let root = scratch_dir("find");
        std::fs::create_dir_all(root.join(".config")).unwrap();
        std::fs::write(root.join(CONFIG_FILE), "project_name shop\n").unwrap();
        let nested = root.join("crates/app/src");
        std::fs::create_dir_all(&nested).unwrap();

        let found = find_config_file(&nested).unwrap();
        assert_eq!(found, root.join(CONFIG_FILE));

        let (config, path) = load_from(&nested).unwrap();
        assert_eq!(config.project_name, "shop");
        assert_eq!(config.mode, Mode::Code);
        assert_eq!(project_root(&path), root.as_path());

        std::fs::remove_dir_all(&root).unwrap();
    }
}

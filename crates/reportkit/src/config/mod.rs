//! Where the CLI finds its inputs and keeps its files. Everything lives
//! under `~/.reportkit` unless `--out-dir` moves the saved-query store.

use std::fmt::{Display, Formatter};
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::drilldown::ROLL_UP_MARKER;
use crate::sqlite::SAVED_QUERIES_FILE_NAME;

pub const DATA_DIR_NAME: &str = ".reportkit";
pub const SETTINGS_FILE_NAME: &str = "settings.json";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    NotAbsolute { flag: &'static str, path: PathBuf },
    UserHome(PathBuf),
}

impl Display for PathError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotAbsolute { flag, path } => {
                write!(f, "{flag} must be absolute: {}", path.display())
            }
            Self::UserHome(path) => write!(
                f,
                "`~user` paths are not supported, use `~/...`: {}",
                path.display()
            ),
        }
    }
}

impl std::error::Error for PathError {}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    pub home_dir: PathBuf,
    pub cwd: PathBuf,
    /// Directory holding the saved-query store.
    pub out_dir: PathBuf,
}

impl RuntimePaths {
    pub fn new(home_dir: &Path, cwd: &Path, out_dir: Option<&Path>) -> Result<Self, PathError> {
        let home_dir = absolute("--home-dir", home_dir)?;
        let cwd = absolute("--cwd", cwd)?;
        let out_dir = match out_dir {
            Some(path) => resolve_against(path, &home_dir, &cwd)?,
            None => home_dir.join(DATA_DIR_NAME),
        };
        Ok(Self {
            home_dir,
            cwd,
            out_dir,
        })
    }

    #[must_use]
    pub fn data_dir(&self) -> PathBuf {
        self.home_dir.join(DATA_DIR_NAME)
    }

    #[must_use]
    pub fn settings_path(&self) -> PathBuf {
        self.data_dir().join(SETTINGS_FILE_NAME)
    }

    #[must_use]
    pub fn saved_queries_path(&self) -> PathBuf {
        self.out_dir.join(SAVED_QUERIES_FILE_NAME)
    }

    /// Query and table files named on the command line: `~/` is the home
    /// directory, other relative paths start at `cwd`.
    pub fn resolve_input(&self, path: &Path) -> Result<PathBuf, PathError> {
        resolve_against(path, &self.home_dir, &self.cwd)
    }

    /// Reads the settings file; a missing file means defaults.
    pub fn load_settings(&self) -> Result<Settings> {
        let path = self.settings_path();
        let present = path
            .try_exists()
            .with_context(|| format!("failed to check settings file: {}", path.display()))?;
        if !present {
            return Ok(Settings::default());
        }

        let raw = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read settings file: {}", path.display()))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("failed to decode settings json: {}", path.display()))
    }
}

/// Per-user defaults read from `~/.reportkit/settings.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Settings {
    /// Saved-query owner when `--user` is not given.
    #[serde(default)]
    pub user: Option<String>,

    /// Crosstab header that names a rolled-up row or column.
    #[serde(default)]
    pub roll_up_marker: Option<String>,
}

impl Settings {
    #[must_use]
    pub fn roll_up_marker(&self) -> &str {
        self.roll_up_marker
            .as_deref()
            .filter(|marker| !marker.trim().is_empty())
            .unwrap_or(ROLL_UP_MARKER)
    }
}

fn absolute(flag: &'static str, path: &Path) -> Result<PathBuf, PathError> {
    if path.is_absolute() {
        Ok(normalize(path))
    } else {
        Err(PathError::NotAbsolute {
            flag,
            path: path.to_path_buf(),
        })
    }
}

fn resolve_against(path: &Path, home_dir: &Path, cwd: &Path) -> Result<PathBuf, PathError> {
    let mut components = path.components();
    let joined = match components.next() {
        Some(Component::Normal(first)) if first == "~" => home_dir.join(components.as_path()),
        Some(Component::Normal(first)) if first.to_string_lossy().starts_with('~') => {
            return Err(PathError::UserHome(path.to_path_buf()));
        }
        _ => cwd.join(path),
    };
    Ok(normalize(&joined))
}

/// Drops `.` and folds `..` without touching the filesystem.
fn normalize(path: &Path) -> PathBuf {
    path.components()
        .fold(PathBuf::new(), |mut normalized, component| {
            match component {
                Component::CurDir => {}
                Component::ParentDir if normalized.file_name().is_some() => {
                    normalized.pop();
                }
                other => normalized.push(other.as_os_str()),
            }
            normalized
        })
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::time::{SystemTime, UNIX_EPOCH};

    use super::{PathError, RuntimePaths};

    fn paths() -> RuntimePaths {
        RuntimePaths::new(Path::new("/home/marge"), Path::new("/srv/reports"), None)
            .expect("paths should resolve")
    }

    fn unique_home(prefix: &str) -> PathBuf {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        std::env::temp_dir().join(format!("{prefix}-{}-{nanos}", std::process::id()))
    }

    #[test]
    fn store_and_settings_default_to_the_data_dir() {
        let paths = paths();

        assert_eq!(paths.out_dir, Path::new("/home/marge/.reportkit"));
        assert_eq!(
            paths.saved_queries_path(),
            Path::new("/home/marge/.reportkit/saved_queries.sqlite")
        );
        assert_eq!(
            paths.settings_path(),
            Path::new("/home/marge/.reportkit/settings.json")
        );
    }

    #[test]
    fn out_dir_moves_only_the_store() {
        let paths = RuntimePaths::new(
            Path::new("/home/marge"),
            Path::new("/srv/reports"),
            Some(Path::new("./shared/../shared/store")),
        )
        .expect("relative out dir should resolve");

        assert_eq!(
            paths.saved_queries_path(),
            Path::new("/srv/reports/shared/store/saved_queries.sqlite")
        );
        assert_eq!(
            paths.settings_path(),
            Path::new("/home/marge/.reportkit/settings.json")
        );
    }

    #[test]
    fn inputs_resolve_against_cwd_or_home() {
        let paths = paths();

        assert_eq!(
            paths
                .resolve_input(Path::new("crosstabs/../crosstabs/by_state.json"))
                .expect("relative input should resolve"),
            Path::new("/srv/reports/crosstabs/by_state.json")
        );
        assert_eq!(
            paths
                .resolve_input(Path::new("~/tables/employees.json"))
                .expect("home input should resolve"),
            Path::new("/home/marge/tables/employees.json")
        );
        assert_eq!(
            paths
                .resolve_input(Path::new("/tmp/query.json"))
                .expect("absolute input should resolve"),
            Path::new("/tmp/query.json")
        );
    }

    #[test]
    fn relative_home_and_user_homes_are_rejected() {
        assert_eq!(
            RuntimePaths::new(Path::new("home/marge"), Path::new("/srv"), None),
            Err(PathError::NotAbsolute {
                flag: "--home-dir",
                path: PathBuf::from("home/marge"),
            })
        );

        let error = paths()
            .resolve_input(Path::new("~homer/query.json"))
            .expect_err("~user syntax must fail");
        assert_eq!(error, PathError::UserHome(PathBuf::from("~homer/query.json")));
        assert!(error.to_string().contains("`~user` paths are not supported"));
    }

    #[test]
    fn settings_are_optional_and_strict() {
        let home = unique_home("reportkit-settings");
        let paths = RuntimePaths::new(&home, Path::new("/srv"), None).expect("paths should resolve");

        let defaults = paths.load_settings().expect("missing settings are defaults");
        assert_eq!(defaults.user, None);
        assert_eq!(defaults.roll_up_marker(), "Roll Up");

        std::fs::create_dir_all(paths.data_dir()).expect("data dir should be creatable");
        std::fs::write(
            paths.settings_path(),
            r#"{"user": "lisa", "rollUpMarker": "All"}"#,
        )
        .expect("settings should be writable");
        let settings = paths.load_settings().expect("settings should load");
        assert_eq!(settings.user.as_deref(), Some("lisa"));
        assert_eq!(settings.roll_up_marker(), "All");

        std::fs::write(paths.settings_path(), r#"{"pageSize": 10}"#)
            .expect("settings should be writable");
        assert!(paths.load_settings().is_err());

        std::fs::remove_dir_all(&home).expect("temp dir cleanup should succeed");
    }
}

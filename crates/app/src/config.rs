//! File + flag configuration for the quiz binary.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result, bail};
use quiz_core::{QuizPolicy, QuizPolicyDraft};
use serde::Deserialize;
use services::SqliteSettings;

pub const DEFAULT_DB_URL: &str = "sqlite://quiz.sqlite3";
pub const DEFAULT_CORPUS_DIR: &str = "corpus";

/// Contents of the optional TOML config file. Every field may be omitted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub database_url: Option<String>,
    pub corpus_dir: Option<PathBuf>,
    pub database: DatabaseDraft,
    pub policy: QuizPolicyDraft,
}

/// `[database]` table: pool tuning for the `SQLite` file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseDraft {
    pub max_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub busy_timeout_ms: Option<u64>,
}

impl DatabaseDraft {
    /// # Errors
    ///
    /// Fails for a zero-sized pool.
    pub fn resolve(&self) -> Result<SqliteSettings> {
        let defaults = SqliteSettings::default();
        let max_connections = self.max_connections.unwrap_or(defaults.max_connections);
        if max_connections == 0 {
            bail!("max_connections must be at least 1");
        }
        Ok(SqliteSettings {
            max_connections,
            acquire_timeout: self
                .acquire_timeout_secs
                .map_or(defaults.acquire_timeout, Duration::from_secs),
            busy_timeout: self
                .busy_timeout_ms
                .map_or(defaults.busy_timeout, Duration::from_millis),
        })
    }
}

impl FileConfig {
    /// Parse a config file.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read or is not valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        toml::from_str(&raw).with_context(|| format!("invalid config {}", path.display()))
    }
}

/// Fully resolved settings: flags win over the file, the file wins over defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub database_url: String,
    pub corpus_dir: PathBuf,
    pub sqlite: SqliteSettings,
    pub policy: QuizPolicy,
}

impl AppConfig {
    /// # Errors
    ///
    /// Fails if the policy table holds out-of-range values or the database URL is blank.
    pub fn resolve(
        file: FileConfig,
        db_flag: Option<String>,
        corpus_flag: Option<PathBuf>,
    ) -> Result<Self> {
        let raw_db = db_flag
            .or(file.database_url)
            .unwrap_or_else(|| DEFAULT_DB_URL.to_string());
        if raw_db.trim().is_empty() {
            bail!("database url must not be empty");
        }

        let policy = file.policy.validate().context("invalid [policy] table")?;
        let sqlite = file.database.resolve().context("invalid [database] table")?;

        Ok(Self {
            database_url: normalize_sqlite_url(raw_db),
            corpus_dir: corpus_flag
                .or(file.corpus_dir)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_CORPUS_DIR)),
            sqlite,
            policy,
        })
    }
}

/// Turn `sqlite:relative.db` or a bare path into an absolute `sqlite://` URL.
pub fn normalize_sqlite_url(raw: String) -> String {
    if raw == "sqlite::memory:" || raw.starts_with("sqlite://") {
        return raw;
    }

    let trimmed = raw.trim().to_string();
    let path_str = trimmed
        .strip_prefix("sqlite:")
        .unwrap_or(trimmed.as_str())
        .to_string();
    let path = Path::new(&path_str);
    let absolute = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(path)
    };
    format!("sqlite://{}", absolute.display())
}

/// Create the database file and its parent directories if missing.
///
/// # Errors
///
/// Fails for a non-file URL or if the filesystem refuses the create.
pub fn prepare_sqlite_file(db_url: &str) -> Result<()> {
    if db_url == "sqlite::memory:" {
        return Ok(());
    }

    let Some(path) = db_url.strip_prefix("sqlite://") else {
        bail!("unsupported database url: {db_url}");
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() {
        bail!("database url has no path: {db_url}");
    }

    let path = Path::new(path);
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }

    if !path.exists() {
        std::fs::OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(path)
            .with_context(|| format!("failed to create {}", path.display()))?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_file_values() {
        let file = FileConfig {
            database_url: Some("sqlite:///tmp/from-file.db".into()),
            corpus_dir: Some(PathBuf::from("file-corpus")),
            ..FileConfig::default()
        };
        let cfg = AppConfig::resolve(file, Some("sqlite:///tmp/flag.db".into()), None).unwrap();
        assert_eq!(cfg.database_url, "sqlite:///tmp/flag.db");
        assert_eq!(cfg.corpus_dir, PathBuf::from("file-corpus"));
        assert_eq!(cfg.policy, QuizPolicy::default());
        assert_eq!(cfg.sqlite, SqliteSettings::default());
    }

    #[test]
    fn database_table_tunes_the_pool() {
        let file: FileConfig = toml::from_str(
            r#"
            [database]
            max_connections = 1
            busy_timeout_ms = 250
            "#,
        )
        .unwrap();
        let cfg = AppConfig::resolve(file, None, None).unwrap();
        assert_eq!(cfg.sqlite.max_connections, 1);
        assert_eq!(cfg.sqlite.busy_timeout, Duration::from_millis(250));
        assert_eq!(cfg.sqlite.acquire_timeout, SqliteSettings::DEFAULT_ACQUIRE_TIMEOUT);

        let empty_pool: FileConfig = toml::from_str("[database]\nmax_connections = 0\n").unwrap();
        assert!(AppConfig::resolve(empty_pool, None, None).is_err());
    }

    #[test]
    fn policy_table_is_parsed_and_validated() {
        let file: FileConfig = toml::from_str(
            r#"
            database_url = "sqlite::memory:"

            [policy]
            points_per_correct = 5
            "#,
        )
        .unwrap();
        let cfg = AppConfig::resolve(file, None, None).unwrap();
        assert_eq!(cfg.policy.points_per_correct(), 5);
        assert_eq!(cfg.policy.max_options(), QuizPolicy::DEFAULT_MAX_OPTIONS);

        let bad: FileConfig = toml::from_str("[policy]\nmax_options = 1\n").unwrap();
        assert!(AppConfig::resolve(bad, None, None).is_err());
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<FileConfig>("databse_url = \"x\"").is_err());
    }

    #[test]
    fn relative_sqlite_urls_become_absolute() {
        let url = normalize_sqlite_url("sqlite:data/quiz.db".into());
        assert!(url.starts_with("sqlite:///"));
        assert!(url.ends_with("data/quiz.db"));
        assert_eq!(normalize_sqlite_url("sqlite::memory:".into()), "sqlite::memory:");
    }

    #[test]
    fn prepare_creates_missing_file_and_parents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested/quiz.db");
        let url = format!("sqlite://{}", path.display());

        prepare_sqlite_file(&url).unwrap();
        assert!(path.exists());
        assert!(prepare_sqlite_file("postgres://nope").is_err());
    }

    #[test]
    fn load_reports_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(err.to_string().contains("failed to read config"));
    }
}

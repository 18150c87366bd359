//! File-based schema migrations.
//!
//! Migrations live in a directory as `<version>_<description>.sql` (or the
//! reversible `.up.sql` / `.down.sql` pair). Applied versions are recorded
//! in the `_sqlx_migrations` ledger; each migration runs in its own
//! transaction under an advisory lock, so running the set twice is a no-op.

use super::Db;
use crate::error::{Error, Result};
use crate::telemetry::metrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::migrate::{Migrate, Migration, Migrator};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::info;

/// Outcome of [`run_migrations`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MigrationReport {
    /// Versions applied by this run, in the order they ran.
    pub applied: Vec<i64>,
    /// Up migrations found in the directory.
    pub total: usize,
}

impl MigrationReport {
    pub fn is_noop(&self) -> bool {
        self.applied.is_empty()
    }
}

/// One migration from the directory and when it was applied, if ever.
#[derive(Debug, Clone, Serialize)]
pub struct MigrationStatus {
    pub version: i64,
    pub description: String,
    pub applied_at: Option<DateTime<Utc>>,
}

/// Turn a configured migrations path into an absolute one.
///
/// The directory does not need to exist yet. An empty path means the
/// working directory; only an unreadable working directory is an error.
pub fn resolve_migrations_path(path: &Path) -> Result<PathBuf> {
    let resolved = if path.as_os_str().is_empty() {
        std::env::current_dir()
    } else {
        std::path::absolute(path)
    };
    resolved.map_err(|source| Error::PathResolution {
        path: path.to_path_buf(),
        source,
    })
}

/// Versions present in `after` but not in `before`, ascending.
pub fn newly_applied(before: &[i64], after: &[i64]) -> Vec<i64> {
    let mut applied: Vec<i64> = after
        .iter()
        .copied()
        .filter(|v| !before.contains(v))
        .collect();
    applied.sort_unstable();
    applied
}

/// Up migrations from `migrator` whose version is not in `applied`,
/// in ascending version order.
pub fn pending<'m>(migrator: &'m Migrator, applied: &[i64]) -> Vec<&'m Migration> {
    let mut pending: Vec<&Migration> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .filter(|m| !applied.contains(&m.version))
        .collect();
    pending.sort_by_key(|m| m.version);
    pending
}

/// Load the migration set from `dir`.
pub async fn load(dir: &Path) -> Result<Migrator> {
    Ok(Migrator::new(dir).await?)
}

/// Apply every pending migration under `dir` to `db`.
pub async fn run_migrations(db: &Db, dir: &Path) -> Result<MigrationReport> {
    let migrator = load(dir).await?;
    let before: Vec<i64> = db.applied_migrations().await?.into_keys().collect();

    info!(
        dir = %dir.display(),
        pending = pending(&migrator, &before).len(),
        "running migrations"
    );
    migrator.run(db.pool()).await?;

    // Another process may have applied some of them while we waited on the lock.
    let after: Vec<i64> = db.applied_migrations().await?.into_keys().collect();
    let applied = newly_applied(&before, &after);

    for version in &applied {
        info!(version, "migration applied");
    }
    metrics::migrations_applied().add(applied.len() as u64, &[]);

    Ok(MigrationReport {
        applied,
        total: migrator
            .iter()
            .filter(|m| !m.migration_type.is_down_migration())
            .count(),
    })
}

/// List the migrations under `dir` with their applied timestamps.
pub async fn migration_status(db: &Db, dir: &Path) -> Result<Vec<MigrationStatus>> {
    let migrator = load(dir).await?;
    let applied = db.applied_migrations().await?;

    let mut status: Vec<MigrationStatus> = migrator
        .iter()
        .filter(|m| !m.migration_type.is_down_migration())
        .map(|m| MigrationStatus {
            version: m.version,
            description: m.description.to_string(),
            applied_at: applied.get(&m.version).copied(),
        })
        .collect();
    status.sort_by_key(|s| s.version);
    Ok(status)
}

impl Db {
    /// Successfully applied versions and their install time.
    ///
    /// Creates the ledger table on first use.
    pub async fn applied_migrations(&self) -> Result<HashMap<i64, DateTime<Utc>>> {
        let mut conn = self.pool().acquire().await?;
        conn.ensure_migrations_table().await?;

        let rows: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT version, installed_on FROM _sqlx_migrations WHERE success ORDER BY version",
        )
        .fetch_all(&mut *conn)
        .await?;
        Ok(rows.into_iter().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, sql: &str) {
        fs::write(dir.join(name), sql).unwrap();
    }

    #[test]
    fn relative_path_becomes_absolute() {
        let resolved = resolve_migrations_path(Path::new("./internal/api/migrations")).unwrap();
        assert!(resolved.is_absolute());
        assert!(resolved.ends_with("internal/api/migrations"));
    }

    #[test]
    fn absolute_path_is_kept() {
        let dir = tempfile::tempdir().unwrap();
        let resolved = resolve_migrations_path(dir.path()).unwrap();
        assert_eq!(resolved, dir.path());
    }

    #[test]
    fn empty_path_resolves_to_working_directory() {
        let resolved = resolve_migrations_path(Path::new("")).unwrap();
        assert_eq!(resolved, std::env::current_dir().unwrap());
    }

    #[test]
    fn newly_applied_ignores_versions_already_in_the_ledger() {
        assert_eq!(newly_applied(&[1], &[3, 1, 2]), vec![2, 3]);
        assert!(newly_applied(&[1, 2], &[2, 1]).is_empty());
    }

    #[test]
    fn newly_applied_is_empty_when_another_run_won_the_lock() {
        // The ledger already held everything by the time this run got in.
        let before = [1, 2];
        let after = [1, 2];
        assert!(newly_applied(&before, &after).is_empty());
    }

    #[tokio::test]
    async fn pending_skips_applied_and_down_migrations() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "3_add_index.up.sql", "SELECT 1;");
        write(dir.path(), "3_add_index.down.sql", "SELECT 1;");
        write(dir.path(), "1_create_users.up.sql", "SELECT 1;");
        write(dir.path(), "1_create_users.down.sql", "SELECT 1;");
        write(dir.path(), "2_create_jobs.up.sql", "SELECT 1;");
        write(dir.path(), "2_create_jobs.down.sql", "SELECT 1;");

        let migrator = load(dir.path()).await.unwrap();

        let all: Vec<i64> = pending(&migrator, &[]).iter().map(|m| m.version).collect();
        assert_eq!(all, vec![1, 2, 3]);

        let rest: Vec<i64> = pending(&migrator, &[1, 3]).iter().map(|m| m.version).collect();
        assert_eq!(rest, vec![2]);

        assert!(pending(&migrator, &[1, 2, 3]).is_empty());
    }

    #[tokio::test]
    async fn files_outside_the_naming_convention_are_ignored() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), ".gitkeep", "");
        write(dir.path(), "README.md", "notes");

        let migrator = load(dir.path()).await.unwrap();
        assert!(pending(&migrator, &[]).is_empty());
    }

    #[tokio::test]
    async fn missing_directory_is_a_migration_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = load(&dir.path().join("nope")).await.unwrap_err();
        assert!(matches!(err, Error::Migration(_)));
    }

    #[test]
    fn report_without_applied_versions_is_noop() {
        let report = MigrationReport {
            applied: vec![],
            total: 4,
        };
        assert!(report.is_noop());
    }
}

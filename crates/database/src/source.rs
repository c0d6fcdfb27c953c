use crate::error::MigrationError;
use crate::migration::Migration;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;

/// A pluggable catalog of migrations.
///
/// The resolver and executor never care where migrations come from; any
/// source that can produce the unordered collection (a directory on
/// disk, scripts embedded in the binary, an in-memory list in tests)
/// satisfies this contract. The catalog is re-read on every `load` call:
/// the source is the single point of truth and the derived chain is never
/// cached across invocations.
#[async_trait]
pub trait MigrationSource: Send + Sync {
    /// Produces the full, unordered catalog of known migrations.
    async fn load(&self) -> Result<Vec<Migration>, MigrationError>;
}

/// Loads `*.sql` migration scripts from a directory on disk.
///
/// Each script carries its chain metadata in leading comment lines:
///
/// ```sql
/// -- revision: 002_add_sessions
/// -- depends_on: 001_create_accounts
///
/// CREATE TABLE sessions ( ... );
/// ```
///
/// A script without a `depends_on` header is the head of the chain. Files
/// with other extensions are ignored, so a catalog directory can hold
/// notes or fixtures alongside the scripts.
pub struct ScriptDirectory {
    location: PathBuf,
}

impl ScriptDirectory {
    pub fn new(location: impl Into<PathBuf>) -> Self {
        Self {
            location: location.into(),
        }
    }
}

#[async_trait]
impl MigrationSource for ScriptDirectory {
    async fn load(&self) -> Result<Vec<Migration>, MigrationError> {
        let catalog_error = |source| MigrationError::Catalog {
            path: self.location.clone(),
            source,
        };

        let mut entries = fs::read_dir(&self.location).await.map_err(catalog_error)?;
        let mut migrations = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(catalog_error)? {
            let path = entry.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some("sql") {
                continue;
            }
            let script = fs::read_to_string(&path)
                .await
                .map_err(|source| MigrationError::Catalog {
                    path: path.clone(),
                    source,
                })?;
            migrations.push(parse_script(&path, &script)?);
        }
        Ok(migrations)
    }
}

/// A fixed, in-process catalog.
///
/// Useful for migrations compiled into the binary and for tests that
/// drive the executor without touching the filesystem.
pub struct StaticCatalog {
    migrations: Vec<Migration>,
}

impl StaticCatalog {
    pub fn new(migrations: Vec<Migration>) -> Self {
        Self { migrations }
    }
}

#[async_trait]
impl MigrationSource for StaticCatalog {
    async fn load(&self) -> Result<Vec<Migration>, MigrationError> {
        Ok(self.migrations.clone())
    }
}

/// Extracts the `revision` and `depends_on` headers from a script's
/// leading comment lines and wraps the whole script as a SQL migration.
fn parse_script(path: &Path, script: &str) -> Result<Migration, MigrationError> {
    let invalid = |reason: &str| MigrationError::InvalidScript {
        path: path.to_path_buf(),
        reason: reason.to_string(),
    };

    let mut revision = None;
    let mut depends_on = None;
    for line in script.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        // Metadata lives in the comment block before the first statement.
        let Some(comment) = line.strip_prefix("--") else {
            break;
        };
        let comment = comment.trim();
        if let Some(value) = comment.strip_prefix("revision:") {
            revision = Some(value.trim().to_string());
        } else if let Some(value) = comment.strip_prefix("depends_on:") {
            depends_on = Some(value.trim().to_string());
        }
    }

    let revision = revision.ok_or_else(|| invalid("missing `-- revision:` header"))?;
    if revision.is_empty() {
        return Err(invalid("empty revision identifier"));
    }
    if depends_on.as_deref() == Some("") {
        return Err(invalid("empty `-- depends_on:` value"));
    }

    Ok(Migration::from_sql(revision, depends_on, script))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_script(dir: &TempDir, name: &str, contents: &str) {
        fs::write(dir.path().join(name), contents).unwrap();
    }

    #[tokio::test]
    async fn loads_scripts_with_headers() {
        let dir = TempDir::new().unwrap();
        write_script(
            &dir,
            "accounts.sql",
            "-- revision: 001\n\nCREATE TABLE accounts (id BIGINT);\n",
        );
        write_script(
            &dir,
            "sessions.sql",
            "-- revision: 002\n-- depends_on: 001\n\nCREATE TABLE sessions (id BIGINT);\n",
        );

        let mut catalog = ScriptDirectory::new(dir.path()).load().await.unwrap();
        catalog.sort_by(|a, b| a.revision.cmp(&b.revision));

        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog[0].revision, "001");
        assert_eq!(catalog[0].depends_on, None);
        assert_eq!(catalog[1].revision, "002");
        assert_eq!(catalog[1].depends_on.as_deref(), Some("001"));
    }

    #[tokio::test]
    async fn ignores_files_that_are_not_sql() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "README.md", "not a migration");
        write_script(&dir, "init.sql", "-- revision: 001\nSELECT 1;\n");

        let catalog = ScriptDirectory::new(dir.path()).load().await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].revision, "001");
    }

    #[tokio::test]
    async fn rejects_script_without_revision_header() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "bad.sql", "CREATE TABLE t (id BIGINT);\n");

        let err = ScriptDirectory::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, MigrationError::InvalidScript { .. }));
    }

    #[tokio::test]
    async fn rejects_empty_revision_identifier() {
        let dir = TempDir::new().unwrap();
        write_script(&dir, "bad.sql", "-- revision:\nSELECT 1;\n");

        let err = ScriptDirectory::new(dir.path()).load().await.unwrap_err();
        assert!(matches!(err, MigrationError::InvalidScript { .. }));
    }

    #[tokio::test]
    async fn header_block_ends_at_first_statement() {
        let dir = TempDir::new().unwrap();
        // A depends_on-looking comment after the first statement is just a
        // comment, not metadata.
        write_script(
            &dir,
            "init.sql",
            "-- revision: 001\nSELECT 1;\n-- depends_on: 999\n",
        );

        let catalog = ScriptDirectory::new(dir.path()).load().await.unwrap();
        assert_eq!(catalog[0].depends_on, None);
    }

    #[tokio::test]
    async fn missing_directory_is_a_catalog_error() {
        let err = ScriptDirectory::new("/nonexistent/migrations")
            .load()
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::Catalog { .. }));
    }
}

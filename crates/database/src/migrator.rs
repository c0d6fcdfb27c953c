//! The migration executor: advances a database along the resolved chain.
//!
//! One invocation is a single logical flow: resolve the chain, find the
//! database's position in it, compute the slice that still has to run,
//! then apply that slice inside one transaction and record the new
//! position. Migrations run strictly one after another, since later
//! migrations may depend on the side effects of earlier ones.

use crate::chain;
use crate::error::MigrationError;
use crate::migration::Migration;
use crate::source::{MigrationSource, ScriptDirectory};
use configuration::settings::MigrationSettings;
use sqlx::{Connection, PgConnection};
use std::collections::VecDeque;

/// Runs the upgrade chain produced by a [`MigrationSource`] against a live
/// database connection.
pub struct Migrator<S> {
    source: S,
}

impl<S: MigrationSource> Migrator<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Advances the database to `target`, or to the head of the chain when
    /// `target` is `None`.
    ///
    /// The caller owns `conn` exclusively for the duration of the call; no
    /// other statements may be interleaved on it. All schema mutations and
    /// the revision bookkeeping happen inside a single transaction, so a
    /// failing upgrade action (or a cancelled call) leaves the database
    /// exactly where it was.
    ///
    /// Repeated calls with the same target are idempotent: once the
    /// database sits at the target revision, nothing is executed and the
    /// persisted state is not touched.
    pub async fn migrate(
        &self,
        conn: &mut PgConnection,
        target: Option<&str>,
    ) -> Result<(), MigrationError> {
        let catalog = self.source.load().await?;
        let chain = chain::resolve(catalog)?;

        sqlx::query("CREATE TABLE IF NOT EXISTS revision (id TEXT PRIMARY KEY)")
            .execute(&mut *conn)
            .await?;
        let current: Option<String> = sqlx::query_scalar("SELECT id FROM revision")
            .fetch_optional(&mut *conn)
            .await?;

        tracing::info!(
            "Database is initially at {}, target revision is {}",
            current.as_deref().unwrap_or("<empty>"),
            target.unwrap_or("<head>"),
        );

        let pending = plan(chain, current.as_deref(), target)?;
        let Some(last_revision) = pending.last().map(|m| m.revision.clone()) else {
            tracing::info!("No migrations applied");
            return Ok(());
        };

        // The transaction rolls back on drop, so any error below (and a
        // cancellation mid-flight) leaves no partial state behind.
        let mut tx = conn.begin().await?;
        for migration in &pending {
            tracing::info!("Migrating database to {}...", migration.revision);
            migration.upgrade(&mut tx).await?;
        }

        let statement = if current.is_some() {
            "UPDATE revision SET id = $1"
        } else {
            "INSERT INTO revision VALUES ($1)"
        };
        sqlx::query(statement)
            .bind(&last_revision)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!("Database is migrated to {}", last_revision);
        Ok(())
    }
}

/// Caller-facing entry point: wires the configured script directory to a
/// [`Migrator`] and advances the database behind `conn`.
///
/// Fails with [`MigrationError::MissingScriptLocation`], before any
/// statement reaches the database, when no script location is configured.
pub async fn migrate(
    conn: &mut PgConnection,
    settings: &MigrationSettings,
) -> Result<(), MigrationError> {
    let Some(location) = settings.script_location.as_ref() else {
        return Err(MigrationError::MissingScriptLocation);
    };
    let migrator = Migrator::new(ScriptDirectory::new(location));
    migrator
        .migrate(conn, settings.target_revision.as_deref())
        .await
}

/// Computes the exact slice of the chain that must run, given where the
/// database currently sits and where the caller wants it to end up.
///
/// Everything up to and including `current` is discarded. Discarding the
/// target on the way there means the caller asked for a downgrade;
/// running off the end of the chain means the recorded revision is
/// unknown. The returned slice is truncated after `target` (inclusive),
/// and is empty when the database is already where it should be.
fn plan(
    chain: Vec<Migration>,
    current: Option<&str>,
    target: Option<&str>,
) -> Result<Vec<Migration>, MigrationError> {
    let mut remaining = VecDeque::from(chain);

    if let Some(current) = current {
        loop {
            let Some(discarded) = remaining.pop_front() else {
                return Err(MigrationError::UnknownCurrentRevision(current.to_string()));
            };
            if discarded.revision == current {
                break;
            }
            if target == Some(discarded.revision.as_str()) {
                return Err(MigrationError::CurrentAheadOfTarget {
                    current: current.to_string(),
                    target: discarded.revision,
                });
            }
        }
    }

    if current.is_some() && current == target {
        return Ok(Vec::new());
    }

    let mut pending = Vec::with_capacity(remaining.len());
    for migration in remaining {
        let reached_target = target == Some(migration.revision.as_str());
        pending.push(migration);
        if reached_target {
            break;
        }
    }
    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::migration::Migration;

    fn three_step_chain() -> Vec<Migration> {
        vec![
            Migration::from_sql("001", None, "SELECT 1"),
            Migration::from_sql("002", Some("001".to_string()), "SELECT 1"),
            Migration::from_sql("003", Some("002".to_string()), "SELECT 1"),
        ]
    }

    fn revisions(plan: &[Migration]) -> Vec<&str> {
        plan.iter().map(|m| m.revision.as_str()).collect()
    }

    #[test]
    fn fresh_database_applies_the_whole_chain() {
        let pending = plan(three_step_chain(), None, None).unwrap();
        assert_eq!(revisions(&pending), ["001", "002", "003"]);
    }

    #[test]
    fn resumes_after_the_current_revision() {
        let pending = plan(three_step_chain(), Some("001"), None).unwrap();
        assert_eq!(revisions(&pending), ["002", "003"]);
    }

    #[test]
    fn stops_at_the_target_inclusively() {
        let pending = plan(three_step_chain(), None, Some("002")).unwrap();
        assert_eq!(revisions(&pending), ["001", "002"]);
    }

    #[test]
    fn target_combined_with_current_selects_the_middle_slice() {
        let pending = plan(three_step_chain(), Some("001"), Some("002")).unwrap();
        assert_eq!(revisions(&pending), ["002"]);
    }

    #[test]
    fn up_to_date_database_is_a_no_op() {
        let pending = plan(three_step_chain(), Some("003"), None).unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn current_equal_to_target_is_a_no_op() {
        let pending = plan(three_step_chain(), Some("002"), Some("002")).unwrap();
        assert!(pending.is_empty());
    }

    #[test]
    fn unknown_current_revision_is_rejected() {
        let err = plan(three_step_chain(), Some("000"), None).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::UnknownCurrentRevision(rev) if rev == "000"
        ));
    }

    #[test]
    fn downgrade_request_is_rejected() {
        let err = plan(three_step_chain(), Some("003"), Some("002")).unwrap_err();
        assert!(matches!(
            err,
            MigrationError::CurrentAheadOfTarget { current, target }
                if current == "003" && target == "002"
        ));
    }
}

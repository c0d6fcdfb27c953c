use crate::error::MigrationError;
use futures::future::BoxFuture;
use sqlx::PgConnection;
use std::fmt;
use std::sync::Arc;

/// Signature for a code-defined upgrade step. The closure receives the
/// connection with the migration transaction already open on it, so every
/// statement it issues is covered by the surrounding rollback scope.
pub type UpgradeFn = Arc<
    dyn for<'c> Fn(&'c mut PgConnection) -> BoxFuture<'c, Result<(), MigrationError>>
        + Send
        + Sync,
>;

/// How a migration mutates the schema when its turn in the chain comes.
#[derive(Clone)]
pub enum UpgradeAction {
    /// A batch of SQL statements executed as a single script.
    Sql(Arc<str>),
    /// Arbitrary code run against the open transaction.
    Func(UpgradeFn),
}

/// A single step of the schema upgrade chain.
///
/// Migrations are immutable values: a unique `revision` identifier, the
/// revision this one must follow (`None` marks the head of the chain), and
/// the action that performs the upgrade.
#[derive(Clone)]
pub struct Migration {
    pub revision: String,
    pub depends_on: Option<String>,
    pub action: UpgradeAction,
}

impl Migration {
    /// A migration whose upgrade action is a SQL script.
    pub fn from_sql(
        revision: impl Into<String>,
        depends_on: Option<String>,
        sql: impl Into<Arc<str>>,
    ) -> Self {
        Self {
            revision: revision.into(),
            depends_on,
            action: UpgradeAction::Sql(sql.into()),
        }
    }

    /// A migration whose upgrade action is hand-written code.
    pub fn from_fn(
        revision: impl Into<String>,
        depends_on: Option<String>,
        action: UpgradeFn,
    ) -> Self {
        Self {
            revision: revision.into(),
            depends_on,
            action: UpgradeAction::Func(action),
        }
    }

    /// Runs this migration's upgrade action against the given connection.
    pub async fn upgrade(&self, conn: &mut PgConnection) -> Result<(), MigrationError> {
        match &self.action {
            // raw_sql uses the simple query protocol, so multi-statement
            // scripts are allowed.
            UpgradeAction::Sql(sql) => {
                sqlx::raw_sql(sql).execute(&mut *conn).await?;
                Ok(())
            }
            UpgradeAction::Func(action) => action(conn).await,
        }
    }
}

impl fmt::Debug for Migration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Migration")
            .field("revision", &self.revision)
            .field("depends_on", &self.depends_on)
            .finish_non_exhaustive()
    }
}

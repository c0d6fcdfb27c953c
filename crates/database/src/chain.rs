//! Chain resolution: reconstructing the unique upgrade order from an
//! unordered catalog of migrations.
//!
//! Every migration names the revision it depends on (its predecessor), so
//! a valid catalog is a singly linked list scattered across an unordered
//! collection. Resolution builds two lookups in one pass and then chases
//! predecessor pointers iteratively; no recursion, so arbitrarily long
//! chains cannot overflow the stack.

use crate::error::MigrationError;
use crate::migration::Migration;
use std::collections::{HashMap, HashSet};

/// Derives the total order over `migrations` induced by their
/// `depends_on` links.
///
/// Pure and synchronous: no I/O happens here. For a valid catalog the
/// result is the unique total order. Each node has exactly one
/// predecessor and at most one successor, so there is only one way to
/// line the migrations up.
pub fn resolve(migrations: Vec<Migration>) -> Result<Vec<Migration>, MigrationError> {
    let mut dependents: HashMap<Option<String>, Migration> =
        HashMap::with_capacity(migrations.len());
    let mut revisions: HashSet<String> = HashSet::with_capacity(migrations.len());

    for migration in migrations {
        let depends_on = migration.depends_on.clone();
        if dependents.contains_key(&depends_on) {
            return Err(MigrationError::MultipleDependents { depends_on });
        }
        if !revisions.insert(migration.revision.clone()) {
            return Err(MigrationError::DuplicateRevision(migration.revision));
        }
        dependents.insert(depends_on, migration);
    }

    let Some(head) = dependents.remove(&None) else {
        return Err(MigrationError::NoHead);
    };

    let mut chain = Vec::with_capacity(revisions.len());
    let mut last_revision = head.revision.clone();
    chain.push(head);

    // Walk the successor links until the catalog drains. A failed lookup
    // while entries remain means a dangling reference, a cycle that never
    // reaches the head, or a disconnected sub-chain.
    while !dependents.is_empty() {
        match dependents.remove(&Some(last_revision.clone())) {
            Some(next) => {
                last_revision = next.revision.clone();
                chain.push(next);
            }
            None => {
                return Err(MigrationError::BrokenChain {
                    after: last_revision,
                });
            }
        }
    }

    Ok(chain)
}

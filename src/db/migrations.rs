use super::core::Db;
use sqlx::{
    migrate::{Migrate, MigrateError, Migrator},
    query_scalar, SqlitePool,
};
use std::{borrow::Cow, collections::HashMap, fmt::Display};
use thiserror::Error;
use tracing::{debug, info, warn};

// A baked-in static copy of the schema migrations.
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// A db helper for running and inspecting schema migrations. Only touched at
/// startup or from the `migrate` and `status` run modes.
#[derive(Debug)]
pub struct Migrations<'a> {
    db: &'a Db,
}

#[derive(Error, Default, Debug, PartialEq)]
#[error("bad migration situation: {unapplied} unapplied, {wrong_checksum} busted.")]
pub struct MigrationError {
    wrong_checksum: usize,
    unapplied: usize,
}

impl MigrationError {
    pub fn any(&self) -> bool {
        self.wrong_checksum + self.unapplied > 0
    }
}

/// The current state of an individual schema migration.
#[derive(Debug)]
pub enum Status {
    Applied {
        version: i64,
        description: Cow<'static, str>,
    },
    Busted {
        version: i64,
        description: Cow<'static, str>,
        applied_checksum: Cow<'static, [u8]>,
        intended_checksum: Cow<'static, [u8]>,
    },
    Pending {
        version: i64,
        description: Cow<'static, str>,
    },
    Unrecognized {
        version: i64,
        description: String,
    },
}

/// Checksums are sha384s; the first 8 bytes are plenty to eyeball.
fn short_checksum(sum: &[u8]) -> String {
    sum.iter().take(8).map(|b| format!("{b:02x}")).collect()
}

impl Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Status::Applied {
                version,
                description,
            } => write!(f, "{version} (applied)    {description}"),
            Status::Busted {
                version,
                description,
                applied_checksum,
                intended_checksum,
            } => write!(
                f,
                "{version} (!!BUSTED!!) {description} - have {}, want {}",
                short_checksum(applied_checksum),
                short_checksum(intended_checksum)
            ),
            Status::Pending {
                version,
                description,
            } => write!(f, "{version} (pending)    {description}"),
            Status::Unrecognized {
                version,
                description,
            } => write!(f, "{version} (!!FUTURE!!) {description}"),
        }
    }
}

impl<'a> Migrations<'a> {
    pub fn new(db: &'a Db) -> Self {
        Self { db }
    }

    fn pool(&self) -> &SqlitePool {
        &self.db.pool
    }

    /// Run any pending migrations on the database.
    #[tracing::instrument(skip_all)]
    pub async fn run(&self) -> Result<(), MigrateError> {
        MIGRATOR.run(self.pool()).await?;
        info!("database schema is up to date");
        Ok(())
    }

    /// Check whether the schema is in a usable state without changing it:
    /// every known migration applied, with a matching checksum. Migrations
    /// from some newer build are tolerated, with a warning.
    #[tracing::instrument(skip_all)]
    pub async fn validate(&self) -> anyhow::Result<()> {
        let mut errs = MigrationError::default();
        let statuses = self.info().await?;
        debug!("{} migrations on record", statuses.len());

        for status in &statuses {
            match status {
                Status::Applied { .. } => {}
                Status::Busted { .. } => errs.wrong_checksum += 1,
                Status::Pending { .. } => errs.unapplied += 1,
                Status::Unrecognized { version, .. } => warn!(
                    version,
                    "unrecognized database migration; are you running an old app version?"
                ),
            }
        }

        if errs.any() {
            Err(errs.into())
        } else {
            Ok(())
        }
    }

    /// The status of every migration, known or otherwise, meant for printing
    /// to the terminal.
    #[tracing::instrument(skip_all)]
    pub async fn info(&self) -> anyhow::Result<Vec<Status>> {
        // There's a small chance of CREATE TABLE here, but this only happens
        // outside of normal operation so nobody's contending for the connection.
        let mut conn = self.pool().acquire().await?;
        conn.ensure_migrations_table().await?;
        let mut applied: HashMap<_, _> = conn
            .list_applied_migrations()
            .await?
            .into_iter()
            .map(|m| (m.version, m.checksum))
            .collect();

        let mut statuses: Vec<Status> = MIGRATOR
            .iter()
            .filter(|&m| !m.migration_type.is_down_migration())
            .map(|known| match applied.remove(&known.version) {
                Some(checksum) if checksum == known.checksum => Status::Applied {
                    version: known.version,
                    description: known.description.clone(),
                },
                Some(checksum) => Status::Busted {
                    version: known.version,
                    description: known.description.clone(),
                    applied_checksum: checksum,
                    intended_checksum: known.checksum.clone(),
                },
                None => Status::Pending {
                    version: known.version,
                    description: known.description.clone(),
                },
            })
            .collect();

        // Anything left over came from somewhere else.
        let mut unknowns: Vec<i64> = applied.into_keys().collect();
        unknowns.sort();
        for version in unknowns {
            let description = query_scalar::<_, String>(
                r#"SELECT description FROM _sqlx_migrations WHERE version = ?;"#,
            )
            .bind(version)
            .fetch_one(&mut *conn)
            .await?;
            statuses.push(Status::Unrecognized {
                version,
                description,
            });
        }

        Ok(statuses)
    }
}

//! Migration service - applies embedded schema migrations
//!
//! Each migration is tracked by name in the sys_migrations table so that
//! running migrations is idempotent across process restarts.

use duckdb::Connection;

use crate::domain::result::{Error, Result};
use crate::migrations::MIGRATIONS;

/// Result of running migrations
#[derive(Debug)]
pub struct MigrationResult {
    /// Names of newly applied migrations
    pub applied: Vec<String>,
    /// Count of migrations that were already applied
    pub already_applied: usize,
}

/// Service for managing database migrations
pub struct MigrationService<'a> {
    conn: &'a Connection,
}

impl<'a> MigrationService<'a> {
    pub fn new(conn: &'a Connection) -> Self {
        Self { conn }
    }

    /// Apply all pending migrations in order
    ///
    /// The first migration creates the tracking table itself, so it runs
    /// unconditionally when the table does not exist yet.
    pub fn run_pending(&self) -> Result<MigrationResult> {
        let mut newly_applied = Vec::new();

        if !self.migrations_table_exists()? {
            let (name, sql) = MIGRATIONS[0];
            self.conn.execute_batch(sql)?;
            self.record_migration(name)?;
            newly_applied.push(name.to_string());
        }

        let applied = self.get_applied()?;
        let already_applied = applied.len() - newly_applied.len();

        for (name, sql) in MIGRATIONS.iter() {
            if applied.iter().any(|a| a == name) {
                continue;
            }
            self.conn.execute_batch(sql)?;
            self.record_migration(name)?;
            newly_applied.push(name.to_string());
        }

        Ok(MigrationResult {
            applied: newly_applied,
            already_applied,
        })
    }

    fn migrations_table_exists(&self) -> Result<bool> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = 'sys_migrations'",
            [],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Names of already applied migrations, in application order
    pub fn get_applied(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT migration_name FROM sys_migrations ORDER BY migration_name")?;
        let names = stmt.query_map([], |row| row.get::<_, String>(0))?;

        let mut result = Vec::new();
        for name in names {
            result.push(name.map_err(Error::from)?);
        }
        Ok(result)
    }

    fn record_migration(&self, name: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sys_migrations (migration_name) VALUES (?)",
            [name],
        )?;
        Ok(())
    }
}

use std::sync::{Arc, Mutex, MutexGuard};

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension};

/// Generic access to one database table, configured by table name and
/// primary-key column and sharing a live connection.
///
/// Reads and writes address a single column of a single row. Identifiers are
/// restricted to `[A-Za-z0-9_]` since they are spliced into SQL; values go
/// through bind parameters.
pub struct Table {
    conn: Arc<Mutex<Connection>>,
    name: String,
    primary_key: String,
}

impl Table {
    pub fn new(conn: Arc<Mutex<Connection>>, name: &str, primary_key: &str) -> Result<Self> {
        validate_identifier(name)?;
        validate_identifier(primary_key)?;
        Ok(Self {
            conn,
            name: name.to_owned(),
            primary_key: primary_key.to_owned(),
        })
    }

    /// Reads `column` of the row whose primary key equals `key`.
    pub fn value(&self, key: &str, column: &str) -> Result<Option<String>> {
        validate_identifier(column)?;
        let sql = format!(
            "SELECT \"{}\" FROM \"{}\" WHERE \"{}\" = ?1",
            column, self.name, self.primary_key
        );
        let conn = self.lock()?;
        let row = conn
            .query_row(&sql, [key], |row| row.get::<_, Option<String>>(0))
            .optional()
            .with_context(|| format!("read {}.{column}", self.name))?;
        Ok(row.flatten())
    }

    /// Reads `column` of the first row in primary-key order.
    pub fn first(&self, column: &str) -> Result<Option<String>> {
        validate_identifier(column)?;
        let sql = format!(
            "SELECT \"{}\" FROM \"{}\" ORDER BY \"{}\" LIMIT 1",
            column, self.name, self.primary_key
        );
        let conn = self.lock()?;
        let row = conn
            .query_row(&sql, [], |row| row.get::<_, Option<String>>(0))
            .optional()
            .with_context(|| format!("read first {}.{column}", self.name))?;
        Ok(row.flatten())
    }

    /// Writes `column` of the row whose primary key equals `key`.
    /// Returns whether a row was updated.
    pub fn set_value(&self, key: &str, column: &str, value: &str) -> Result<bool> {
        validate_identifier(column)?;
        let sql = format!(
            "UPDATE \"{}\" SET \"{}\" = ?1 WHERE \"{}\" = ?2",
            self.name, column, self.primary_key
        );
        let conn = self.lock()?;
        let updated = conn
            .execute(&sql, [value, key])
            .with_context(|| format!("update {}.{column}", self.name))?;
        Ok(updated > 0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow::anyhow!("database connection lock poisoned"))
    }
}

fn validate_identifier(ident: &str) -> Result<()> {
    if ident.is_empty()
        || !ident
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
    {
        anyhow::bail!("invalid SQL identifier {ident:?}");
    }
    Ok(())
}

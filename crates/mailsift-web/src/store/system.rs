use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::Table;

/// Name of the appliance's system configuration table.
pub const SYSTEM_CONF_TABLE: &str = "system_conf";

/// Typed view of the single-row `system_conf` table.
///
/// Provisioned appliances keep box-wide settings here; the console reads the
/// location of the flat configuration file from it at startup.
pub struct SystemConf {
    table: Table,
}

impl SystemConf {
    /// Opens the appliance database at `db_path`.
    pub fn open(db_path: &Path) -> Result<Self> {
        let conn = Connection::open(db_path)
            .with_context(|| format!("open appliance database {}", db_path.display()))?;
        Self::over(Arc::new(Mutex::new(conn)))
    }

    /// Wraps an already-open connection.
    pub fn over(conn: Arc<Mutex<Connection>>) -> Result<Self> {
        Ok(Self {
            table: Table::new(conn, SYSTEM_CONF_TABLE, "id")?,
        })
    }

    /// Reads one column of the configuration row.
    pub fn value(&self, column: &str) -> Result<Option<String>> {
        self.table.first(column)
    }

    /// Path of the flat appliance conf file, when provisioned.
    pub fn config_file_path(&self) -> Result<Option<PathBuf>> {
        Ok(self.value("conf_file")?.map(PathBuf::from))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provisioned(conf_file: Option<&str>) -> SystemConf {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE system_conf (id TEXT PRIMARY KEY, conf_file TEXT, hostname TEXT);")
            .unwrap();
        conn.execute(
            "INSERT INTO system_conf VALUES ('1', ?1, 'box1.example.com')",
            [conf_file],
        )
        .unwrap();
        SystemConf::over(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[test]
    fn reads_the_provisioned_conf_file_path() {
        let sysconf = provisioned(Some("/etc/mailsift/appliance.conf"));
        assert_eq!(
            sysconf.config_file_path().unwrap(),
            Some(PathBuf::from("/etc/mailsift/appliance.conf"))
        );
    }

    #[test]
    fn unprovisioned_path_reads_as_none() {
        let sysconf = provisioned(None);
        assert_eq!(sysconf.config_file_path().unwrap(), None);
    }

    #[test]
    fn empty_table_reads_as_none() {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("CREATE TABLE system_conf (id TEXT PRIMARY KEY, conf_file TEXT);")
            .unwrap();
        let sysconf = SystemConf::over(Arc::new(Mutex::new(conn))).unwrap();
        assert_eq!(sysconf.config_file_path().unwrap(), None);
    }
}

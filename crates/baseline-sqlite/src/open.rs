use crate::schema::{DROP_ALL, MIG_0001_INIT};
use anyhow::Result;
use rusqlite::Connection;

pub struct Db {
    pub conn: Connection,
}

impl Db {
    pub fn open_or_create(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        apply_pragmas(&conn)?;
        migrate(&conn)?;
        Ok(Db { conn })
    }

    /// Wipe every table and recreate the schema. Destructive; only reached
    /// through an explicit operator flag, never implicitly.
    pub fn reset(&self) -> Result<()> {
        self.conn.execute_batch(DROP_ALL)?;
        self.conn.execute_batch(MIG_0001_INIT)?;
        Ok(())
    }
}

fn apply_pragmas(conn: &Connection) -> Result<()> {
    conn.pragma_update(None, "journal_mode", &"WAL")?;
    conn.pragma_update(None, "synchronous", &"NORMAL")?;
    conn.pragma_update(None, "foreign_keys", &"ON")?;
    Ok(())
}

fn migrate(conn: &Connection) -> Result<()> {
    // naive: if reports table doesn't exist, apply 0001
    let exists: i64 = conn.query_row(
        "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name='reports'",
        [],
        |r| r.get(0),
    )?;
    if exists == 0 {
        conn.execute_batch(MIG_0001_INIT)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn open_creates_all_tables() {
        let db = Db::open_or_create(":memory:").unwrap();
        for table in [
            "supervised_files",
            "supervised_ports",
            "reports",
            "file_modifications",
            "port_modifications",
        ] {
            assert!(db.table_exists(table).unwrap(), "missing table {table}");
        }
    }

    #[test]
    fn reset_wipes_rows_and_recreates_schema() {
        let db = Db::open_or_create(":memory:").unwrap();
        db.upsert_file_if_absent("/tmp/a", "abc").unwrap();
        assert_eq!(db.list_supervised_files().unwrap().len(), 1);

        db.reset().unwrap();
        assert!(db.table_exists("supervised_files").unwrap());
        assert!(db.list_supervised_files().unwrap().is_empty());
    }
}

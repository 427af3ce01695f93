use crate::{Db, ReportId, ReportResult};
use anyhow::Result;
use hostguard_core::PortState;
use rusqlite::params;

impl Db {
    /// Insert-or-skip: an already-baselined path keeps its original hash.
    /// Returns whether a row was inserted.
    pub fn upsert_file_if_absent(&self, path: &str, hash: &str) -> Result<bool> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO supervised_files(path, hash) VALUES (?,?)",
            params![path, hash],
        )?;
        Ok(n > 0)
    }

    /// Insert-or-skip: an already-baselined port keeps its original state
    /// and listening flag. Returns whether a row was inserted.
    pub fn upsert_port_if_absent(&self, port: u16, state: PortState, is_listening: bool) -> Result<bool> {
        let n = self.conn.execute(
            "INSERT OR IGNORE INTO supervised_ports(port_number, state, is_listening) VALUES (?,?,?)",
            params![port, state.as_str(), is_listening],
        )?;
        Ok(n > 0)
    }

    /// Open a report row with placeholder result/description. Committed
    /// immediately, so an interrupted run stays identifiable by its empty
    /// result.
    pub fn open_report(&self, date: &str) -> Result<ReportId> {
        self.conn.execute(
            "INSERT INTO reports(date, result, description) VALUES (?, '', '')",
            params![date],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn close_report(&self, report_id: ReportId, result: ReportResult, description: &str) -> Result<()> {
        self.conn.execute(
            "UPDATE reports SET result=?, description=? WHERE report_id=?",
            params![result.as_str(), description, report_id],
        )?;
        Ok(())
    }

    pub fn record_file_modification(
        &self,
        report_id: ReportId,
        path: &str,
        date: &str,
        old_hash: &str,
        new_hash: &str,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO file_modifications(report_id, path, file_modification_date, old_hash, new_hash)
             VALUES (?,?,?,?,?)",
            params![report_id, path, date, old_hash, new_hash],
        )?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn record_port_modification(
        &self,
        report_id: ReportId,
        port: u16,
        date: &str,
        old_state: PortState,
        new_state: PortState,
        old_is_listening: bool,
        new_is_listening: bool,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO port_modifications(report_id, port_number, port_modification_date,
                                            old_state, new_state, old_is_listening, new_is_listening)
             VALUES (?,?,?,?,?,?,?)",
            params![
                report_id,
                port,
                date,
                old_state.as_str(),
                new_state.as_str(),
                old_is_listening,
                new_is_listening
            ],
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn db() -> Db {
        Db::open_or_create(":memory:").unwrap()
    }

    #[test]
    fn file_upsert_never_overwrites_baseline() {
        let db = db();
        assert!(db.upsert_file_if_absent("/etc/hosts", "aaa").unwrap());
        assert!(!db.upsert_file_if_absent("/etc/hosts", "bbb").unwrap());

        let files = db.list_supervised_files().unwrap();
        assert_eq!(files.len(), 1);
        assert_eq!(files[0].hash, "aaa");
    }

    #[test]
    fn port_upsert_never_overwrites_baseline() {
        let db = db();
        assert!(db.upsert_port_if_absent(8090, PortState::Closed, false).unwrap());
        assert!(!db.upsert_port_if_absent(8090, PortState::Open, true).unwrap());

        let ports = db.list_supervised_ports().unwrap();
        assert_eq!(ports.len(), 1);
        assert_eq!(ports[0].state, PortState::Closed);
        assert!(!ports[0].is_listening);
    }

    #[test]
    fn port_zero_is_never_stored() {
        let db = db();
        // INSERT OR IGNORE drops the CHECK-violating row instead of erroring.
        assert!(!db.upsert_port_if_absent(0, PortState::Closed, false).unwrap());
        assert!(db.list_supervised_ports().unwrap().is_empty());
    }

    #[test]
    fn report_lifecycle() {
        let db = db();
        db.upsert_file_if_absent("/tmp/a.txt", "abc123").unwrap();
        let id = db.open_report("2026-01-01T00:00:00Z").unwrap();

        let open = db.get_report(id).unwrap();
        assert!(open.result.is_empty());
        assert!(open.description.is_empty());

        db.record_file_modification(id, "/tmp/a.txt", "2026-01-01T00:00:01Z", "abc123", "def456")
            .unwrap();
        db.close_report(id, ReportResult::ChangesDetected, "1 file(s) modified and 0 port(s) modified.")
            .unwrap();

        let closed = db.get_report(id).unwrap();
        assert_eq!(closed.result, "Changes detected");
        let mods = db.list_file_modifications().unwrap();
        assert_eq!(mods.len(), 1);
        assert_eq!(mods[0].report_id, id);
        assert_eq!(mods[0].old_hash, "abc123");
        assert_eq!(mods[0].new_hash, "def456");
    }

    #[test]
    fn report_ids_are_monotonic() {
        let db = db();
        let a = db.open_report("d1").unwrap();
        let b = db.open_report("d2").unwrap();
        assert!(b > a);
    }

    #[test]
    fn modification_requires_existing_report() {
        let db = db();
        db.upsert_file_if_absent("/tmp/a", "h").unwrap();
        let err = db.record_file_modification(999, "/tmp/a", "d", "h", "h2");
        assert!(err.is_err());
    }
}

use crate::{Db, FileModification, PortModification, Report, ReportId, SupervisedFile, SupervisedPort};
use anyhow::Result;
use hostguard_core::PortState;
use rusqlite::Row;

fn port_state_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<PortState> {
    let text: String = row.get(idx)?;
    text.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

impl Db {
    pub fn table_exists(&self, name: &str) -> Result<bool> {
        let cnt: i64 = self.conn.query_row(
            "SELECT COUNT(1) FROM sqlite_master WHERE type='table' AND name=?",
            [name],
            |r| r.get(0),
        )?;
        Ok(cnt > 0)
    }

    /// The full file baseline, ordered by path.
    pub fn list_supervised_files(&self) -> Result<Vec<SupervisedFile>> {
        let mut stmt = self
            .conn
            .prepare("SELECT path, hash FROM supervised_files ORDER BY path")?;
        let rows = stmt.query_map([], |r| {
            Ok(SupervisedFile {
                path: r.get(0)?,
                hash: r.get(1)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// The full port baseline, ordered by port number.
    pub fn list_supervised_ports(&self) -> Result<Vec<SupervisedPort>> {
        let mut stmt = self.conn.prepare(
            "SELECT port_number, state, is_listening FROM supervised_ports ORDER BY port_number",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(SupervisedPort {
                port_number: r.get(0)?,
                state: port_state_at(r, 1)?,
                is_listening: r.get(2)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn get_report(&self, report_id: ReportId) -> Result<Report> {
        let report = self.conn.query_row(
            "SELECT report_id, date, result, description FROM reports WHERE report_id=?",
            [report_id],
            |r| {
                Ok(Report {
                    report_id: r.get(0)?,
                    date: r.get(1)?,
                    result: r.get(2)?,
                    description: r.get(3)?,
                })
            },
        )?;
        Ok(report)
    }

    pub fn list_reports(&self) -> Result<Vec<Report>> {
        let mut stmt = self
            .conn
            .prepare("SELECT report_id, date, result, description FROM reports ORDER BY report_id")?;
        let rows = stmt.query_map([], |r| {
            Ok(Report {
                report_id: r.get(0)?,
                date: r.get(1)?,
                result: r.get(2)?,
                description: r.get(3)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_file_modifications(&self) -> Result<Vec<FileModification>> {
        let mut stmt = self.conn.prepare(
            "SELECT file_modification_id, report_id, path, file_modification_date, old_hash, new_hash
             FROM file_modifications ORDER BY file_modification_id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(FileModification {
                file_modification_id: r.get(0)?,
                report_id: r.get(1)?,
                path: r.get(2)?,
                file_modification_date: r.get(3)?,
                old_hash: r.get(4)?,
                new_hash: r.get(5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_port_modifications(&self) -> Result<Vec<PortModification>> {
        let mut stmt = self.conn.prepare(
            "SELECT port_modification_id, report_id, port_number, port_modification_date,
                    old_state, new_state, old_is_listening, new_is_listening
             FROM port_modifications ORDER BY port_modification_id",
        )?;
        let rows = stmt.query_map([], |r| {
            Ok(PortModification {
                port_modification_id: r.get(0)?,
                report_id: r.get(1)?,
                port_number: r.get(2)?,
                port_modification_date: r.get(3)?,
                old_state: port_state_at(r, 4)?,
                new_state: port_state_at(r, 5)?,
                old_is_listening: r.get(6)?,
                new_is_listening: r.get(7)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }
}

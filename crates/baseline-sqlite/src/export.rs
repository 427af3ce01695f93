//! Read-only flat-file projection of the store: one delimited text file
//! per entity. Entities are an explicit enum with typed column accessors,
//! so the export surface cannot drift from the schema silently.

use std::path::Path;

use anyhow::Result;

use crate::Db;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportEntity {
    SupervisedFiles,
    SupervisedPorts,
    Reports,
    FileModifications,
    PortModifications,
}

impl ExportEntity {
    pub const ALL: [ExportEntity; 5] = [
        ExportEntity::SupervisedFiles,
        ExportEntity::SupervisedPorts,
        ExportEntity::Reports,
        ExportEntity::FileModifications,
        ExportEntity::PortModifications,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ExportEntity::SupervisedFiles => "supervised_files.csv",
            ExportEntity::SupervisedPorts => "supervised_ports.csv",
            ExportEntity::Reports => "reports.csv",
            ExportEntity::FileModifications => "file_modifications.csv",
            ExportEntity::PortModifications => "port_modifications.csv",
        }
    }
}

/// Dump one entity table to `out` with a header row. Returns the number of
/// data rows written.
pub fn export_entity(db: &Db, entity: ExportEntity, out: &Path) -> Result<u64> {
    let mut w = csv::Writer::from_path(out)?;
    let mut rows = 0u64;
    match entity {
        ExportEntity::SupervisedFiles => {
            w.write_record(["path", "hash"])?;
            for f in db.list_supervised_files()? {
                w.write_record([f.path, f.hash])?;
                rows += 1;
            }
        }
        ExportEntity::SupervisedPorts => {
            w.write_record(["port_number", "state", "is_listening"])?;
            for p in db.list_supervised_ports()? {
                w.write_record([
                    p.port_number.to_string(),
                    p.state.as_str().to_string(),
                    (p.is_listening as u8).to_string(),
                ])?;
                rows += 1;
            }
        }
        ExportEntity::Reports => {
            w.write_record(["report_id", "date", "result", "description"])?;
            for r in db.list_reports()? {
                w.write_record([r.report_id.to_string(), r.date, r.result, r.description])?;
                rows += 1;
            }
        }
        ExportEntity::FileModifications => {
            w.write_record([
                "file_modification_id",
                "report_id",
                "path",
                "file_modification_date",
                "old_hash",
                "new_hash",
            ])?;
            for m in db.list_file_modifications()? {
                w.write_record([
                    m.file_modification_id.to_string(),
                    m.report_id.to_string(),
                    m.path,
                    m.file_modification_date,
                    m.old_hash,
                    m.new_hash,
                ])?;
                rows += 1;
            }
        }
        ExportEntity::PortModifications => {
            w.write_record([
                "port_modification_id",
                "report_id",
                "port_number",
                "port_modification_date",
                "old_state",
                "new_state",
                "old_is_listening",
                "new_is_listening",
            ])?;
            for m in db.list_port_modifications()? {
                w.write_record([
                    m.port_modification_id.to_string(),
                    m.report_id.to_string(),
                    m.port_number.to_string(),
                    m.port_modification_date,
                    m.old_state.as_str().to_string(),
                    m.new_state.as_str().to_string(),
                    (m.old_is_listening as u8).to_string(),
                    (m.new_is_listening as u8).to_string(),
                ])?;
                rows += 1;
            }
        }
    }
    w.flush()?;
    Ok(rows)
}

/// Dump every entity table into `dir`, creating it if needed. Returns the
/// per-entity row counts in export order.
pub fn export_all(db: &Db, dir: &Path) -> Result<Vec<(ExportEntity, u64)>> {
    std::fs::create_dir_all(dir)?;
    let mut counts = Vec::with_capacity(ExportEntity::ALL.len());
    for entity in ExportEntity::ALL {
        let rows = export_entity(db, entity, &dir.join(entity.file_name()))?;
        counts.push((entity, rows));
    }
    Ok(counts)
}

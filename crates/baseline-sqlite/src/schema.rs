pub const MIG_0001_INIT: &str = r#"
BEGIN;

CREATE TABLE supervised_files (
  path            TEXT PRIMARY KEY,
  hash            TEXT NOT NULL
);

CREATE TABLE supervised_ports (
  port_number     INTEGER PRIMARY KEY CHECK (port_number BETWEEN 1 AND 65535),
  state           TEXT NOT NULL CHECK (state IN ('Open','Closed')),
  is_listening    INTEGER NOT NULL CHECK (is_listening IN (0,1))
);

CREATE TABLE reports (
  report_id       INTEGER PRIMARY KEY AUTOINCREMENT,
  date            TEXT NOT NULL,
  result          TEXT NOT NULL DEFAULT '',
  description     TEXT NOT NULL DEFAULT ''
);

CREATE TABLE file_modifications (
  file_modification_id   INTEGER PRIMARY KEY AUTOINCREMENT,
  report_id              INTEGER NOT NULL REFERENCES reports(report_id) ON DELETE CASCADE,
  path                   TEXT NOT NULL REFERENCES supervised_files(path),
  file_modification_date TEXT NOT NULL,
  old_hash               TEXT NOT NULL,
  new_hash               TEXT NOT NULL
);

CREATE TABLE port_modifications (
  port_modification_id   INTEGER PRIMARY KEY AUTOINCREMENT,
  report_id              INTEGER NOT NULL REFERENCES reports(report_id) ON DELETE CASCADE,
  port_number            INTEGER NOT NULL REFERENCES supervised_ports(port_number),
  port_modification_date TEXT NOT NULL,
  old_state              TEXT NOT NULL,
  new_state              TEXT NOT NULL,
  old_is_listening       INTEGER NOT NULL,
  new_is_listening       INTEGER NOT NULL
);

CREATE INDEX idx_filemod_report ON file_modifications(report_id);
CREATE INDEX idx_portmod_report ON port_modifications(report_id);

COMMIT;
"#;

pub const DROP_ALL: &str = r#"
BEGIN;

DROP TABLE IF EXISTS port_modifications;
DROP TABLE IF EXISTS file_modifications;
DROP TABLE IF EXISTS reports;
DROP TABLE IF EXISTS supervised_ports;
DROP TABLE IF EXISTS supervised_files;

COMMIT;
"#;

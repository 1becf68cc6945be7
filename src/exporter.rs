use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;
use crate::models::EntryStatus;

/// One approved journal entry shaped for the accounting export.
#[derive(Debug, Clone)]
pub struct ExportEntry {
    pub entry_id: i64,
    pub issue_date: String,
    pub entry_type: String,
    pub amount: i64,
    pub account_code: String,
    pub account_name: String,
    pub tax_category: String,
    pub description: String,
}

/// What the sink did with the batch. Partial acceptance is normal; only
/// accepted entries get marked exported.
#[derive(Debug, Default)]
pub struct ExportReport {
    pub accepted: Vec<i64>,
    pub rejected: Vec<(i64, String)>,
}

impl ExportReport {
    pub fn accepted_count(&self) -> usize {
        self.accepted.len()
    }

    pub fn rejected_count(&self) -> usize {
        self.rejected.len()
    }
}

/// External accounting export destination.
pub trait ExportSink {
    fn export(&self, batch: &[ExportEntry]) -> Result<ExportReport>;
}

/// Writes the batch to a local CSV file in freee-compatible column order.
pub struct CsvSink<'a> {
    pub output: &'a Path,
}

impl ExportSink for CsvSink<'_> {
    fn export(&self, batch: &[ExportEntry]) -> Result<ExportReport> {
        let mut writer = csv::Writer::from_path(self.output)?;
        writer.write_record([
            "発生日",
            "収支区分",
            "金額",
            "勘定科目コード",
            "勘定科目",
            "税区分",
            "摘要",
        ])?;
        let mut report = ExportReport::default();
        for entry in batch {
            writer.write_record([
                entry.issue_date.as_str(),
                entry.entry_type.as_str(),
                &entry.amount.to_string(),
                entry.account_code.as_str(),
                entry.account_name.as_str(),
                entry.tax_category.as_str(),
                entry.description.as_str(),
            ])?;
            report.accepted.push(entry.entry_id);
        }
        writer.flush()?;
        Ok(report)
    }
}

/// freee API connectivity stub: accepts every entry and reports counts.
pub struct FreeeSink;

impl ExportSink for FreeeSink {
    fn export(&self, batch: &[ExportEntry]) -> Result<ExportReport> {
        // TODO: wire up the freee deals API once credentials handling lands.
        Ok(ExportReport {
            accepted: batch.iter().map(|e| e.entry_id).collect(),
            rejected: Vec::new(),
        })
    }
}

pub fn load_approved(conn: &Connection, client_id: i64) -> Result<Vec<ExportEntry>> {
    let mut stmt = conn.prepare(
        "SELECT j.id, j.entry_date, a.category, j.amount, a.code, a.name, t.name, \
                coalesce(j.supplier, '') || CASE WHEN j.notes IS NOT NULL THEN ' - ' || j.notes ELSE '' END \
         FROM journal_entries j \
         JOIN account_items a ON j.account_item_id = a.id \
         JOIN tax_categories t ON j.tax_category_id = t.id \
         WHERE j.client_id = ?1 AND j.status = 'approved' \
         ORDER BY j.entry_date, j.id",
    )?;
    let rows = stmt
        .query_map([client_id], |row| {
            Ok(ExportEntry {
                entry_id: row.get(0)?,
                issue_date: row.get(1)?,
                entry_type: row.get(2)?,
                amount: row.get(3)?,
                account_code: row.get(4)?,
                account_name: row.get(5)?,
                tax_category: row.get(6)?,
                description: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

/// Send a client's approved entries to the sink and mark the accepted ones
/// exported. Rejections stay approved for a retry.
pub fn export_approved(
    conn: &Connection,
    client_id: i64,
    sink: &dyn ExportSink,
) -> Result<ExportReport> {
    let batch = load_approved(conn, client_id)?;
    if batch.is_empty() {
        return Ok(ExportReport::default());
    }
    let report = sink.export(&batch)?;
    let ts = chrono::Utc::now().to_rfc3339();
    for entry_id in &report.accepted {
        conn.execute(
            "UPDATE journal_entries SET status = ?1, exported_at = ?2 WHERE id = ?3",
            rusqlite::params![EntryStatus::Exported.as_str(), ts, entry_id],
        )?;
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};
    use crate::error::KichoError;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn seed_entries(conn: &Connection, statuses: &[&str]) -> i64 {
        conn.execute("INSERT INTO clients (name) VALUES ('test')", []).unwrap();
        let client_id = conn.last_insert_rowid();
        for (i, status) in statuses.iter().enumerate() {
            conn.execute(
                "INSERT INTO journal_entries (client_id, entry_date, supplier, account_item_id, \
                        tax_category_id, amount, status) \
                 VALUES (?1, ?2, 'エネオス', 2, 1, 4800, ?3)",
                rusqlite::params![client_id, format!("2026-07-{:02}", i + 1), status],
            )
            .unwrap();
        }
        client_id
    }

    #[test]
    fn test_only_approved_entries_are_loaded() {
        let (_dir, conn) = test_db();
        let client_id = seed_entries(&conn, &["pending", "approved", "exported"]);
        let batch = load_approved(&conn, client_id).unwrap();
        assert_eq!(batch.len(), 1);
        assert_eq!(batch[0].amount, 4800);
    }

    #[test]
    fn test_export_marks_accepted_entries() {
        let (dir, conn) = test_db();
        let client_id = seed_entries(&conn, &["approved", "approved"]);
        let output = dir.path().join("export.csv");
        let sink = CsvSink { output: &output };
        let report = export_approved(&conn, client_id, &sink).unwrap();
        assert_eq!(report.accepted_count(), 2);
        assert_eq!(report.rejected_count(), 0);
        let exported: i64 = conn
            .query_row("SELECT count(*) FROM journal_entries WHERE status = 'exported'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(exported, 2);
        let content = std::fs::read_to_string(&output).unwrap();
        assert!(content.contains("勘定科目"));
        assert!(content.contains("4800"));
    }

    #[test]
    fn test_partial_acceptance_leaves_rejects_approved() {
        struct PickySink;
        impl ExportSink for PickySink {
            fn export(&self, batch: &[ExportEntry]) -> Result<ExportReport> {
                let mut report = ExportReport::default();
                for (i, entry) in batch.iter().enumerate() {
                    if i == 0 {
                        report.accepted.push(entry.entry_id);
                    } else {
                        report.rejected.push((entry.entry_id, "invalid tax code".to_string()));
                    }
                }
                Ok(report)
            }
        }
        let (_dir, conn) = test_db();
        let client_id = seed_entries(&conn, &["approved", "approved"]);
        let report = export_approved(&conn, client_id, &PickySink).unwrap();
        assert_eq!(report.accepted_count(), 1);
        assert_eq!(report.rejected_count(), 1);
        let approved: i64 = conn
            .query_row("SELECT count(*) FROM journal_entries WHERE status = 'approved'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(approved, 1);
    }

    #[test]
    fn test_empty_batch_skips_sink() {
        struct ExplodingSink;
        impl ExportSink for ExplodingSink {
            fn export(&self, _batch: &[ExportEntry]) -> Result<ExportReport> {
                Err(KichoError::ExternalService("should not be called".to_string()))
            }
        }
        let (_dir, conn) = test_db();
        let client_id = seed_entries(&conn, &["pending"]);
        let report = export_approved(&conn, client_id, &ExplodingSink).unwrap();
        assert_eq!(report.accepted_count(), 0);
    }

    #[test]
    fn test_freee_stub_accepts_everything() {
        let batch = vec![ExportEntry {
            entry_id: 1,
            issue_date: "2026-07-01".to_string(),
            entry_type: "expense".to_string(),
            amount: 4800,
            account_code: "501".to_string(),
            account_name: "燃料費".to_string(),
            tax_category: "課税仕入 10%".to_string(),
            description: "エネオス".to_string(),
        }];
        let report = FreeeSink.export(&batch).unwrap();
        assert_eq!(report.accepted, vec![1]);
    }
}

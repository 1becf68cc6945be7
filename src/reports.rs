use rusqlite::Connection;

use crate::error::Result;

pub struct AccountTotal {
    pub code: String,
    pub name: String,
    pub count: i64,
    pub total: i64,
}

/// Per-client rollup backing the reconcile step: where every entry stands
/// and how the spend distributes across account items.
pub struct ClientSummary {
    pub pending: i64,
    pub approved: i64,
    pub exported: i64,
    pub low_confidence: i64,
    pub excluded_documents: i64,
    pub failed_documents: i64,
    pub totals: Vec<AccountTotal>,
}

fn count_entries(conn: &Connection, client_id: i64, status: &str) -> Result<i64> {
    let count = conn.query_row(
        "SELECT count(*) FROM journal_entries WHERE client_id = ?1 AND status = ?2",
        rusqlite::params![client_id, status],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub fn get_client_summary(conn: &Connection, client_id: i64) -> Result<ClientSummary> {
    let pending = count_entries(conn, client_id, "pending")?;
    let approved = count_entries(conn, client_id, "approved")?;
    let exported = count_entries(conn, client_id, "exported")?;

    let low_confidence: i64 = conn.query_row(
        "SELECT count(*) FROM journal_entries \
         WHERE client_id = ?1 AND status = 'pending' AND confidence < 0.8",
        [client_id],
        |row| row.get(0),
    )?;
    let excluded_documents: i64 = conn.query_row(
        "SELECT count(*) FROM documents WHERE client_id = ?1 AND is_excluded = 1",
        [client_id],
        |row| row.get(0),
    )?;
    let failed_documents: i64 = conn.query_row(
        "SELECT count(*) FROM documents WHERE client_id = ?1 AND ocr_status = 'failed'",
        [client_id],
        |row| row.get(0),
    )?;

    let mut stmt = conn.prepare(
        "SELECT a.code, a.name, count(*), SUM(j.amount) as total \
         FROM journal_entries j JOIN account_items a ON j.account_item_id = a.id \
         WHERE j.client_id = ?1 \
         GROUP BY a.code, a.name ORDER BY total DESC",
    )?;
    let totals = stmt
        .query_map([client_id], |row| {
            Ok(AccountTotal {
                code: row.get(0)?,
                name: row.get(1)?,
                count: row.get(2)?,
                total: row.get(3)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(ClientSummary {
        pending,
        approved,
        exported,
        low_confidence,
        excluded_documents,
        failed_documents,
        totals,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    #[test]
    fn test_summary_counts_and_totals() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO clients (name) VALUES ('test')", []).unwrap();
        let client_id = conn.last_insert_rowid();
        // 2 fuel entries pending (one low confidence), 1 misc approved.
        conn.execute(
            "INSERT INTO journal_entries (client_id, entry_date, account_item_id, tax_category_id, \
                    amount, confidence, status) \
             VALUES (?1, '2026-07-01', 2, 1, 4800, 1.0, 'pending'), \
                    (?1, '2026-07-02', 2, 1, 5200, 0.5, 'pending'), \
                    (?1, '2026-07-03', 10, 5, 300, 1.0, 'approved')",
            [client_id],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO documents (client_id, file_name, ocr_status, is_excluded, exclusion_reason) \
             VALUES (?1, 'x.jpg', 'completed', 1, 'private receipt')",
            [client_id],
        )
        .unwrap();

        let summary = get_client_summary(&conn, client_id).unwrap();
        assert_eq!(summary.pending, 2);
        assert_eq!(summary.approved, 1);
        assert_eq!(summary.exported, 0);
        assert_eq!(summary.low_confidence, 1);
        assert_eq!(summary.excluded_documents, 1);
        assert_eq!(summary.failed_documents, 0);
        assert_eq!(summary.totals.len(), 2);
        assert_eq!(summary.totals[0].code, "501");
        assert_eq!(summary.totals[0].total, 10000);
    }

    #[test]
    fn test_summary_for_empty_client() {
        let (_dir, conn) = test_db();
        conn.execute("INSERT INTO clients (name) VALUES ('test')", []).unwrap();
        let summary = get_client_summary(&conn, 1).unwrap();
        assert_eq!(summary.pending, 0);
        assert!(summary.totals.is_empty());
    }
}

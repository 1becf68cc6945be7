use std::path::Path;

use rusqlite::Connection;
use sha2::{Digest, Sha256};

use crate::classifier::{AiClassifier, FallbackDefaults, MasterIndex, Pipeline};
use crate::error::{KichoError, Result};
use crate::models::{Client, EntryStatus, OcrStatus, RuleType};
use crate::ocr::{mime_for_path, ExtractedFields, OcrExtractor};
use crate::resolver;

/// Per-file failure detail, naming the stage that broke.
#[derive(Debug)]
pub struct FileError {
    pub file_name: String,
    pub message: String,
}

/// Aggregate result of a batch upload. A batch never aborts on one file.
#[derive(Debug, Default)]
pub struct BatchOutcome {
    pub succeeded: usize,
    pub failed: usize,
    pub skipped_duplicates: usize,
    pub errors: Vec<FileError>,
    pub document_ids: Vec<i64>,
    pub ocr_result_ids: Vec<i64>,
    pub journal_entry_ids: Vec<i64>,
}

fn checksum(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

fn is_duplicate_upload(conn: &Connection, client_id: i64, sum: &str) -> Result<bool> {
    let mut stmt =
        conn.prepare_cached("SELECT 1 FROM documents WHERE client_id = ?1 AND checksum = ?2")?;
    Ok(stmt.exists(rusqlite::params![client_id, sum])?)
}

pub fn load_client(conn: &Connection, name: &str) -> Result<Client> {
    conn.query_row(
        "SELECT id, name, industry_id, annual_sales, tax_treatment, invoice_registered, \
                use_custom_rules, is_active \
         FROM clients WHERE name = ?1 AND is_active = 1",
        [name],
        |row| {
            Ok(Client {
                id: row.get(0)?,
                name: row.get(1)?,
                industry_id: row.get(2)?,
                annual_sales: row.get(3)?,
                tax_treatment: row.get(4)?,
                invoice_registered: row.get(5)?,
                use_custom_rules: row.get(6)?,
                is_active: row.get(7)?,
            })
        },
    )
    .map_err(|_| KichoError::UnknownClient(name.to_string()))
}

fn industry_name(conn: &Connection, industry_id: Option<i64>) -> Option<String> {
    let id = industry_id?;
    conn.query_row("SELECT name FROM industries WHERE id = ?1", [id], |row| row.get(0))
        .ok()
}

/// Ingest one batch of receipt files for a client: store the document, run
/// OCR, classify, and create a pending journal entry per file. Each file
/// succeeds or fails on its own; failures are recorded per file with the
/// stage that broke (extraction vs classification vs store write).
pub fn process_batch(
    conn: &Connection,
    client: &Client,
    files: &[std::path::PathBuf],
    ocr: &dyn OcrExtractor,
    ai: &dyn AiClassifier,
    fallback_account_code: &str,
) -> Result<BatchOutcome> {
    // Snapshot rules and master data once per batch; a concurrent rule edit
    // lands on the next invocation.
    let rules = resolver::load_active_rules(conn, RuleType::Expense)?;
    let index = MasterIndex::load(conn)?;
    let defaults = FallbackDefaults::load(conn, fallback_account_code)?;
    let pipeline = Pipeline {
        rules: &rules,
        ai,
        index: &index,
        defaults,
        industry_hint: industry_name(conn, client.industry_id),
    };
    let ctx = client.context();
    let today = chrono::Local::now().format("%Y-%m-%d").to_string();

    let mut outcome = BatchOutcome::default();
    for file in files {
        match process_one(conn, client, file, ocr, &pipeline, &ctx, &today, &mut outcome) {
            Ok(true) => outcome.succeeded += 1,
            Ok(false) => outcome.skipped_duplicates += 1,
            Err(e) => {
                outcome.failed += 1;
                outcome.errors.push(FileError {
                    file_name: file.display().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }
    Ok(outcome)
}

#[allow(clippy::too_many_arguments)]
fn process_one(
    conn: &Connection,
    client: &Client,
    file: &Path,
    ocr: &dyn OcrExtractor,
    pipeline: &Pipeline<'_>,
    ctx: &crate::models::ClientContext,
    today: &str,
    outcome: &mut BatchOutcome,
) -> Result<bool> {
    let data = std::fs::read(file)?;
    let sum = checksum(&data);
    if is_duplicate_upload(conn, client.id, &sum)? {
        return Ok(false);
    }

    let file_name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| file.display().to_string());
    conn.execute(
        "INSERT INTO documents (client_id, file_name, file_path, file_size, checksum, ocr_status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            client.id,
            file_name,
            file.display().to_string(),
            data.len() as i64,
            sum,
            OcrStatus::Pending.as_str(),
        ],
    )?;
    let document_id = conn.last_insert_rowid();
    outcome.document_ids.push(document_id);
    mark_document(conn, document_id, OcrStatus::Processing)?;

    let fields = match ocr.extract(&data, mime_for_path(file)) {
        Ok(fields) => fields,
        Err(e) => {
            mark_document(conn, document_id, OcrStatus::Failed)?;
            return Err(KichoError::ExternalService(format!("extraction: {e}")));
        }
    };
    let ocr_result_id = store_ocr_result(conn, document_id, &fields)?;
    outcome.ocr_result_ids.push(ocr_result_id);

    let fact = match fields.to_fact(today) {
        Ok(fact) => fact,
        Err(e) => {
            mark_document(conn, document_id, OcrStatus::Failed)?;
            return Err(KichoError::ExternalService(format!("extraction: {e}")));
        }
    };
    mark_document(conn, document_id, OcrStatus::Completed)?;

    // Classification never fails; worst case is a low-confidence fallback.
    let classification = pipeline.classify(RuleType::Expense, &fact, ctx);

    conn.execute(
        "INSERT INTO journal_entries (document_id, client_id, entry_date, category, supplier, \
                account_item_id, tax_category_id, amount, tax_amount, notes, confidence, \
                provenance, matched_rule_id, status) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        rusqlite::params![
            document_id,
            client.id,
            fact.date,
            classification.category.as_str(),
            fact.supplier,
            classification.account_item_id,
            classification.tax_category_id,
            fact.amount,
            fact.tax_amount,
            classification.notes,
            classification.confidence,
            classification.provenance.as_str(),
            classification.matched_rule_id,
            EntryStatus::Pending.as_str(),
        ],
    )?;
    outcome.journal_entry_ids.push(conn.last_insert_rowid());
    Ok(true)
}

fn mark_document(conn: &Connection, document_id: i64, status: OcrStatus) -> Result<()> {
    conn.execute(
        "UPDATE documents SET ocr_status = ?1 WHERE id = ?2",
        rusqlite::params![status.as_str(), document_id],
    )?;
    Ok(())
}

fn store_ocr_result(conn: &Connection, document_id: i64, fields: &ExtractedFields) -> Result<i64> {
    let items_json = match &fields.items {
        Some(items) => Some(serde_json::to_string(items)?),
        None => None,
    };
    conn.execute(
        "INSERT INTO ocr_results (document_id, raw_text, extracted_date, extracted_supplier, \
                extracted_amount, extracted_tax_amount, extracted_items, confidence_score) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            document_id,
            fields.raw_text,
            fields.date,
            fields.supplier,
            fields.amount,
            fields.tax_amount,
            items_json,
            fields.confidence,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::KeywordClassifier;
    use crate::db::{get_connection, init_db};
    use crate::ocr::JsonReceiptExtractor;

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn add_client(conn: &Connection, name: &str) -> Client {
        conn.execute(
            "INSERT INTO clients (name, use_custom_rules) VALUES (?1, 1)",
            [name],
        )
        .unwrap();
        load_client(conn, name).unwrap()
    }

    fn write_receipt(dir: &Path, name: &str, json: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, json).unwrap();
        path
    }

    #[test]
    fn test_batch_creates_pending_entries() {
        let (dir, conn) = test_db();
        let client = add_client(&conn, "山田商店");
        let a = write_receipt(
            dir.path(),
            "a.json",
            r#"{"date": "2026-07-01", "supplier": "ENEOS", "amount": 4800, "tax_amount": 436}"#,
        );
        let b = write_receipt(
            dir.path(),
            "b.json",
            r#"{"date": "2026-07-02", "supplier": "ローソン", "amount": 800}"#,
        );
        let outcome = process_batch(
            &conn,
            &client,
            &[a, b],
            &JsonReceiptExtractor,
            &KeywordClassifier,
            "599",
        )
        .unwrap();
        assert_eq!(outcome.succeeded, 2);
        assert_eq!(outcome.failed, 0);
        assert_eq!(outcome.journal_entry_ids.len(), 2);
        let pending: i64 = conn
            .query_row("SELECT count(*) FROM journal_entries WHERE status = 'pending'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(pending, 2);
    }

    #[test]
    fn test_one_bad_file_does_not_abort_batch() {
        let (dir, conn) = test_db();
        let client = add_client(&conn, "山田商店");
        let good = write_receipt(
            dir.path(),
            "good.json",
            r#"{"date": "2026-07-01", "supplier": "ENEOS", "amount": 4800}"#,
        );
        let bad = write_receipt(dir.path(), "bad.json", "not json at all");
        let outcome = process_batch(
            &conn,
            &client,
            &[bad, good],
            &JsonReceiptExtractor,
            &KeywordClassifier,
            "599",
        )
        .unwrap();
        assert_eq!(outcome.succeeded, 1);
        assert_eq!(outcome.failed, 1);
        assert_eq!(outcome.errors.len(), 1);
        assert!(outcome.errors[0].message.contains("extraction"));
        let failed_docs: i64 = conn
            .query_row("SELECT count(*) FROM documents WHERE ocr_status = 'failed'", [], |r| r.get(0))
            .unwrap();
        assert_eq!(failed_docs, 1);
    }

    #[test]
    fn test_missing_amount_fails_that_file() {
        let (dir, conn) = test_db();
        let client = add_client(&conn, "山田商店");
        let no_amount = write_receipt(dir.path(), "na.json", r#"{"supplier": "ローソン"}"#);
        let outcome = process_batch(
            &conn,
            &client,
            &[no_amount],
            &JsonReceiptExtractor,
            &KeywordClassifier,
            "599",
        )
        .unwrap();
        assert_eq!(outcome.failed, 1);
        assert!(outcome.errors[0].message.contains("amount"));
        // The OCR result itself is still recorded for audit.
        let ocr_rows: i64 = conn.query_row("SELECT count(*) FROM ocr_results", [], |r| r.get(0)).unwrap();
        assert_eq!(ocr_rows, 1);
    }

    #[test]
    fn test_duplicate_upload_is_skipped() {
        let (dir, conn) = test_db();
        let client = add_client(&conn, "山田商店");
        let a = write_receipt(
            dir.path(),
            "a.json",
            r#"{"date": "2026-07-01", "supplier": "ENEOS", "amount": 4800}"#,
        );
        let first = process_batch(&conn, &client, &[a.clone()], &JsonReceiptExtractor, &KeywordClassifier, "599").unwrap();
        assert_eq!(first.succeeded, 1);
        let second = process_batch(&conn, &client, &[a], &JsonReceiptExtractor, &KeywordClassifier, "599").unwrap();
        assert_eq!(second.succeeded, 0);
        assert_eq!(second.skipped_duplicates, 1);
        let docs: i64 = conn.query_row("SELECT count(*) FROM documents", [], |r| r.get(0)).unwrap();
        assert_eq!(docs, 1);
    }

    #[test]
    fn test_client_rule_applied_end_to_end() {
        let (dir, conn) = test_db();
        let client = add_client(&conn, "山田商店");
        let fuel: i64 = conn
            .query_row("SELECT id FROM account_items WHERE code = '501'", [], |r| r.get(0))
            .unwrap();
        let taxable: i64 = conn
            .query_row("SELECT id FROM tax_categories WHERE name = '課税仕入 10%'", [], |r| r.get(0))
            .unwrap();
        conn.execute(
            "INSERT INTO rules (priority, rule_type, client_id, supplier_pattern, account_item_id, tax_category_id) \
             VALUES (1, 'expense', ?1, 'エネオス', ?2, ?3)",
            rusqlite::params![client.id, fuel, taxable],
        )
        .unwrap();
        let receipt = write_receipt(
            dir.path(),
            "fuel.json",
            r#"{"date": "2026-07-01", "supplier": "エネオス", "amount": 4800, "tax_amount": 436}"#,
        );
        process_batch(&conn, &client, &[receipt], &JsonReceiptExtractor, &KeywordClassifier, "599").unwrap();
        let (account_item_id, provenance, confidence): (i64, String, f64) = conn
            .query_row(
                "SELECT account_item_id, provenance, confidence FROM journal_entries LIMIT 1",
                [],
                |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
            )
            .unwrap();
        assert_eq!(account_item_id, fuel);
        assert_eq!(provenance, "rule");
        assert_eq!(confidence, 1.0);
    }

    #[test]
    fn test_unknown_client_is_reported() {
        let (_dir, conn) = test_db();
        assert!(matches!(load_client(&conn, "いない"), Err(KichoError::UnknownClient(_))));
    }
}

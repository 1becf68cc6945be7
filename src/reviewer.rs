use rusqlite::Connection;

use crate::error::{KichoError, Result};
use crate::models::{EntryStatus, Provenance};

/// A journal entry awaiting staff review, joined with its master data.
pub struct PendingEntry {
    pub id: i64,
    pub entry_date: String,
    pub supplier: Option<String>,
    pub account_item: String,
    pub tax_category: String,
    pub amount: i64,
    pub confidence: Option<f64>,
    pub provenance: Option<String>,
}

pub fn get_pending_entries(conn: &Connection, client_id: i64) -> Result<Vec<PendingEntry>> {
    let mut stmt = conn.prepare(
        "SELECT j.id, j.entry_date, j.supplier, a.name, t.name, j.amount, j.confidence, j.provenance \
         FROM journal_entries j \
         JOIN account_items a ON j.account_item_id = a.id \
         JOIN tax_categories t ON j.tax_category_id = t.id \
         WHERE j.client_id = ?1 AND j.status = 'pending' \
         ORDER BY j.confidence ASC, j.entry_date",
    )?;
    let rows = stmt
        .query_map([client_id], |row| {
            Ok(PendingEntry {
                id: row.get(0)?,
                entry_date: row.get(1)?,
                supplier: row.get(2)?,
                account_item: row.get(3)?,
                tax_category: row.get(4)?,
                amount: row.get(5)?,
                confidence: row.get(6)?,
                provenance: row.get(7)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn approve_entry(conn: &Connection, entry_id: i64) -> Result<()> {
    let changed = conn.execute(
        "UPDATE journal_entries SET status = ?1 WHERE id = ?2 AND status = 'pending'",
        rusqlite::params![EntryStatus::Approved.as_str(), entry_id],
    )?;
    if changed == 0 {
        return Err(KichoError::NotFound(format!("no pending entry with id {entry_id}")));
    }
    Ok(())
}

/// Staff override of a classification. The entry's provenance becomes
/// `manual` and confidence is dropped; optionally a client rule is created
/// so the next receipt from the same supplier resolves without AI.
pub fn reclassify_entry(
    conn: &Connection,
    entry_id: i64,
    account_item_id: i64,
    tax_category_id: i64,
    category: &str,
    create_rule: bool,
) -> Result<()> {
    let changed = conn.execute(
        "UPDATE journal_entries SET account_item_id = ?1, tax_category_id = ?2, category = ?3, \
                provenance = ?4, confidence = NULL, matched_rule_id = NULL \
         WHERE id = ?5 AND status != 'exported'",
        rusqlite::params![
            account_item_id,
            tax_category_id,
            category,
            Provenance::Manual.as_str(),
            entry_id
        ],
    )?;
    if changed == 0 {
        return Err(KichoError::NotFound(format!("no editable entry with id {entry_id}")));
    }
    if create_rule {
        let (client_id, supplier): (i64, Option<String>) = conn.query_row(
            "SELECT client_id, supplier FROM journal_entries WHERE id = ?1",
            [entry_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        if let Some(pattern) = supplier {
            conn.execute(
                "INSERT INTO rules (priority, rule_type, client_id, supplier_pattern, \
                        account_item_id, tax_category_id) \
                 VALUES (100, 'expense', ?1, ?2, ?3, ?4)",
                rusqlite::params![client_id, pattern, account_item_id, tax_category_id],
            )?;
        }
    }
    Ok(())
}

pub fn reject_entry(conn: &Connection, entry_id: i64) -> Result<()> {
    let changed = conn.execute(
        "DELETE FROM journal_entries WHERE id = ?1 AND status = 'pending'",
        [entry_id],
    )?;
    if changed == 0 {
        return Err(KichoError::NotFound(format!("no pending entry with id {entry_id}")));
    }
    Ok(())
}

/// Exclude a document from bookkeeping (private receipt, unreadable, etc.)
/// and drop any pending entry derived from it.
pub fn exclude_document(conn: &Connection, document_id: i64, reason: &str) -> Result<()> {
    let changed = conn.execute(
        "UPDATE documents SET is_excluded = 1, exclusion_reason = ?1 WHERE id = ?2",
        rusqlite::params![reason, document_id],
    )?;
    if changed == 0 {
        return Err(KichoError::NotFound(format!("no document with id {document_id}")));
    }
    conn.execute(
        "DELETE FROM journal_entries WHERE document_id = ?1 AND status = 'pending'",
        [document_id],
    )?;
    Ok(())
}

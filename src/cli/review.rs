use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{KichoError, Result};
use crate::fmt::yen;
use crate::models::EntryCategory;
use crate::processor::load_client;
use crate::reviewer;
use crate::settings::db_path;

pub fn list(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let client = load_client(&conn, client_name)?;
    let pending = reviewer::get_pending_entries(&conn, client.id)?;

    if pending.is_empty() {
        println!("No pending entries for {client_name}.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["ID", "Date", "Supplier", "Account", "Tax", "Amount", "Confidence", "Source"]);
    for entry in pending {
        table.add_row(vec![
            Cell::new(entry.id),
            Cell::new(entry.entry_date),
            Cell::new(entry.supplier.unwrap_or_default()),
            Cell::new(entry.account_item),
            Cell::new(entry.tax_category),
            Cell::new(yen(entry.amount)),
            Cell::new(entry.confidence.map(|c| format!("{c:.2}")).unwrap_or_default()),
            Cell::new(entry.provenance.unwrap_or_default()),
        ]);
    }
    println!("Pending entries for {client_name}\n{table}");
    Ok(())
}

pub fn approve(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    reviewer::approve_entry(&conn, id)?;
    println!("Approved entry {id}");
    Ok(())
}

pub fn edit(id: i64, account: &str, tax: &str, category: &str, make_rule: bool) -> Result<()> {
    let category = EntryCategory::parse(category)?;
    let conn = get_connection(&db_path())?;

    let account_item_id: i64 = conn
        .query_row("SELECT id FROM account_items WHERE code = ?1", [account], |row| row.get(0))
        .map_err(|_| KichoError::UnknownAccountItem(account.to_string()))?;
    let tax_category_id: i64 = conn
        .query_row("SELECT id FROM tax_categories WHERE name = ?1", [tax], |row| row.get(0))
        .map_err(|_| KichoError::UnknownTaxCategory(tax.to_string()))?;

    reviewer::reclassify_entry(&conn, id, account_item_id, tax_category_id, category.as_str(), make_rule)?;
    println!("Reclassified entry {id} \u{2192} {account}");
    if make_rule {
        println!("Created a client rule from this decision");
    }
    Ok(())
}

pub fn reject(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    reviewer::reject_entry(&conn, id)?;
    println!("Rejected entry {id}");
    Ok(())
}

pub fn exclude(id: i64, reason: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    reviewer::exclude_document(&conn, id, reason)?;
    println!("Excluded document {id}: {reason}");
    Ok(())
}

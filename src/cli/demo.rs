use colored::Colorize;
use rusqlite::Connection;

use crate::classifier::KeywordClassifier;
use crate::db::get_connection;
use crate::error::Result;
use crate::ocr::JsonReceiptExtractor;
use crate::processor::{load_client, process_batch};
use crate::settings::{db_path, get_data_dir, load_settings};
use crate::workflow;

const CLIENT_NAME: &str = "山田運送（デモ）";

// (file name, receipt JSON)
const RECEIPTS: &[(&str, &str)] = &[
    (
        "demo-fuel.json",
        r#"{"date": "2026-07-03", "supplier": "ENEOS セルフ川崎", "amount": 4800, "tax_amount": 436}"#,
    ),
    (
        "demo-carwash.json",
        r#"{"date": "2026-07-08", "supplier": "洗車の王国", "amount": 1200, "tax_amount": 109}"#,
    ),
    (
        "demo-phone.json",
        r#"{"date": "2026-07-10", "supplier": "docomo", "amount": 6800, "tax_amount": 618}"#,
    ),
    (
        "demo-unknown.json",
        r#"{"date": "2026-07-15", "supplier": "株式会社ミヤタ", "amount": 3300}"#,
    ),
];

pub fn run() -> Result<()> {
    let settings = load_settings();
    let conn = get_connection(&db_path())?;

    seed_client(&conn)?;
    let client = load_client(&conn, CLIENT_NAME)?;
    seed_rule(&conn, client.id)?;

    let wf = workflow::start(&conn, client.id, &client.name)?;
    // Demo picks the client and uploads in one go.
    workflow::advance(&conn, wf.id)?;

    let upload_dir = get_data_dir().join("uploads");
    std::fs::create_dir_all(&upload_dir)?;
    let mut paths = Vec::new();
    for (name, json) in RECEIPTS {
        let path = upload_dir.join(name);
        std::fs::write(&path, json)?;
        paths.push(path);
    }

    let outcome = process_batch(
        &conn,
        &client,
        &paths,
        &JsonReceiptExtractor,
        &KeywordClassifier,
        &settings.fallback_account_code,
    )?;
    workflow::update_data(&conn, wf.id, |data| {
        data.document_ids.extend(&outcome.document_ids);
        data.ocr_result_ids.extend(&outcome.ocr_result_ids);
        data.journal_entry_ids.extend(&outcome.journal_entry_ids);
    })?;

    println!("Demo data loaded: client '{CLIENT_NAME}' with {} receipts.", outcome.succeeded);
    println!("{}", "Try:".bold());
    println!("  kicho review list --client '{CLIENT_NAME}'");
    println!("  kicho workflow status --client '{CLIENT_NAME}'");
    println!("  kicho summary --client '{CLIENT_NAME}'");
    Ok(())
}

fn seed_client(conn: &Connection) -> Result<()> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM clients WHERE name = ?1")?
        .exists([CLIENT_NAME])?;
    if !exists {
        let industry_id: i64 =
            conn.query_row("SELECT id FROM industries WHERE code = 'driver'", [], |r| r.get(0))?;
        conn.execute(
            "INSERT INTO clients (name, industry_id, use_custom_rules) VALUES (?1, ?2, 1)",
            rusqlite::params![CLIENT_NAME, industry_id],
        )?;
    }
    Ok(())
}

fn seed_rule(conn: &Connection, client_id: i64) -> Result<()> {
    let exists: bool = conn
        .prepare("SELECT 1 FROM rules WHERE client_id = ?1")?
        .exists([client_id])?;
    if !exists {
        let fuel: i64 =
            conn.query_row("SELECT id FROM account_items WHERE code = '501'", [], |r| r.get(0))?;
        let taxable: i64 = conn.query_row(
            "SELECT id FROM tax_categories WHERE name = '課税仕入 10%'",
            [],
            |r| r.get(0),
        )?;
        conn.execute(
            "INSERT INTO rules (priority, rule_type, client_id, supplier_pattern, \
                    account_item_id, tax_category_id) \
             VALUES (1, 'expense', ?1, 'eneos', ?2, ?3)",
            rusqlite::params![client_id, fuel, taxable],
        )?;
    }
    Ok(())
}

use std::path::Path;

use rusqlite::Connection;

use crate::error::Result;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS industries (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL UNIQUE,
    name TEXT NOT NULL,
    description TEXT,
    is_active INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS clients (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    industry_id INTEGER,
    annual_sales INTEGER,
    tax_treatment TEXT NOT NULL DEFAULT '原則課税',
    invoice_registered INTEGER DEFAULT 0,
    use_custom_rules INTEGER DEFAULT 0,
    is_active INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (industry_id) REFERENCES industries(id)
);

CREATE TABLE IF NOT EXISTS account_items (
    id INTEGER PRIMARY KEY,
    code TEXT NOT NULL,
    name TEXT NOT NULL,
    category TEXT NOT NULL,
    is_default INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS tax_categories (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applicable_to_income INTEGER DEFAULT 0,
    applicable_to_expense INTEGER DEFAULT 0,
    is_default INTEGER DEFAULT 0,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS rules (
    id INTEGER PRIMARY KEY,
    priority INTEGER NOT NULL DEFAULT 100,
    rule_type TEXT NOT NULL,
    industry_id INTEGER,
    client_id INTEGER,
    supplier_pattern TEXT,
    amount_min INTEGER,
    amount_max INTEGER,
    account_item_id INTEGER NOT NULL,
    tax_category_id INTEGER NOT NULL,
    is_active INTEGER DEFAULT 1,
    created_at TEXT DEFAULT (datetime('now')),
    CHECK (industry_id IS NULL OR client_id IS NULL),
    FOREIGN KEY (industry_id) REFERENCES industries(id),
    FOREIGN KEY (client_id) REFERENCES clients(id),
    FOREIGN KEY (account_item_id) REFERENCES account_items(id),
    FOREIGN KEY (tax_category_id) REFERENCES tax_categories(id)
);

CREATE TABLE IF NOT EXISTS documents (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL,
    file_name TEXT NOT NULL,
    file_path TEXT,
    file_size INTEGER,
    checksum TEXT,
    ocr_status TEXT NOT NULL DEFAULT 'pending',
    is_excluded INTEGER DEFAULT 0,
    exclusion_reason TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (client_id) REFERENCES clients(id)
);

CREATE TABLE IF NOT EXISTS ocr_results (
    id INTEGER PRIMARY KEY,
    document_id INTEGER NOT NULL,
    raw_text TEXT,
    extracted_date TEXT,
    extracted_supplier TEXT,
    extracted_amount INTEGER,
    extracted_tax_amount INTEGER,
    extracted_items TEXT,
    confidence_score REAL,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (document_id) REFERENCES documents(id)
);

CREATE TABLE IF NOT EXISTS journal_entries (
    id INTEGER PRIMARY KEY,
    document_id INTEGER,
    client_id INTEGER NOT NULL,
    entry_date TEXT NOT NULL,
    category TEXT NOT NULL DEFAULT 'business',
    supplier TEXT,
    account_item_id INTEGER,
    tax_category_id INTEGER,
    amount INTEGER NOT NULL,
    tax_amount INTEGER,
    notes TEXT,
    confidence REAL,
    provenance TEXT,
    matched_rule_id INTEGER,
    status TEXT NOT NULL DEFAULT 'pending',
    exported_at TEXT,
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (document_id) REFERENCES documents(id),
    FOREIGN KEY (client_id) REFERENCES clients(id),
    FOREIGN KEY (account_item_id) REFERENCES account_items(id),
    FOREIGN KEY (tax_category_id) REFERENCES tax_categories(id)
);

CREATE TABLE IF NOT EXISTS workflows (
    id INTEGER PRIMARY KEY,
    client_id INTEGER NOT NULL UNIQUE,
    client_name TEXT NOT NULL,
    current_step INTEGER NOT NULL DEFAULT 1,
    completed_steps TEXT NOT NULL DEFAULT '[]',
    data TEXT NOT NULL DEFAULT '{}',
    last_updated TEXT NOT NULL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (client_id) REFERENCES clients(id)
);
";

// (code, name, description)
const DEFAULT_INDUSTRIES: &[(&str, &str, &str)] = &[
    ("driver", "ドライバー", "Delivery and rideshare drivers"),
    ("streamer", "ライバー", "Live streamers and content creators"),
    ("freelance", "フリーランス", "Independent professionals"),
];

// (code, name, category, is_default)
const DEFAULT_ACCOUNT_ITEMS: &[(&str, &str, &str, bool)] = &[
    ("401", "売上高", "income", false),
    ("501", "燃料費", "expense", false),
    ("502", "車両費", "expense", false),
    ("503", "消耗品費", "expense", false),
    ("504", "通信費", "expense", false),
    ("505", "接待交際費", "expense", false),
    ("506", "地代家賃", "expense", false),
    ("507", "旅費交通費", "expense", false),
    ("508", "外注費", "expense", false),
    // Misc expense: the classification fallback when nothing else fits.
    ("599", "雑費", "expense", true),
];

// (name, applicable_to_income, applicable_to_expense, is_default)
const DEFAULT_TAX_CATEGORIES: &[(&str, bool, bool, bool)] = &[
    ("課税仕入 10%", false, true, true),
    ("課税仕入 8%（軽減）", false, true, false),
    ("課税売上 10%", true, false, false),
    ("非課税", true, true, false),
    ("対象外", true, true, false),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;

    let count: i64 = conn.query_row("SELECT count(*) FROM industries", [], |row| row.get(0))?;
    if count == 0 {
        for ind in DEFAULT_INDUSTRIES {
            conn.execute(
                "INSERT INTO industries (code, name, description) VALUES (?1, ?2, ?3)",
                rusqlite::params![ind.0, ind.1, ind.2],
            )?;
        }
    }

    let count: i64 = conn.query_row("SELECT count(*) FROM account_items", [], |row| row.get(0))?;
    if count == 0 {
        for item in DEFAULT_ACCOUNT_ITEMS {
            conn.execute(
                "INSERT INTO account_items (code, name, category, is_default) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![item.0, item.1, item.2, item.3],
            )?;
        }
    }

    let count: i64 = conn.query_row("SELECT count(*) FROM tax_categories", [], |row| row.get(0))?;
    if count == 0 {
        for tax in DEFAULT_TAX_CATEGORIES {
            conn.execute(
                "INSERT INTO tax_categories (name, applicable_to_income, applicable_to_expense, is_default) \
                 VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![tax.0, tax.1, tax.2, tax.3],
            )?;
        }
    }

    Ok(())
}

use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{KichoError, Result};
use crate::settings::db_path;

pub fn add(name: &str, industry: Option<&str>, tax_treatment: &str, custom_rules: bool) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let industry_id: Option<i64> = match industry {
        Some(code) => Some(
            conn.query_row("SELECT id FROM industries WHERE code = ?1", [code], |row| row.get(0))
                .map_err(|_| KichoError::Other(format!("unknown industry code: {code}")))?,
        ),
        None => None,
    };

    if !["原則課税", "簡易課税", "免税"].contains(&tax_treatment) {
        return Err(KichoError::Other(format!("unknown tax treatment: {tax_treatment}")));
    }

    conn.execute(
        "INSERT INTO clients (name, industry_id, tax_treatment, use_custom_rules) VALUES (?1, ?2, ?3, ?4)",
        rusqlite::params![name, industry_id, tax_treatment, custom_rules],
    )?;
    println!("Added client: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare(
        "SELECT c.id, c.name, coalesce(i.name, ''), c.tax_treatment, c.use_custom_rules \
         FROM clients c LEFT JOIN industries i ON c.industry_id = i.id \
         WHERE c.is_active = 1 ORDER BY c.name",
    )?;
    let rows: Vec<(i64, String, String, String, bool)> = stmt
        .query_map([], |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Industry", "Tax treatment", "Custom rules"]);
    for (id, name, industry, tax_treatment, custom_rules) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(name),
            Cell::new(industry),
            Cell::new(tax_treatment),
            Cell::new(if custom_rules { "yes" } else { "no" }),
        ]);
    }
    println!("Clients\n{table}");
    Ok(())
}

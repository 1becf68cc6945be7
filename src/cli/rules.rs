use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::{KichoError, Result};
use crate::models::RuleType;
use crate::settings::db_path;

#[allow(clippy::too_many_arguments)]
pub fn add(
    account: &str,
    tax: &str,
    rule_type: &str,
    supplier: Option<&str>,
    amount_min: Option<i64>,
    amount_max: Option<i64>,
    client: Option<&str>,
    industry: Option<&str>,
    priority: i64,
) -> Result<()> {
    let rule_type = RuleType::parse(rule_type)?;
    if client.is_some() && industry.is_some() {
        return Err(KichoError::Other(
            "a rule is scoped to a client or an industry, not both".to_string(),
        ));
    }
    if priority < 1 {
        return Err(KichoError::Other("priority must be a positive integer".to_string()));
    }

    let conn = get_connection(&db_path())?;

    let account_item_id: i64 = conn
        .query_row("SELECT id FROM account_items WHERE code = ?1", [account], |row| row.get(0))
        .map_err(|_| KichoError::UnknownAccountItem(account.to_string()))?;
    let tax_category_id: i64 = conn
        .query_row("SELECT id FROM tax_categories WHERE name = ?1", [tax], |row| row.get(0))
        .map_err(|_| KichoError::UnknownTaxCategory(tax.to_string()))?;
    let client_id: Option<i64> = match client {
        Some(name) => Some(
            conn.query_row("SELECT id FROM clients WHERE name = ?1", [name], |row| row.get(0))
                .map_err(|_| KichoError::UnknownClient(name.to_string()))?,
        ),
        None => None,
    };
    let industry_id: Option<i64> = match industry {
        Some(code) => Some(
            conn.query_row("SELECT id FROM industries WHERE code = ?1", [code], |row| row.get(0))
                .map_err(|_| KichoError::Other(format!("unknown industry code: {code}")))?,
        ),
        None => None,
    };

    conn.execute(
        "INSERT INTO rules (priority, rule_type, industry_id, client_id, supplier_pattern, \
                amount_min, amount_max, account_item_id, tax_category_id) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        rusqlite::params![
            priority,
            rule_type.as_str(),
            industry_id,
            client_id,
            supplier,
            amount_min,
            amount_max,
            account_item_id,
            tax_category_id,
        ],
    )?;
    println!("Added rule: '{}' \u{2192} {account}", supplier.unwrap_or("*"));
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let mut stmt = conn.prepare(
        "SELECT r.id, r.priority, r.rule_type, coalesce(c.name, i.name, 'shared'), \
                coalesce(r.supplier_pattern, ''), r.amount_min, r.amount_max, a.code || ' ' || a.name, t.name \
         FROM rules r \
         JOIN account_items a ON r.account_item_id = a.id \
         JOIN tax_categories t ON r.tax_category_id = t.id \
         LEFT JOIN clients c ON r.client_id = c.id \
         LEFT JOIN industries i ON r.industry_id = i.id \
         WHERE r.is_active = 1 \
         ORDER BY CASE WHEN r.client_id IS NOT NULL THEN 0 WHEN r.industry_id IS NOT NULL THEN 1 ELSE 2 END, \
                  r.priority, r.created_at",
    )?;
    let rows: Vec<(i64, i64, String, String, String, Option<i64>, Option<i64>, String, String)> = stmt
        .query_map([], |row| {
            Ok((
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
                row.get(7)?,
                row.get(8)?,
            ))
        })?
        .filter_map(|r| r.ok())
        .collect();

    let mut table = Table::new();
    table.set_header(vec!["ID", "Priority", "Type", "Scope", "Supplier", "Min", "Max", "Account", "Tax"]);
    for (id, priority, rule_type, scope, supplier, min, max, account, tax) in rows {
        table.add_row(vec![
            Cell::new(id),
            Cell::new(priority),
            Cell::new(rule_type),
            Cell::new(scope),
            Cell::new(supplier),
            Cell::new(min.map(|v| v.to_string()).unwrap_or_default()),
            Cell::new(max.map(|v| v.to_string()).unwrap_or_default()),
            Cell::new(account),
            Cell::new(tax),
        ]);
    }
    println!("Rules\n{table}");
    Ok(())
}

pub fn delete(id: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;

    let row: std::result::Result<(Option<String>, i32), _> = conn.query_row(
        "SELECT supplier_pattern, is_active FROM rules WHERE id = ?1",
        [id],
        |row| Ok((row.get(0)?, row.get(1)?)),
    );

    match row {
        Err(_) => Err(KichoError::Other(format!("No rule with ID {id}"))),
        Ok((_, 0)) => Err(KichoError::Other(format!("Rule {id} is already inactive"))),
        Ok((pattern, _)) => {
            conn.execute("UPDATE rules SET is_active = 0 WHERE id = ?1", [id])?;
            println!("Deleted rule {id}: '{}'", pattern.unwrap_or_else(|| "*".to_string()));
            Ok(())
        }
    }
}

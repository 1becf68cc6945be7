use comfy_table::{Cell, Table};

use crate::db::get_connection;
use crate::error::Result;
use crate::fmt::yen;
use crate::processor::load_client;
use crate::reports::get_client_summary;
use crate::settings::db_path;

pub fn run(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let client = load_client(&conn, client_name)?;
    let summary = get_client_summary(&conn, client.id)?;

    println!("Summary for {client_name}");
    println!();
    println!("Pending:          {}", summary.pending);
    println!("Approved:         {}", summary.approved);
    println!("Exported:         {}", summary.exported);
    println!("Low confidence:   {}", summary.low_confidence);
    println!("Excluded docs:    {}", summary.excluded_documents);
    println!("Failed docs:      {}", summary.failed_documents);

    if !summary.totals.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Code", "Account item", "Entries", "Total"]);
        for item in &summary.totals {
            table.add_row(vec![
                Cell::new(&item.code),
                Cell::new(&item.name),
                Cell::new(item.count),
                Cell::new(yen(item.total)),
            ]);
        }
        println!();
        println!("{table}");
    }
    Ok(())
}

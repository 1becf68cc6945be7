use std::path::PathBuf;

use colored::Colorize;

use crate::db::get_connection;
use crate::error::Result;
use crate::exporter::{export_approved, CsvSink, ExportSink, FreeeSink};
use crate::processor::load_client;
use crate::settings::{db_path, get_data_dir};
use crate::workflow;

pub fn run(client_name: &str, output: Option<String>, freee: bool) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let client = load_client(&conn, client_name)?;

    let report = if freee {
        export_approved(&conn, client.id, &FreeeSink)?
    } else {
        let path = match output {
            Some(p) => PathBuf::from(p),
            None => {
                let stamp = chrono::Local::now().format("%Y%m%d");
                let dir = get_data_dir().join("exports");
                std::fs::create_dir_all(&dir)?;
                dir.join(format!("{client_name}-{stamp}.csv"))
            }
        };
        let sink = CsvSink { output: &path };
        let report = export_approved(&conn, client.id, &sink as &dyn ExportSink)?;
        if report.accepted_count() > 0 {
            println!("Wrote {}", path.display());
        }
        report
    };

    if report.accepted_count() == 0 && report.rejected_count() == 0 {
        println!("No approved entries to export for {client_name}.");
        return Ok(());
    }

    println!(
        "{} exported, {} rejected",
        report.accepted_count(),
        report.rejected_count()
    );
    for (entry_id, reason) in &report.rejected {
        println!("  {} entry {}: {}", "rejected".red(), entry_id, reason);
    }

    if report.rejected_count() == 0 {
        if let Some(wf) = workflow::find_by_client(&conn, client.id)? {
            workflow::update_data(&conn, wf.id, |data| data.export_completed = true)?;
        }
    }
    Ok(())
}

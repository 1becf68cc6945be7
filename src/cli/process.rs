use std::path::PathBuf;

use colored::Colorize;

use crate::classifier::KeywordClassifier;
use crate::db::get_connection;
use crate::error::Result;
use crate::ocr::JsonReceiptExtractor;
use crate::processor::{load_client, process_batch};
use crate::settings::{db_path, load_settings};
use crate::workflow;

pub fn run(files: &[String], client_name: &str) -> Result<()> {
    let settings = load_settings();
    let conn = get_connection(&db_path())?;
    let client = load_client(&conn, client_name)?;

    let paths: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
    let outcome = process_batch(
        &conn,
        &client,
        &paths,
        &JsonReceiptExtractor,
        &KeywordClassifier,
        &settings.fallback_account_code,
    )?;

    // Feed the results into the client's workflow, if one is in flight.
    if let Some(wf) = workflow::find_by_client(&conn, client.id)? {
        workflow::update_data(&conn, wf.id, |data| {
            data.document_ids.extend(&outcome.document_ids);
            data.ocr_result_ids.extend(&outcome.ocr_result_ids);
            data.journal_entry_ids.extend(&outcome.journal_entry_ids);
        })?;
    }

    println!(
        "{} processed, {} failed, {} skipped (duplicates)",
        outcome.succeeded, outcome.failed, outcome.skipped_duplicates
    );
    for error in &outcome.errors {
        println!("  {} {}: {}", "failed".red(), error.file_name, error.message);
    }
    if outcome.failed == 0 && outcome.succeeded > 0 {
        println!("{}", "All receipts booked as pending entries. Run `kicho review list` next.".green());
    }
    Ok(())
}

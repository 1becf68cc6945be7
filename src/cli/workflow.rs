use colored::Colorize;
use comfy_table::{Cell, Table};
use rusqlite::Connection;

use crate::db::get_connection;
use crate::error::Result;
use crate::processor::load_client;
use crate::settings::db_path;
use crate::workflow::{self, step_name, WorkflowState, STEP_COUNT};

fn active_workflow(conn: &Connection, client_name: &str) -> Result<Option<(i64, WorkflowState)>> {
    let client = load_client(conn, client_name)?;
    Ok(workflow::find_by_client(conn, client.id)?.map(|wf| (client.id, wf)))
}

fn no_workflow(client_name: &str) {
    println!("No active workflow for {client_name}. Run `kicho workflow start --client '{client_name}'`.");
}

fn print_position(state: &WorkflowState) {
    println!(
        "{} \u{2014} step {}/{}: {}",
        state.client_name,
        state.current_step,
        STEP_COUNT,
        step_name(state.current_step).bold()
    );
    let marks: Vec<String> = (1..=STEP_COUNT)
        .map(|step| {
            if step == state.current_step {
                format!("[{step}]")
            } else if state.is_step_completed(step) {
                format!("{step}\u{2713}")
            } else {
                step.to_string()
            }
        })
        .collect();
    println!("  {}", marks.join(" "));
}

pub fn start(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    let client = load_client(&conn, client_name)?;
    let state = workflow::start(&conn, client.id, &client.name)?;
    print_position(&state);
    Ok(())
}

pub fn status(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, state)) => {
            print_position(&state);
            println!(
                "  {} documents, {} entries, review {}, export {}",
                state.data.document_ids.len(),
                state.data.journal_entry_ids.len(),
                if state.data.review_completed { "done" } else { "open" },
                if state.data.export_completed { "done" } else { "open" },
            );
        }
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn advance(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, wf)) => {
            if let Some(state) = workflow::advance(&conn, wf.id)? {
                print_position(&state);
            }
        }
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn back(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, wf)) => {
            if let Some(state) = workflow::retreat(&conn, wf.id)? {
                print_position(&state);
            }
        }
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn jump(client_name: &str, step: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, wf)) => {
            if let Some(state) = workflow::jump_to(&conn, wf.id, step)? {
                print_position(&state);
            }
        }
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn mark(client_name: &str, step: i64) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, wf)) => {
            if let Some(state) = workflow::mark_complete(&conn, wf.id, step)? {
                print_position(&state);
            }
        }
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn suspend(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, wf)) => {
            workflow::suspend(&conn, wf.id)?;
            println!("Suspended workflow for {client_name}. Resume any time.");
        }
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn resume(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, wf)) => match workflow::resume(&conn, wf.id)? {
            Some(state) => print_position(&state),
            None => no_workflow(client_name),
        },
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn complete(client_name: &str) -> Result<()> {
    let conn = get_connection(&db_path())?;
    match active_workflow(&conn, client_name)? {
        Some((_, wf)) => {
            if workflow::complete(&conn, wf.id)? {
                println!("{}", format!("Workflow for {client_name} completed.").green());
            } else {
                no_workflow(client_name);
            }
        }
        None => no_workflow(client_name),
    }
    Ok(())
}

pub fn list() -> Result<()> {
    let conn = get_connection(&db_path())?;
    let workflows = workflow::all(&conn)?;
    if workflows.is_empty() {
        println!("No workflows in flight.");
        return Ok(());
    }
    let mut table = Table::new();
    table.set_header(vec!["Client", "Step", "Stage", "Completed", "Last updated"]);
    for wf in workflows {
        table.add_row(vec![
            Cell::new(&wf.client_name),
            Cell::new(format!("{}/{}", wf.current_step, STEP_COUNT)),
            Cell::new(step_name(wf.current_step)),
            Cell::new(wf.completed_steps.len()),
            Cell::new(&wf.last_updated),
        ]);
    }
    println!("Workflows\n{table}");
    Ok(())
}

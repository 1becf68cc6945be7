use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::error::{KichoError, Result};

pub const STEP_COUNT: i64 = 8;

/// Human label for a workflow step (1-8).
pub fn step_name(step: i64) -> &'static str {
    match step {
        1 => "Select client",
        2 => "Upload",
        3 => "OCR",
        4 => "Classify & review",
        5 => "Export",
        6 => "Reconcile",
        7 => "Exceptions",
        8 => "Complete",
        _ => "Unknown",
    }
}

/// Per-workflow working data, stored as a JSON column. Unknown fields from
/// older versions are ignored on load.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowData {
    #[serde(default)]
    pub document_ids: Vec<i64>,
    #[serde(default)]
    pub ocr_result_ids: Vec<i64>,
    #[serde(default)]
    pub journal_entry_ids: Vec<i64>,
    #[serde(default)]
    pub review_completed: bool,
    #[serde(default)]
    pub export_completed: bool,
}

/// One client's progress through the 8-step cycle. At most one row per
/// client; a completed workflow has no row at all.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    pub id: i64,
    pub client_id: i64,
    pub client_name: String,
    pub current_step: i64,
    pub completed_steps: Vec<i64>,
    pub data: WorkflowData,
    pub last_updated: String,
    pub created_at: String,
}

impl WorkflowState {
    pub fn is_step_completed(&self, step: i64) -> bool {
        self.completed_steps.contains(&step)
    }
}

fn now() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn row_to_state(row: &rusqlite::Row<'_>) -> rusqlite::Result<(WorkflowState, String, String)> {
    let state = WorkflowState {
        id: row.get(0)?,
        client_id: row.get(1)?,
        client_name: row.get(2)?,
        current_step: row.get(3)?,
        completed_steps: Vec::new(),
        data: WorkflowData::default(),
        last_updated: row.get(6)?,
        created_at: row.get(7)?,
    };
    Ok((state, row.get(4)?, row.get(5)?))
}

fn parse_state(raw: (WorkflowState, String, String)) -> WorkflowState {
    let (mut state, completed_json, data_json) = raw;
    state.completed_steps = serde_json::from_str(&completed_json).unwrap_or_default();
    state.data = serde_json::from_str(&data_json).unwrap_or_default();
    state
}

const SELECT: &str = "SELECT id, client_id, client_name, current_step, completed_steps, data, \
                      last_updated, created_at FROM workflows";

/// Start a workflow for a client at step 1. Any existing workflow for the
/// same client is superseded, not merged: the old row is discarded.
pub fn start(conn: &Connection, client_id: i64, client_name: &str) -> Result<WorkflowState> {
    let replaced = conn.execute("DELETE FROM workflows WHERE client_id = ?1", [client_id])?;
    if replaced > 0 {
        eprintln!("Discarding previous workflow for client {client_name} (restart)");
    }
    let ts = now();
    conn.execute(
        "INSERT INTO workflows (client_id, client_name, current_step, completed_steps, data, \
                last_updated, created_at) \
         VALUES (?1, ?2, 1, '[]', '{}', ?3, ?3)",
        rusqlite::params![client_id, client_name, ts],
    )?;
    let id = conn.last_insert_rowid();
    get(conn, id)?.ok_or_else(|| KichoError::NotFound(format!("workflow {id}")))
}

pub fn get(conn: &Connection, id: i64) -> Result<Option<WorkflowState>> {
    let mut stmt = conn.prepare(&format!("{SELECT} WHERE id = ?1"))?;
    let mut rows = stmt.query_map([id], row_to_state)?;
    match rows.next() {
        Some(raw) => Ok(Some(parse_state(raw?))),
        None => Ok(None),
    }
}

pub fn find_by_client(conn: &Connection, client_id: i64) -> Result<Option<WorkflowState>> {
    let mut stmt = conn.prepare(&format!("{SELECT} WHERE client_id = ?1"))?;
    let mut rows = stmt.query_map([client_id], row_to_state)?;
    match rows.next() {
        Some(raw) => Ok(Some(parse_state(raw?))),
        None => Ok(None),
    }
}

pub fn all(conn: &Connection) -> Result<Vec<WorkflowState>> {
    let mut stmt = conn.prepare(&format!("{SELECT} ORDER BY last_updated DESC"))?;
    let rows = stmt.query_map([], row_to_state)?;
    let mut workflows = Vec::new();
    for raw in rows {
        workflows.push(parse_state(raw?));
    }
    Ok(workflows)
}

/// Load a persisted workflow verbatim; no transition is taken.
pub fn resume(conn: &Connection, id: i64) -> Result<Option<WorkflowState>> {
    get(conn, id)
}

fn save(conn: &Connection, state: &WorkflowState) -> Result<()> {
    conn.execute(
        "UPDATE workflows SET current_step = ?1, completed_steps = ?2, data = ?3, last_updated = ?4 \
         WHERE id = ?5",
        rusqlite::params![
            state.current_step,
            serde_json::to_string(&state.completed_steps)?,
            serde_json::to_string(&state.data)?,
            now(),
            state.id,
        ],
    )?;
    Ok(())
}

fn insert_completed(state: &mut WorkflowState, step: i64) {
    if !state.completed_steps.contains(&step) {
        state.completed_steps.push(step);
        state.completed_steps.sort_unstable();
    }
}

/// Mark the current step completed and move to the next one. Rejected at the
/// final step. `Ok(None)` means no such workflow.
pub fn advance(conn: &Connection, id: i64) -> Result<Option<WorkflowState>> {
    let Some(mut state) = get(conn, id)? else {
        return Ok(None);
    };
    if state.current_step >= STEP_COUNT {
        return Err(KichoError::InvalidTransition(format!(
            "already at final step ({})",
            step_name(STEP_COUNT)
        )));
    }
    let current = state.current_step;
    insert_completed(&mut state, current);
    state.current_step += 1;
    save(conn, &state)?;
    get(conn, id)
}

/// Step back one step. Completed marks are retained: a step once completed
/// stays completed even when revisited.
pub fn retreat(conn: &Connection, id: i64) -> Result<Option<WorkflowState>> {
    let Some(mut state) = get(conn, id)? else {
        return Ok(None);
    };
    if state.current_step <= 1 {
        return Err(KichoError::InvalidTransition("already at the first step".to_string()));
    }
    state.current_step -= 1;
    save(conn, &state)?;
    get(conn, id)
}

/// Jump to an arbitrary step in [1,8]. The engine allows any target; gating
/// jumps to completed steps only is a presentation concern.
pub fn jump_to(conn: &Connection, id: i64, step: i64) -> Result<Option<WorkflowState>> {
    if !(1..=STEP_COUNT).contains(&step) {
        return Err(KichoError::InvalidTransition(format!(
            "step {step} outside 1-{STEP_COUNT}"
        )));
    }
    let Some(mut state) = get(conn, id)? else {
        return Ok(None);
    };
    state.current_step = step;
    save(conn, &state)?;
    get(conn, id)
}

/// Idempotently record a step as completed.
pub fn mark_complete(conn: &Connection, id: i64, step: i64) -> Result<Option<WorkflowState>> {
    if !(1..=STEP_COUNT).contains(&step) {
        return Err(KichoError::InvalidTransition(format!(
            "step {step} outside 1-{STEP_COUNT}"
        )));
    }
    let Some(mut state) = get(conn, id)? else {
        return Ok(None);
    };
    insert_completed(&mut state, step);
    save(conn, &state)?;
    get(conn, id)
}

/// Read-modify-write the workflow's working data.
pub fn update_data<F>(conn: &Connection, id: i64, f: F) -> Result<Option<WorkflowState>>
where
    F: FnOnce(&mut WorkflowData),
{
    let Some(mut state) = get(conn, id)? else {
        return Ok(None);
    };
    f(&mut state.data);
    save(conn, &state)?;
    get(conn, id)
}

/// Persist as-is and hand control back to client selection. The row stays
/// for a later resume.
pub fn suspend(conn: &Connection, id: i64) -> Result<Option<WorkflowState>> {
    let Some(state) = get(conn, id)? else {
        return Ok(None);
    };
    save(conn, &state)?;
    get(conn, id)
}

/// Finish a workflow: the final step is marked complete, then the row is
/// deleted. Completion is represented by absence; resuming a completed
/// workflow reports not-found by design.
pub fn complete(conn: &Connection, id: i64) -> Result<bool> {
    let Some(mut state) = get(conn, id)? else {
        return Ok(false);
    };
    insert_completed(&mut state, STEP_COUNT);
    save(conn, &state)?;
    conn.execute("DELETE FROM workflows WHERE id = ?1", [id])?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{get_connection, init_db};

    fn test_db() -> (tempfile::TempDir, Connection) {
        let dir = tempfile::tempdir().unwrap();
        let conn = get_connection(&dir.path().join("test.db")).unwrap();
        init_db(&conn).unwrap();
        (dir, conn)
    }

    fn add_client(conn: &Connection, name: &str) -> i64 {
        conn.execute("INSERT INTO clients (name) VALUES (?1)", [name]).unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_start_creates_at_step_one() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        assert_eq!(wf.current_step, 1);
        assert!(wf.completed_steps.is_empty());
        assert!(wf.data.document_ids.is_empty());
    }

    #[test]
    fn test_start_supersedes_existing() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let old = start(&conn, client_id, "山田商店").unwrap();
        advance(&conn, old.id).unwrap();
        let new = start(&conn, client_id, "山田商店").unwrap();
        assert_ne!(old.id, new.id);
        assert_eq!(new.current_step, 1);
        // The old instance is gone, not merged.
        assert!(get(&conn, old.id).unwrap().is_none());
        let count: i64 = conn.query_row("SELECT count(*) FROM workflows", [], |r| r.get(0)).unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_seven_advances_reach_final_step() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        for _ in 0..7 {
            advance(&conn, wf.id).unwrap().unwrap();
        }
        let state = get(&conn, wf.id).unwrap().unwrap();
        assert_eq!(state.current_step, 8);
        assert_eq!(state.completed_steps, vec![1, 2, 3, 4, 5, 6, 7]);
        // The eighth advance is rejected.
        assert!(matches!(advance(&conn, wf.id), Err(KichoError::InvalidTransition(_))));
    }

    #[test]
    fn test_retreat_keeps_completed_marks() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        advance(&conn, wf.id).unwrap();
        advance(&conn, wf.id).unwrap();
        let state = retreat(&conn, wf.id).unwrap().unwrap();
        assert_eq!(state.current_step, 2);
        assert_eq!(state.completed_steps, vec![1, 2]);
    }

    #[test]
    fn test_retreat_rejected_at_first_step() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        assert!(matches!(retreat(&conn, wf.id), Err(KichoError::InvalidTransition(_))));
    }

    #[test]
    fn test_jump_roundtrip_preserves_completed_steps() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        mark_complete(&conn, wf.id, 1).unwrap();
        mark_complete(&conn, wf.id, 2).unwrap();
        mark_complete(&conn, wf.id, 2).unwrap(); // idempotent
        jump_to(&conn, wf.id, 3).unwrap();
        jump_to(&conn, wf.id, 1).unwrap();
        let state = jump_to(&conn, wf.id, 3).unwrap().unwrap();
        assert_eq!(state.current_step, 3);
        assert_eq!(state.completed_steps, vec![1, 2]);
    }

    #[test]
    fn test_jump_rejects_out_of_range() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        assert!(matches!(jump_to(&conn, wf.id, 0), Err(KichoError::InvalidTransition(_))));
        assert!(matches!(jump_to(&conn, wf.id, 9), Err(KichoError::InvalidTransition(_))));
    }

    #[test]
    fn test_complete_destroys_instance() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        assert!(complete(&conn, wf.id).unwrap());
        // Absence is the terminal state; resume reports not-found.
        assert!(resume(&conn, wf.id).unwrap().is_none());
        assert!(find_by_client(&conn, client_id).unwrap().is_none());
    }

    #[test]
    fn test_transitions_on_missing_instance_report_not_found() {
        let (_dir, conn) = test_db();
        assert!(advance(&conn, 42).unwrap().is_none());
        assert!(retreat(&conn, 42).unwrap().is_none());
        assert!(jump_to(&conn, 42, 3).unwrap().is_none());
        assert!(mark_complete(&conn, 42, 3).unwrap().is_none());
        assert!(suspend(&conn, 42).unwrap().is_none());
        assert!(!complete(&conn, 42).unwrap());
    }

    #[test]
    fn test_suspend_keeps_state_for_resume() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        advance(&conn, wf.id).unwrap();
        update_data(&conn, wf.id, |data| data.document_ids.push(7)).unwrap();
        suspend(&conn, wf.id).unwrap();
        let state = resume(&conn, wf.id).unwrap().unwrap();
        assert_eq!(state.current_step, 2);
        assert_eq!(state.data.document_ids, vec![7]);
    }

    #[test]
    fn test_update_data_accumulates_ids() {
        let (_dir, conn) = test_db();
        let client_id = add_client(&conn, "山田商店");
        let wf = start(&conn, client_id, "山田商店").unwrap();
        update_data(&conn, wf.id, |data| {
            data.document_ids.extend([1, 2]);
            data.journal_entry_ids.push(10);
        })
        .unwrap();
        let state = update_data(&conn, wf.id, |data| data.review_completed = true)
            .unwrap()
            .unwrap();
        assert_eq!(state.data.document_ids, vec![1, 2]);
        assert_eq!(state.data.journal_entry_ids, vec![10]);
        assert!(state.data.review_completed);
        assert!(!state.data.export_completed);
    }

    #[test]
    fn test_step_names() {
        assert_eq!(step_name(1), "Select client");
        assert_eq!(step_name(8), "Complete");
        assert_eq!(step_name(99), "Unknown");
    }
}

use crate::db::get_connection;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let data_dir = std::path::PathBuf::from(&settings.data_dir);
    let db_path = data_dir.join("kicho.db");

    println!("User:       {}", if settings.user_name.is_empty() { "(not set)" } else { &settings.user_name });
    println!("Data dir:   {}", data_dir.display());
    println!("Database:   {}", db_path.display());

    if db_path.exists() {
        let conn = get_connection(&db_path)?;

        let clients: i64 = conn.query_row("SELECT count(*) FROM clients WHERE is_active = 1", [], |r| r.get(0))?;
        let rules: i64 = conn.query_row("SELECT count(*) FROM rules WHERE is_active = 1", [], |r| r.get(0))?;
        let documents: i64 = conn.query_row("SELECT count(*) FROM documents", [], |r| r.get(0))?;
        let pending: i64 = conn.query_row(
            "SELECT count(*) FROM journal_entries WHERE status = 'pending'",
            [],
            |r| r.get(0),
        )?;
        let workflows: i64 = conn.query_row("SELECT count(*) FROM workflows", [], |r| r.get(0))?;

        println!();
        println!("Clients:          {clients}");
        println!("Active rules:     {rules}");
        println!("Documents:        {documents}");
        println!("Pending entries:  {pending}");
        println!("Open workflows:   {workflows}");
    } else {
        println!();
        println!("Database not found. Run `kicho init` to set up.");
    }

    Ok(())
}

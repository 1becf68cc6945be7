pub mod clients;
pub mod demo;
pub mod export;
pub mod init;
pub mod process;
pub mod review;
pub mod rules;
pub mod status;
pub mod summary;
pub mod workflow;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "kicho", about = "Receipt-to-journal bookkeeping automation for accounting staff.")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up kicho: choose a data directory and initialize the database.
    Init {
        /// Path for kicho data (default: ~/Documents/kicho)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
    },
    /// Manage clients.
    Clients {
        #[command(subcommand)]
        command: ClientsCommands,
    },
    /// Manage classification rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Ingest receipt files for a client: upload, OCR, classify.
    Process {
        /// Receipt files (pre-extracted JSON receipts)
        files: Vec<String>,
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Review pending journal entries.
    Review {
        #[command(subcommand)]
        command: ReviewCommands,
    },
    /// Export approved journal entries.
    Export {
        /// Client name
        #[arg(long)]
        client: String,
        /// Output CSV path (default: <data_dir>/exports/<client>-YYYYMMDD.csv)
        #[arg(long)]
        output: Option<String>,
        /// Send to the freee stub instead of writing a CSV
        #[arg(long)]
        freee: bool,
    },
    /// Per-client summary: entry statuses, account totals, exceptions.
    Summary {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Drive the 8-step bookkeeping workflow.
    Workflow {
        #[command(subcommand)]
        command: WorkflowCommands,
    },
    /// Show current database and summary statistics.
    Status,
    /// Load sample data (client, rules, receipts) to explore kicho.
    Demo,
}

#[derive(Subcommand)]
pub enum ClientsCommands {
    /// Add a new client.
    Add {
        /// Client name, e.g. '山田運送'
        name: String,
        /// Industry code: driver, streamer, freelance
        #[arg(long)]
        industry: Option<String>,
        /// Tax treatment: 原則課税, 簡易課税, 免税
        #[arg(long = "tax-treatment", default_value = "原則課税")]
        tax_treatment: String,
        /// Enable client-specific classification rules
        #[arg(long = "custom-rules")]
        custom_rules: bool,
    },
    /// List all clients.
    List,
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// Add a classification rule.
    Add {
        /// Account item code to assign, e.g. 501
        #[arg(long)]
        account: String,
        /// Tax category name, e.g. '課税仕入 10%'
        #[arg(long)]
        tax: String,
        /// Rule direction: expense, income
        #[arg(long = "type", default_value = "expense")]
        rule_type: String,
        /// Supplier substring to match (case-insensitive)
        #[arg(long)]
        supplier: Option<String>,
        /// Inclusive minimum amount in yen
        #[arg(long = "amount-min")]
        amount_min: Option<i64>,
        /// Inclusive maximum amount in yen
        #[arg(long = "amount-max")]
        amount_max: Option<i64>,
        /// Scope to one client (mutually exclusive with --industry)
        #[arg(long)]
        client: Option<String>,
        /// Scope to an industry code (mutually exclusive with --client)
        #[arg(long)]
        industry: Option<String>,
        /// Rule priority (lower tried first within its scope)
        #[arg(long, default_value = "100")]
        priority: i64,
    },
    /// List active rules.
    List,
    /// Delete (deactivate) a rule by ID.
    Delete {
        /// Rule ID (shown in `kicho rules list`)
        id: i64,
    },
}

#[derive(Subcommand)]
pub enum ReviewCommands {
    /// List pending entries for a client, least confident first.
    List {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Approve a pending entry.
    Approve {
        /// Entry ID
        id: i64,
    },
    /// Reclassify an entry (sets provenance to manual).
    Edit {
        /// Entry ID
        id: i64,
        /// New account item code
        #[arg(long)]
        account: String,
        /// New tax category name
        #[arg(long)]
        tax: String,
        /// Category: business, private
        #[arg(long, default_value = "business")]
        category: String,
        /// Also create a client rule from this decision
        #[arg(long = "make-rule")]
        make_rule: bool,
    },
    /// Reject (delete) a pending entry.
    Reject {
        /// Entry ID
        id: i64,
    },
    /// Exclude a document from bookkeeping.
    Exclude {
        /// Document ID
        id: i64,
        /// Reason for exclusion
        #[arg(long)]
        reason: String,
    },
}

#[derive(Subcommand)]
pub enum WorkflowCommands {
    /// Start (or restart) the workflow for a client.
    Start {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Show a client's workflow position.
    Status {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Move to the next step.
    Advance {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Move back one step.
    Back {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Jump to a step (1-8).
    Jump {
        /// Client name
        #[arg(long)]
        client: String,
        /// Target step
        step: i64,
    },
    /// Mark a step completed without moving.
    Mark {
        /// Client name
        #[arg(long)]
        client: String,
        /// Step to mark (1-8)
        step: i64,
    },
    /// Suspend the workflow and return to client selection.
    Suspend {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Resume a suspended workflow.
    Resume {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// Finish the workflow and remove it.
    Complete {
        /// Client name
        #[arg(long)]
        client: String,
    },
    /// List all in-flight workflows.
    List,
}

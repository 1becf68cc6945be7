mod classifier;
mod cli;
mod db;
mod error;
mod exporter;
mod fmt;
mod models;
mod ocr;
mod processor;
mod reports;
mod resolver;
mod reviewer;
mod settings;
mod workflow;

use clap::Parser;

use cli::{Cli, ClientsCommands, Commands, ReviewCommands, RulesCommands, WorkflowCommands};

fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Init { data_dir } => cli::init::run(data_dir),
        Commands::Clients { command } => match command {
            ClientsCommands::Add {
                name,
                industry,
                tax_treatment,
                custom_rules,
            } => cli::clients::add(&name, industry.as_deref(), &tax_treatment, custom_rules),
            ClientsCommands::List => cli::clients::list(),
        },
        Commands::Rules { command } => match command {
            RulesCommands::Add {
                account,
                tax,
                rule_type,
                supplier,
                amount_min,
                amount_max,
                client,
                industry,
                priority,
            } => cli::rules::add(
                &account,
                &tax,
                &rule_type,
                supplier.as_deref(),
                amount_min,
                amount_max,
                client.as_deref(),
                industry.as_deref(),
                priority,
            ),
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Delete { id } => cli::rules::delete(id),
        },
        Commands::Process { files, client } => cli::process::run(&files, &client),
        Commands::Review { command } => match command {
            ReviewCommands::List { client } => cli::review::list(&client),
            ReviewCommands::Approve { id } => cli::review::approve(id),
            ReviewCommands::Edit {
                id,
                account,
                tax,
                category,
                make_rule,
            } => cli::review::edit(id, &account, &tax, &category, make_rule),
            ReviewCommands::Reject { id } => cli::review::reject(id),
            ReviewCommands::Exclude { id, reason } => cli::review::exclude(id, &reason),
        },
        Commands::Export {
            client,
            output,
            freee,
        } => cli::export::run(&client, output, freee),
        Commands::Summary { client } => cli::summary::run(&client),
        Commands::Workflow { command } => match command {
            WorkflowCommands::Start { client } => cli::workflow::start(&client),
            WorkflowCommands::Status { client } => cli::workflow::status(&client),
            WorkflowCommands::Advance { client } => cli::workflow::advance(&client),
            WorkflowCommands::Back { client } => cli::workflow::back(&client),
            WorkflowCommands::Jump { client, step } => cli::workflow::jump(&client, step),
            WorkflowCommands::Mark { client, step } => cli::workflow::mark(&client, step),
            WorkflowCommands::Suspend { client } => cli::workflow::suspend(&client),
            WorkflowCommands::Resume { client } => cli::workflow::resume(&client),
            WorkflowCommands::Complete { client } => cli::workflow::complete(&client),
            WorkflowCommands::List => cli::workflow::list(),
        },
        Commands::Status => cli::status::run(),
        Commands::Demo => cli::demo::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

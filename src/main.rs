// SPDX-License-Identifier: MIT

use adk_pipelines::adk::runner::{RunOutcome, Runner};
use adk_pipelines::adk::tool::ConfirmationRequest;
use adk_pipelines::pipelines::config::Settings;
use adk_pipelines::pipelines::server::{self, ServerState};
use adk_pipelines::pipelines::{Catalog, APPS};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Optional YAML settings file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List the available apps
    List,
    /// Run one app on a single input
    Run {
        /// App name (see `list`)
        #[arg(short, long)]
        app: String,

        /// The user message
        #[arg(short, long)]
        input: String,

        /// Session id to use
        #[arg(short, long)]
        session: Option<String>,

        /// Approve every confirmation request without asking
        #[arg(long, conflicts_with = "reject")]
        approve: bool,

        /// Reject every confirmation request without asking
        #[arg(long)]
        reject: bool,
    },
    /// Serve all apps over HTTP
    Serve {
        #[arg(short, long, default_value_t = 8080)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Commands::List => {
            for info in APPS.iter() {
                let marker = if info.resumable { " (resumable)" } else { "" };
                println!("{:<16} {}{}", info.name, info.description, marker);
            }
        }
        Commands::Run {
            app,
            input,
            session,
            approve,
            reject,
        } => {
            let settings = Settings::load(args.config.as_deref())?;
            let catalog = Catalog::new(settings);
            let app = catalog
                .build_app(&app)
                .with_context(|| format!("failed to build app '{}'", app))?;

            println!("Running app: {}", app.name);
            let runner = Runner::new(app);
            let mut outcome = runner.run(session.as_deref(), &input).await?;

            let decide = match (approve, reject) {
                (true, _) => Some(true),
                (_, true) => Some(false),
                _ => None,
            };

            while let Some(request) = outcome.confirmations().first().cloned() {
                let confirmed = match decide {
                    Some(confirmed) => confirmed,
                    None => ask(&request).await?,
                };
                outcome = runner
                    .resume(&outcome.session_id, &request.function_call_id, confirmed)
                    .await?;
            }

            print_outcome(&outcome);
        }
        Commands::Serve { port } => {
            let settings = Settings::load(args.config.as_deref())?;
            let catalog = Catalog::new(settings);
            let state = ServerState::from_catalog(&catalog)?;
            server::serve(port, state).await?;
        }
    }

    Ok(())
}

/// Prompt on the terminal; anything but y/yes rejects
async fn ask(request: &ConfirmationRequest) -> anyhow::Result<bool> {
    println!("{}", request.hint);
    print!("Approve {}? [y/N] ", request.tool_name);
    std::io::stdout().flush()?;

    let answer = tokio::task::spawn_blocking(|| {
        let mut line = String::new();
        std::io::stdin().read_line(&mut line).map(|_| line)
    })
    .await??;

    Ok(matches!(answer.trim().to_lowercase().as_str(), "y" | "yes"))
}

fn print_outcome(outcome: &RunOutcome) {
    println!("Session: {}", outcome.session_id);
    if let Some(output) = outcome.output() {
        println!("Response: {}", output);
    }
}

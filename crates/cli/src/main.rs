use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use dental_agents::DentalConcierge;
use dental_catalog::CatalogBackend;
use dental_observability::{init_tracing, AppMetrics};
use dental_retrieval::ServiceCatalog;

#[derive(Debug, Parser)]
#[command(name = "dental")]
#[command(about = "Dental clinic concierge CLI")]
struct Cli {
    /// Backend base URL; services are read from `<url>/api/services`.
    #[arg(long, env = "DENTAL_BACKEND_URL", default_value = "http://localhost:8080")]
    backend_url: String,

    #[arg(long, env = "DENTAL_FETCH_TIMEOUT_SECONDS", default_value_t = 10)]
    timeout_seconds: u64,

    /// Serve this JSON file instead of calling the backend.
    #[arg(long)]
    catalog_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    Chat {
        #[arg(long, env = "DENTAL_CHAT_TOP_K", default_value_t = 3)]
        top_k: usize,
    },
    Recommend {
        query: String,
        #[arg(long, env = "DENTAL_DEFAULT_TOP_K", default_value_t = 5)]
        top_k: usize,
        #[arg(long)]
        refresh: bool,
    },
    Classify {
        message: String,
    },
    Stats,
    Services,
    Refresh,
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing("dental_cli");
    let cli = Cli::parse();

    let concierge = build_concierge(&cli).await?;

    match cli.command {
        Command::Chat { top_k } => run_chat(concierge, top_k).await?,
        Command::Recommend {
            query,
            top_k,
            refresh,
        } => {
            let results = concierge.rank(&query, top_k, refresh).await;
            println!("{}", serde_json::to_string_pretty(&results)?);
        }
        Command::Classify { message } => {
            let result = concierge.classify(&message);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Command::Stats => {
            concierge.ensure_loaded(false).await;
            let stats = concierge.snapshot_stats();
            println!("{}", serde_json::to_string_pretty(&stats)?);
        }
        Command::Services => {
            let services = concierge.list_services().await;
            println!("{}", serde_json::to_string_pretty(&services)?);
        }
        Command::Refresh => {
            let outcome = concierge.refresh().await;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
    }

    Ok(())
}

async fn run_chat(concierge: DentalConcierge<CatalogBackend>, top_k: usize) -> Result<()> {
    println!("Dental concierge chat mode. type 'exit' to quit.");

    loop {
        print!("> ");
        io::stdout().flush()?;

        let mut line = String::new();
        if io::stdin().read_line(&mut line)? == 0 {
            break;
        }

        let message = line.trim();
        if message.eq_ignore_ascii_case("exit") || message.eq_ignore_ascii_case("quit") {
            break;
        }

        if message.is_empty() {
            continue;
        }

        let response = concierge.respond(message, top_k).await;
        println!("\n{}\n", response.reply);
    }

    Ok(())
}

async fn build_concierge(cli: &Cli) -> Result<DentalConcierge<CatalogBackend>> {
    let backend = match &cli.catalog_file {
        Some(path) => CatalogBackend::from_json_file(path)
            .await
            .with_context(|| format!("failed loading catalog from {}", path.display()))?,
        None => CatalogBackend::http(&cli.backend_url, Duration::from_secs(cli.timeout_seconds))
            .context("failed to build catalog HTTP client")?,
    };

    Ok(DentalConcierge::new(
        Arc::new(ServiceCatalog::new()),
        Arc::new(backend),
        AppMetrics::shared(),
    ))
}

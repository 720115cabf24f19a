use clap::Parser;
use std::path::PathBuf;
use stocksense::{
    config::AppConfig,
    repository::{save_results, DatasetRepository},
    stats, Answer, Dataset, QueryEngine,
};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Stock data analysis tool
#[derive(Debug, Parser)]
#[command(name = "stocksense", version)]
struct Cli {
    /// Path to stock data CSV file (overrides CSV_FILE_PATH)
    #[arg(long)]
    data: Option<PathBuf>,

    /// Gemini API key (overrides GEMINI_API_KEY)
    #[arg(long)]
    api_key: Option<String>,

    /// Custom queries to run; the standard queries run when omitted
    #[arg(long, num_args = 1..)]
    query: Vec<String>,

    /// Run in interactive mode after the batch
    #[arg(long)]
    interactive: bool,

    /// Do not write the results file
    #[arg(long)]
    no_save: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let mut config = AppConfig::from_env()?.with_api_key(cli.api_key.clone());
    if let Some(data) = cli.data.clone() {
        config.data_file = data;
    }

    let dataset = DatasetRepository::for_path(&config.data_file).load()?;
    println!("Loaded {} stocks from {}", dataset.len(), config.data_file.display());

    let engine = QueryEngine::new(config.engine_config()?);

    let answers = if cli.query.is_empty() {
        info!("Running standard queries");
        engine.run_standard_queries(&dataset).await?
    } else {
        info!(count = cli.query.len(), "Running custom queries");
        engine.resolve_all(cli.query.as_slice(), &dataset).await?
    };

    for answer in &answers {
        print_answer(answer);
    }

    if !cli.no_save {
        let path = save_results(&config.results_file, &answers)?;
        println!("Analysis complete. Results saved to {}", path.display());
    }

    if cli.interactive {
        run_interactive(&engine, &dataset).await?;
    }

    Ok(())
}

fn print_answer(answer: &Answer) {
    println!("\nQuery: {}", answer.query);
    println!("Response: {}", answer.response);
}

async fn run_interactive(
    engine: &QueryEngine,
    dataset: &Dataset,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== Stock Analysis Interactive Mode ===");
    println!("Type 'exit' to quit, 'stats' for basic statistics");

    let mut stdout = tokio::io::stdout();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        stdout.write_all(b"\nEnter your query: ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let query = line.trim();

        match query.to_lowercase().as_str() {
            "" => continue,
            "exit" | "quit" => break,
            "stats" => match stats::summarize(dataset) {
                Ok(snapshot) => println!("{}", snapshot),
                Err(e) => eprintln!("Error: {}", e),
            },
            _ => match engine.resolve(query, dataset).await {
                Ok(answer) => print_answer(&answer),
                Err(e) => eprintln!("Error: {}", e),
            },
        }
    }

    Ok(())
}

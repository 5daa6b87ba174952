use nl2sql::assistant::{Answer, SqlAssistant};
use nl2sql::config::{AppConfig, ConfigOverrides};
use nl2sql::extractor::extract_sql;
use nl2sql::llm::OllamaClient;
use nl2sql::presentation::OutputFormat;
use nl2sql::seed::seed_database;

use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io::{self, BufRead, Read, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nl2sql")]
#[command(about = "Ask questions about the product database in plain English")]
#[command(version)]
struct Args {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(ClapArgs)]
struct GlobalArgs {
    /// Path to the SQLite database (or set NL2SQL_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Ollama model to use (or set OLLAMA_MODEL)
    #[arg(long, global = true)]
    model: Option<String>,

    /// Ollama server URL (or set OLLAMA_HOST)
    #[arg(long, global = true)]
    ollama_url: Option<String>,

    /// Timeout for a single model call, in seconds
    #[arg(long, global = true)]
    timeout_secs: Option<u64>,

    /// File holding the schema description given to the model
    #[arg(long, global = true)]
    schema_file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Recreate the database with the sample products (destructive)
    Seed,
    /// Ask a single question
    Ask {
        /// The question in natural language
        question: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Ask questions interactively, one per line
    Repl {
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Run a SQL statement directly, without the model
    Sql {
        statement: String,

        #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Read a raw model completion on stdin and print the extracted SQL
    Extract,
}

impl GlobalArgs {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            db_path: self.db.clone(),
            ollama_url: self.ollama_url.clone(),
            model: self.model.clone(),
            timeout_secs: self.timeout_secs,
            schema_file: self.schema_file.clone(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<ExitCode> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    init_tracing();

    let args = Args::parse();
    let config = AppConfig::from_env()?.with_overrides(args.global.overrides())?;

    match args.command {
        Commands::Seed => seed(&config),
        Commands::Ask { question, format } => ask(&config, &question, format).await,
        Commands::Repl { format } => repl(&config, format).await,
        Commands::Sql { statement, format } => run_statement(&config, &statement, format),
        Commands::Extract => extract(),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn seed(config: &AppConfig) -> Result<ExitCode> {
    let report = seed_database(&config.db_path)
        .with_context(|| format!("Failed to seed database at {}", config.db_path.display()))?;

    if report.replaced_existing {
        println!("Existing database '{}' removed.", report.path.display());
    }
    println!(
        "Database '{}' created with {} sample products.",
        report.path.display(),
        report.rows_inserted
    );
    Ok(ExitCode::SUCCESS)
}

fn build_assistant(config: &AppConfig) -> Result<SqlAssistant<OllamaClient>> {
    let client = OllamaClient::new(config.ollama_url.clone(), config.model.clone(), config.llm_timeout)?;
    let assistant = SqlAssistant::new(config, client);

    assistant.ensure_database().with_context(|| {
        format!(
            "Database not found at '{}'. Please run `nl2sql seed` first to create and populate it.",
            config.db_path.display()
        )
    })?;

    Ok(assistant)
}

async fn ask(config: &AppConfig, question: &str, format: OutputFormat) -> Result<ExitCode> {
    let assistant = build_assistant(config)?;
    let answer = assistant.ask(question).await;
    print_answer(&answer, format)?;

    Ok(if answer.is_failure() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

async fn repl(config: &AppConfig, format: OutputFormat) -> Result<ExitCode> {
    let assistant = build_assistant(config)?;
    info!("Session started against {}", config.db_path.display());

    println!(
        "Ask questions about `{}` in plain English (model: {}). Type `exit` to quit.",
        config.db_path.display(),
        config.model
    );

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("\nEnter your question: ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            println!();
            break;
        };
        let question = line?;
        let question = question.trim();

        if question.is_empty() {
            continue;
        }
        if question.eq_ignore_ascii_case("exit") || question.eq_ignore_ascii_case("quit") {
            break;
        }

        let answer = assistant.ask(question).await;
        print_answer(&answer, format)?;
    }

    Ok(ExitCode::SUCCESS)
}

fn run_statement(config: &AppConfig, statement: &str, format: OutputFormat) -> Result<ExitCode> {
    let assistant = build_assistant(config)?;
    let answer = assistant.run_sql(statement);
    print_answer(&answer, format)?;

    Ok(if answer.is_failure() { ExitCode::FAILURE } else { ExitCode::SUCCESS })
}

/// Data goes to stdout; status messages in `json`/`csv` mode go to stderr
fn print_answer(answer: &Answer, format: OutputFormat) -> Result<()> {
    let text = answer.describe(format)?;
    if answer.is_data(format) {
        println!("{}", text);
    } else {
        eprintln!("{}", text);
    }
    Ok(())
}

fn extract() -> Result<ExitCode> {
    let mut completion = String::new();
    io::stdin()
        .read_to_string(&mut completion)
        .context("Failed to read completion from stdin")?;

    match extract_sql(&completion) {
        Some(sql) => {
            println!("{}", sql);
            Ok(ExitCode::SUCCESS)
        }
        None => {
            eprintln!("No SQL statement found in the input.");
            Ok(ExitCode::FAILURE)
        }
    }
}

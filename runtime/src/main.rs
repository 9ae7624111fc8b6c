use std::path::PathBuf;

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use tracing_subscriber::EnvFilter;

use handbook_runtime::cli;
use handbook_runtime::cli::output::{self, OutputMode};
use handbook_runtime::config::{ConfigOverrides, PageRange};

#[derive(Parser)]
#[command(
    name = "handbook",
    about = "Harvest subject prerequisites from the university handbook",
    version,
    after_help = "Run 'handbook <command> --help' for details on each command."
)]
struct Cli {
    /// Output results as JSON (machine-readable)
    #[arg(long, global = true)]
    json: bool,

    /// Suppress non-essential output
    #[arg(long, short, global = true)]
    quiet: bool,

    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    /// Log level (trace, debug, info, warn, error). RUST_LOG takes precedence.
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Log line format
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every subject's requirements and write the records as JSON
    Harvest {
        /// Output file
        #[arg(long, short, default_value = "subjects.json")]
        out: PathBuf,
        /// Handbook origin [env: HANDBOOK_BASE_URL]
        #[arg(long)]
        base_url: Option<String>,
        /// Maximum concurrent requests [env: HANDBOOK_WORKERS] [default: 12]
        #[arg(long)]
        workers: Option<usize>,
        /// Listing pages to harvest: N, A-B or A-
        #[arg(long)]
        pages: Option<PageRange>,
        /// Inherent-requirement boilerplate list, one statement per line
        /// [env: HANDBOOK_INHERENT_FILE]
        #[arg(long)]
        inherent: Option<PathBuf>,
        /// Per-request timeout in milliseconds [default: 30000]
        #[arg(long)]
        timeout: Option<u64>,
        /// Retries per request on transient errors [default: 0]
        #[arg(long)]
        retries: Option<u32>,
        /// Keep subjects that failed, tagged with their error
        #[arg(long)]
        include_incomplete: bool,
    },
    /// Re-run constraint extraction over a saved record file
    Extract {
        /// Record file written by `handbook harvest`
        #[arg(default_value = "subjects.json")]
        input: PathBuf,
        /// Write here instead of overwriting the input
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Print the prerequisite tree below a subject
    Tree {
        /// Subject code, e.g. COMP30023
        code: String,
        /// Record file written by `handbook harvest`
        #[arg(long, short, default_value = "subjects.json")]
        input: PathBuf,
    },
    /// Generate shell completion scripts
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish)
        shell: Shell,
    },
}

fn init_tracing(cli: &Cli) {
    let default_level = match (&cli.log_level, cli.verbose) {
        (Some(level), _) => level.clone(),
        (None, true) => "debug".to_string(),
        (None, false) => "info".to_string(),
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&default_level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match cli.log_format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    output::init(OutputMode {
        json: cli.json,
        quiet: cli.quiet,
        no_color: cli.no_color,
    });
    init_tracing(&cli);

    let result = match cli.command {
        Commands::Harvest {
            out,
            base_url,
            workers,
            pages,
            inherent,
            timeout,
            retries,
            include_incomplete,
        } => {
            let overrides = ConfigOverrides {
                base_url,
                workers,
                pages,
                inherent_path: inherent,
                timeout_ms: timeout,
                retries,
                include_incomplete,
            };
            cli::harvest_cmd::run(overrides, &out).await
        }
        Commands::Extract { input, out } => cli::extract_cmd::run(&input, out.as_deref()).await,
        Commands::Tree { code, input } => cli::tree_cmd::run(&input, &code).await,
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "handbook", &mut std::io::stdout());
            Ok(())
        }
    };

    // 0 = success, 1 = error
    if let Err(e) = &result {
        if output::is_json() {
            output::print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }));
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

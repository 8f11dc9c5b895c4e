use std::io::Read;
use std::path::{Path, PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use miette::{Context, IntoDiagnostic, Result};
use tracing_subscriber::EnvFilter;

use diffsarif_core::{Config, Credential, DiffSarifError, DiffUnit};
use diffsarif_gitdiff::{collect_commit_diffs, split_unified_diff, CommitRange};
use diffsarif_review::pipeline::AnalysisPipeline;
use diffsarif_server::AppState;

const DEFAULT_CONFIG_FILE: &str = ".diffsarif.toml";

#[derive(Parser)]
#[command(
    name = "diffsarif",
    version,
    about = "LLM-assisted diff analysis with SARIF output",
    long_about = "diffsarif sends each changed file's diff to an LLM, parses the reply into\n\
                   line/column findings and aggregates them into one SARIF 2.1.0 report.\n\n\
                   Examples:\n  \
                     diffsarif analyze                    Analyze HEAD^..HEAD in the current repo\n  \
                     git diff main | diffsarif analyze --stdin\n  \
                     diffsarif analyze --output out.sarif --fail-on-findings\n  \
                     diffsarif serve --bind 127.0.0.1:8000"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Path to configuration file (default: .diffsarif.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging on stderr
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Analyze changed files and print a SARIF report
    #[command(long_about = "Analyze changed files and print a SARIF report.\n\n\
        By default diffs the two most recent commits of the repository. Use --file or\n\
        --stdin to analyze a unified diff instead. The credential is read from the\n\
        environment variable named by llm.api_key_env (default: OPENAI_API_KEY).\n\n\
        Examples:\n  diffsarif analyze --repo .\n  diffsarif analyze --base main --head feature\n  git diff | diffsarif analyze --stdin")]
    Analyze {
        /// Repository path (default: current directory)
        #[arg(long, default_value = ".")]
        repo: PathBuf,

        /// Base revision (default: HEAD^)
        #[arg(long, default_value = "HEAD^")]
        base: String,

        /// Head revision (default: HEAD)
        #[arg(long, default_value = "HEAD")]
        head: String,

        /// Read a unified diff from this file instead of the repository
        #[arg(long, conflicts_with = "stdin")]
        file: Option<PathBuf>,

        /// Read a unified diff from stdin instead of the repository
        #[arg(long)]
        stdin: bool,

        /// Write the report to this path instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Override the configured model
        #[arg(long)]
        model: Option<String>,

        /// Override the configured number of concurrent LLM calls
        #[arg(long)]
        max_concurrent: Option<usize>,

        /// Override the configured maximum number of files (default: 50)
        #[arg(long)]
        max_files: Option<usize>,

        /// Exit with code 1 if the report contains any result
        #[arg(long)]
        fail_on_findings: bool,
    },
    /// Start the HTTP analysis service
    #[command(long_about = "Start the HTTP analysis service.\n\n\
        Endpoints:\n  GET  /          health check\n  POST /analyze   {\"key\": ..., \"files\": [{\"name\": ..., \"code\": ...}]}\n\n\
        Stops gracefully on Ctrl+C.")]
    Serve {
        /// Address to listen on (default: server.bind, 0.0.0.0:8000)
        #[arg(long)]
        bind: Option<String>,
    },
    /// Create a default .diffsarif.toml configuration file
    #[command(long_about = "Create a default .diffsarif.toml configuration file.\n\n\
        Generates a commented-out template with all available options.\n\
        Fails if .diffsarif.toml already exists.")]
    Init,
    /// Generate shell completion scripts
    #[command(hide = true)]
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

const DEFAULT_CONFIG: &str = r#"# diffsarif configuration

[llm]
# OpenAI-compatible endpoint (the /v1/... paths are appended)
# model = "gpt-4o"
# base_url = "https://api.openai.com"
# api_key_env = "OPENAI_API_KEY"
# max_tokens = 1024
# temperature = 0.7
# timeout_secs = 120

[analysis]
# max_concurrent = 4
# max_files = 50

[server]
# bind = "0.0.0.0:8000"
# max_files = 10

[report]
# tool_name = "diffsarif"
# information_uri = "https://github.com/diffsarif/diffsarif"
"#;

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_CONFIG_FILE);
            if default_path.exists() {
                Config::from_file(default_path)?
            } else {
                Config::default()
            }
        }
    };
    Ok(config)
}

/// Refuse to fan out more completion calls than `max_files`.
fn check_file_limit(files: &[DiffUnit], max_files: usize) -> Result<(), DiffSarifError> {
    if files.len() > max_files {
        return Err(DiffSarifError::Validation(format!(
            "{} changed files exceed the limit of {max_files}; raise analysis.max_files or pass --max-files",
            files.len()
        )));
    }
    Ok(())
}

fn read_diff_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) => std::fs::read_to_string(path)
            .into_diagnostic()
            .wrap_err(format!("reading {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .into_diagnostic()
                .wrap_err("reading stdin")?;
            Ok(input)
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .build(),
        )
    }))
    .expect("miette handler");
    human_panic::setup_panic!();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Analyze {
            repo,
            base,
            head,
            file,
            stdin,
            output,
            model,
            max_concurrent,
            max_files,
            fail_on_findings,
        } => {
            let mut config = load_config(cli.config.as_deref())?;
            if let Some(model) = model {
                config.llm.model = model;
            }
            if let Some(n) = max_concurrent {
                config.analysis.max_concurrent = n.max(1);
            }
            if let Some(n) = max_files {
                config.analysis.max_files = n.max(1);
            }

            let credential = match Credential::from_env(&config.llm.api_key_env) {
                Ok(credential) => credential,
                Err(_) => {
                    eprintln!(
                        "{} is not set; nothing to analyze",
                        config.llm.api_key_env
                    );
                    return Ok(());
                }
            };

            let files: Vec<DiffUnit> = if file.is_some() || stdin {
                split_unified_diff(&read_diff_input(file.as_deref())?)
            } else {
                collect_commit_diffs(&repo, &CommitRange { base, head })?
            };
            if files.is_empty() {
                eprintln!("No differences found");
                return Ok(());
            }
            check_file_limit(&files, config.analysis.max_files)?;

            let pipeline = AnalysisPipeline::from_config(&config)?;
            let report = pipeline.analyze(&credential, &files).await?;
            let json = serde_json::to_string_pretty(&report).into_diagnostic()?;

            match output {
                Some(path) => {
                    std::fs::write(&path, format!("{json}\n"))
                        .into_diagnostic()
                        .wrap_err(format!("writing {}", path.display()))?;
                    eprintln!(
                        "Wrote {} results for {} files to {}",
                        report.results().len(),
                        files.len(),
                        path.display()
                    );
                }
                None => println!("{json}"),
            }

            if fail_on_findings && !report.results().is_empty() {
                std::process::exit(1);
            }
        }
        Command::Serve { bind } => {
            let config = load_config(cli.config.as_deref())?;
            let addr = bind.unwrap_or_else(|| config.server.bind.clone());
            let pipeline = AnalysisPipeline::from_config(&config)?;
            diffsarif_server::bind_and_serve(&addr, AppState::new(pipeline, &config))
                .await
                .wrap_err(format!("serving on {addr}"))?;
        }
        Command::Init => {
            let path = Path::new(DEFAULT_CONFIG_FILE);
            if path.exists() {
                miette::bail!("{DEFAULT_CONFIG_FILE} already exists");
            }
            std::fs::write(path, DEFAULT_CONFIG).into_diagnostic()?;
            println!("Created {DEFAULT_CONFIG_FILE} with default configuration");
        }
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "diffsarif", &mut std::io::stdout());
        }
    }

    Ok(())
}

//! Scout CLI - command-line interface for the research agent

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use scout_core::{init_logging, ScoutConfig};
use scout_research::{
    build_chat_client, create_auto_client, FileReportStore, ResearchAgent, ResearchOptions,
    SourceKind, SourceRegistry,
};
use scout_tools::Tool;
use std::path::PathBuf;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "scout")]
#[command(about = "An LLM-orchestrated deep research assistant")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a research session for a query
    Research {
        /// The research query
        query: String,

        /// Comma-separated source allowlist (web, docstore)
        #[arg(short, long, default_value = "web")]
        sources: String,

        /// Maximum number of research iterations
        #[arg(long)]
        max_iterations: Option<usize>,

        /// Research depth preset
        #[arg(long, value_enum, default_value_t = Depth::Balanced)]
        depth: Depth,

        /// Write the report as markdown to this file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the report as JSON instead of markdown
        #[arg(long)]
        json: bool,

        /// Do not persist the report to the local store
        #[arg(long)]
        no_save: bool,
    },

    /// Probe configured sources and print their availability
    Sources,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Manage stored research reports
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Write a default configuration file
    Init,
    /// Print the effective configuration
    Show,
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List stored reports
    List,
    /// Print a stored report as markdown
    Show { id: String },
    /// Delete a stored report
    Delete { id: String },
}

/// Iteration-bound presets
#[derive(Clone, Copy, ValueEnum)]
enum Depth {
    Shallow,
    Balanced,
    Deep,
}

impl Depth {
    fn max_iterations(self) -> usize {
        match self {
            Depth::Shallow => 3,
            Depth::Balanced => 10,
            Depth::Deep => 20,
        }
    }
}

fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("scout")
        .join("scout.toml")
}

fn load_config(path: Option<&PathBuf>) -> anyhow::Result<ScoutConfig> {
    let path = path.cloned().unwrap_or_else(default_config_path);
    let config = if path.exists() {
        ScoutConfig::from_file(&path).with_context(|| format!("loading {}", path.display()))?
    } else {
        ScoutConfig::default()
    };
    Ok(config.apply_env())
}

fn parse_sources(list: &str) -> anyhow::Result<Vec<SourceKind>> {
    let mut sources = Vec::new();
    for name in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
        let kind = SourceKind::parse(name)
            .ok_or_else(|| anyhow::anyhow!("unknown source '{}' (expected: web, docstore)", name))?;
        if !sources.contains(&kind) {
            sources.push(kind);
        }
    }
    Ok(sources)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_ref())?;
    if cli.verbose {
        config.logging.level = "debug".to_string();
    }
    init_logging(&config.logging).map_err(|e| anyhow::anyhow!("logging setup failed: {}", e))?;
    config.validate()?;

    match cli.command {
        Commands::Research {
            query,
            sources,
            max_iterations,
            depth,
            output,
            json,
            no_save,
        } => {
            let options = ResearchOptions {
                enabled_sources: parse_sources(&sources)?,
                max_iterations: max_iterations.unwrap_or_else(|| depth.max_iterations()),
                ..Default::default()
            };

            run_research(&config, &query, options, output, json, no_save).await?;
        }
        Commands::Sources => {
            probe_sources(&config)?;
        }
        Commands::Config { action } => match action {
            ConfigAction::Init => {
                let path = cli.config.unwrap_or_else(default_config_path);
                if let Some(parent) = path.parent() {
                    std::fs::create_dir_all(parent)?;
                }
                ScoutConfig::default().save_to_file(&path)?;
                println!("Wrote default configuration to {}", path.display());
            }
            ConfigAction::Show => {
                println!("{}", toml_pretty(&config)?);
            }
        },
        Commands::History { action } => {
            let store = FileReportStore::default_location()?;
            match action {
                HistoryAction::List => {
                    let reports = store.list()?;
                    if reports.is_empty() {
                        println!("No stored reports.");
                    }
                    for summary in reports {
                        println!(
                            "{}  {}  confidence {:.0}%  {} iterations\n    {}",
                            summary.id,
                            summary.completed_at.format("%Y-%m-%d %H:%M"),
                            summary.confidence * 100.0,
                            summary.iterations,
                            summary.query,
                        );
                    }
                }
                HistoryAction::Show { id } => {
                    let report = store.load(&id)?;
                    println!("{}", report.to_markdown());
                }
                HistoryAction::Delete { id } => {
                    store.delete(&id)?;
                    println!("Deleted report {}", id);
                }
            }
        }
    }

    Ok(())
}

async fn run_research(
    config: &ScoutConfig,
    query: &str,
    options: ResearchOptions,
    output: Option<PathBuf>,
    json: bool,
    no_save: bool,
) -> anyhow::Result<()> {
    let llm = match build_chat_client(&config.llm).await {
        Ok(client) => client,
        Err(e) => {
            warn!(error = %e, "Configured LLM unavailable, probing the environment");
            create_auto_client().await?
        }
    };

    let registry = SourceRegistry::from_config(&config.tools, &options.enabled_sources)?;
    if registry.is_empty() && !options.enabled_sources.is_empty() {
        warn!("No usable sources remain after capability probing");
    }

    let agent = ResearchAgent::new(llm, registry, options);
    let report = agent.conduct_research(query).await?;

    info!(
        iterations = report.iterations,
        findings = report.findings.len(),
        confidence = report.confidence,
        "Research session complete"
    );

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("{}", report.to_markdown());
    }

    if let Some(path) = output {
        std::fs::write(&path, report.to_markdown())?;
        println!("Report written to {}", path.display());
    }

    if !no_save {
        match FileReportStore::default_location().and_then(|store| store.save(&report)) {
            Ok(id) => println!("Report stored with id {}", id),
            Err(e) => warn!(error = %e, "Could not persist report"),
        }
    }

    Ok(())
}

/// Print each configured source and whether its tools are usable
fn probe_sources(config: &ScoutConfig) -> anyhow::Result<()> {
    let client = scout_tools::default_http_client()?;

    let web_search = scout_tools::WebSearchTool::new(client.clone(), &config.tools.web);
    let page_extract = scout_tools::PageContentTool::new(client.clone(), &config.tools.web);
    let doc_search = scout_tools::DocStoreSearchTool::new(client.clone(), &config.tools.docstore);
    let doc_fetch = scout_tools::DocStoreContentTool::new(client, &config.tools.docstore);

    println!("Source availability:");
    print_probe(SourceKind::Web, &web_search, &page_extract);
    print_probe(SourceKind::DocStore, &doc_search, &doc_fetch);
    Ok(())
}

fn print_probe(kind: SourceKind, search: &dyn Tool, extract: &dyn Tool) {
    println!(
        "  {:<10} search: {:<11} extraction: {}",
        kind,
        if search.usable() { "available" } else { "unavailable" },
        if extract.usable() { "available" } else { "unavailable" },
    );
}

fn toml_pretty(config: &ScoutConfig) -> anyhow::Result<String> {
    Ok(toml::to_string_pretty(config)?)
}

//! Vigil - Autonomous Web Security Agent CLI

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::builder::Builder;
use tabled::settings::Style;
use tracing_subscriber::EnvFilter;
use url::Url;

use vigil::agent::Orchestrator;
use vigil::analysis::nvd::NvdClient;
use vigil::config::{self, AgentConfig, CliOverrides};
use vigil::download;
use vigil::models::{Finding, RiskLevel};
use vigil::navigator::{HttpNavigator, Navigate};
use vigil::reasoning::{mock::MockEngine, ollama::OllamaEngine, LlmEngine, ReasoningEngine};
use vigil::report;
use vigil::scanner::ZapScanner;

const DEFAULT_CONFIG_PATH: &str = "config/settings.yaml";

/// Vigil - Autonomous Web Security Agent
#[derive(Parser)]
#[command(name = "vigil", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the agent against a target
    Scan {
        /// Target URL to analyze
        #[arg(short, long)]
        target: String,

        /// Path to configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output file path (default: vigil_{hostname}.{ext})
        #[arg(short, long)]
        output: Option<String>,

        /// Output format (html or json)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Override headless mode (browser feature only)
        #[arg(long)]
        headless: Option<bool>,

        /// Page load timeout in milliseconds
        #[arg(long)]
        timeout: Option<u64>,

        /// Maximum link depth from the start page
        #[arg(long)]
        max_depth: Option<u32>,

        /// Maximum number of pages to visit
        #[arg(long)]
        max_pages: Option<usize>,

        /// Minimum risk level reported (low, medium, high)
        #[arg(long)]
        risk_threshold: Option<String>,

        /// Disable LLM analysis
        #[arg(long)]
        no_llm: bool,

        /// Use the deterministic mock LLM backend (offline)
        #[arg(long)]
        mock_llm: bool,

        /// Run an external ZAP scan after the crawl
        #[arg(long)]
        zap: bool,

        /// ZAP scan timeout in seconds
        #[arg(long)]
        scan_timeout: Option<u64>,

        /// Render pages in a headless browser (requires the browser feature)
        #[arg(long)]
        render: bool,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// List or download local models
    Model {
        /// List available models
        #[arg(long)]
        list: bool,

        /// Download the named model
        #[arg(long)]
        model: Option<String>,

        /// Directory to store model files
        #[arg(long, default_value = "models")]
        dir: PathBuf,

        /// Path to configuration file to update
        #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
        config: PathBuf,
    },

    /// Re-render a saved JSON report
    Report {
        /// Path to the JSON report file
        #[arg(short, long)]
        input: PathBuf,

        /// Output file path
        #[arg(short, long, default_value = "vigil_report.html")]
        output: String,
    },
}

fn init_tracing(verbose: bool) {
    let filter = if verbose { "vigil=debug" } else { "vigil=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_target(false)
        .init();
}

fn print_banner() {
    let banner = r#"
    ╔═══════════════════════════════════════╗
    ║  👁  VIGIL v0.1.0                     ║
    ║  Autonomous Web Security Agent        ║
    ╚═══════════════════════════════════════╝
    "#;
    println!("{}", banner.cyan());
}

fn print_summary(findings: &[Finding]) {
    let risks = [
        (RiskLevel::High, "High"),
        (RiskLevel::Medium, "Medium"),
        (RiskLevel::Low, "Low"),
    ];

    println!("\n{}", "  Findings Summary".bold());
    println!("  {}", "─".repeat(35));

    let mut builder = Builder::default();
    builder.push_record(["Risk", "Count"]);
    for (risk, label) in &risks {
        let count = findings.iter().filter(|f| f.risk == *risk).count();
        builder.push_record([label.to_string(), count.to_string()]);
    }
    builder.push_record(["Total".to_string(), findings.len().to_string()]);

    let mut table = builder.build();
    table.with(Style::rounded());
    println!("{table}");

    let high = findings.iter().filter(|f| f.risk == RiskLevel::High).count();
    let medium = findings
        .iter()
        .filter(|f| f.risk == RiskLevel::Medium)
        .count();
    let low = findings.iter().filter(|f| f.risk == RiskLevel::Low).count();

    println!(
        "\n  {} {} {}",
        format!("{high} High").red().bold(),
        format!("{medium} Medium").yellow(),
        format!("{low} Low").blue(),
    );
}

fn output_name_from_target(target: &str, ext: &str) -> String {
    if let Ok(url) = Url::parse(target) {
        let host = url.host_str().unwrap_or("unknown");
        let sanitized: String = host
            .chars()
            .map(|c| if c == '.' { '_' } else { c })
            .collect();
        format!("vigil_{sanitized}.{ext}")
    } else {
        format!("vigil_report.{ext}")
    }
}

#[allow(clippy::too_many_arguments)]
async fn run_scan(
    target: String,
    config_path: Option<PathBuf>,
    output: Option<String>,
    format: String,
    overrides: CliOverrides,
    mock_llm: bool,
    zap: bool,
    render: bool,
) -> std::result::Result<(), Box<dyn std::error::Error>> {
    let mut agent_config = match config_path {
        Some(ref path) => AgentConfig::load(path)?,
        None => AgentConfig::load_or_default(Path::new(DEFAULT_CONFIG_PATH))?,
    };
    config::merge_cli_overrides(&mut agent_config, overrides);

    println!("  {} {}", "Target:".bold(), target.green());
    println!(
        "  {} {} (threshold: {})",
        "Limits:".bold(),
        format!(
            "depth {} / {} pages",
            agent_config.agent.max_depth, agent_config.agent.max_pages
        )
        .cyan(),
        agent_config.security.risk_threshold.to_string().cyan()
    );

    let navigator: Arc<dyn Navigate> = build_navigator(&agent_config, render).await?;

    let reasoning = if !agent_config.llm.enabled {
        None
    } else if mock_llm {
        let engine: Arc<dyn LlmEngine> = Arc::new(MockEngine::new());
        Some(ReasoningEngine::new(engine, &agent_config.llm))
    } else {
        match OllamaEngine::connect(&agent_config.llm).await {
            Ok(engine) => {
                let engine: Arc<dyn LlmEngine> = Arc::new(engine);
                Some(ReasoningEngine::new(engine, &agent_config.llm))
            }
            Err(e) => {
                eprintln!(
                    "  {} {e}. Skipping LLM analysis.",
                    "Warning:".yellow().bold()
                );
                None
            }
        }
    };
    if let Some(ref engine) = reasoning {
        println!(
            "  {} {} backend",
            "LLM:".bold(),
            engine.backend_name().cyan()
        );
    }

    let scanner = if zap {
        match ZapScanner::connect(&agent_config.security).await {
            Ok(scanner) => Some(scanner),
            Err(e) => {
                eprintln!("  {} {e}. Skipping external scan.", "Warning:".yellow().bold());
                None
            }
        }
    } else {
        None
    };

    let nvd = if agent_config.security.nvd_enrich {
        Some(NvdClient::new(agent_config.security.nvd_api_key.clone())?)
    } else {
        None
    };

    let orchestrator = Orchestrator::new(agent_config, navigator, reasoning, scanner, nvd);
    let scan_report = orchestrator.run(&target).await?;

    print_summary(&scan_report.findings);
    println!(
        "\n  {} {}",
        "Pages visited:".bold(),
        scan_report.pages_visited.len().to_string().cyan()
    );

    let output_file = output.unwrap_or_else(|| {
        let ext = if format == "json" { "json" } else { "html" };
        output_name_from_target(&target, ext)
    });
    let output_path = Path::new(&output_file);
    match format.as_str() {
        "json" => report::json::export(&scan_report, output_path)?,
        _ => {
            report::html::generate(&scan_report, output_path)?;
            report::json::export(&scan_report, &output_path.with_extension("json"))?;
        }
    }
    println!("\n  {} {}", "Report saved to:".bold(), output_file.green());
    Ok(())
}

#[cfg(feature = "browser")]
async fn build_navigator(
    config: &AgentConfig,
    render: bool,
) -> std::result::Result<Arc<dyn Navigate>, Box<dyn std::error::Error>> {
    if render {
        let navigator = vigil::navigator::browser::BrowserNavigator::launch(&config.navigator).await?;
        Ok(Arc::new(navigator))
    } else {
        Ok(Arc::new(HttpNavigator::from_config(&config.navigator)?))
    }
}

#[cfg(not(feature = "browser"))]
async fn build_navigator(
    config: &AgentConfig,
    render: bool,
) -> std::result::Result<Arc<dyn Navigate>, Box<dyn std::error::Error>> {
    if render {
        return Err("--render requires building with the 'browser' feature".into());
    }
    Ok(Arc::new(HttpNavigator::from_config(&config.navigator)?))
}

#[tokio::main]
async fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Scan {
            target,
            config: config_path,
            output,
            format,
            headless,
            timeout,
            max_depth,
            max_pages,
            risk_threshold,
            no_llm,
            mock_llm,
            zap,
            scan_timeout,
            render,
            verbose,
        } => {
            init_tracing(verbose);
            print_banner();

            let threshold = match risk_threshold {
                Some(ref raw) => match RiskLevel::parse(raw) {
                    Some(level) => Some(level),
                    None => {
                        eprintln!(
                            "  {} Invalid --risk-threshold '{raw}'. Use: low, medium, high",
                            "Error:".red().bold()
                        );
                        std::process::exit(2);
                    }
                },
                None => None,
            };

            let overrides = CliOverrides {
                headless,
                timeout_ms: timeout,
                max_depth,
                max_pages,
                risk_threshold: threshold,
                no_llm,
                scan_timeout,
            };

            run_scan(
                target, config_path, output, format, overrides, mock_llm, zap, render,
            )
            .await?;
        }

        Commands::Model {
            list,
            model,
            dir,
            config,
        } => {
            init_tracing(false);
            print_banner();

            if list || model.is_none() {
                println!("  {}\n", "Available models:".bold());
                let mut builder = Builder::default();
                builder.push_record(["Name", "File", "Quantization", "Size"]);
                for spec in download::catalog() {
                    builder.push_record([
                        spec.name.to_string(),
                        spec.file.to_string(),
                        spec.quantization.to_string(),
                        format!("{} MB", spec.size_mb),
                    ]);
                }
                let mut table = builder.build();
                table.with(Style::rounded());
                println!("{table}");
            }

            if let Some(name) = model {
                let path = download::download_model(&name, &dir, &config).await?;
                println!(
                    "\n  {} {}",
                    "Model ready at:".bold(),
                    path.display().to_string().green()
                );
            }
        }

        Commands::Report { input, output } => {
            init_tracing(false);
            print_banner();

            let scan_report = report::json::load(&input)?;
            report::html::generate(&scan_report, Path::new(&output))?;
            print_summary(&scan_report.findings);
            println!("\n  {} {}", "Report saved to:".bold(), output.green());
        }
    }

    Ok(())
}

use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use lumi_probe::auth::jwt;
use lumi_probe::parser::{builtin_names, builtin_suite};
use lumi_probe::utils::config::Config;
use lumi_probe::{report, run_probes, RunOptions};

#[derive(Parser)]
#[command(name = "lumi-probe")]
#[command(author = "NL Team")]
#[command(version = "0.1.0")]
#[command(about = "HTTP integration probe harness", long_about = None)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Backend base URL for the default suite (e.g. http://localhost:8080)
    base_url: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run probe suite(s) against a backend
    Run {
        /// Backend base URL
        #[arg(short, long)]
        url: Option<String>,

        /// Named server preset from the config
        #[arg(long, conflicts_with = "url")]
        server: Option<String>,

        /// Suite file, directory of suites, or built-in suite name
        #[arg(short, long)]
        suite: Option<String>,

        /// Phone number used for login
        #[arg(long)]
        phone: Option<String>,

        /// Filter steps by tags (comma-separated)
        #[arg(short, long, value_delimiter = ',')]
        tags: Option<Vec<String>>,

        /// Output directory for reports
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Generate HTML and JUnit reports besides JSON
        #[arg(long, default_value = "false")]
        report: bool,

        /// Log request details and failed response messages
        #[arg(short, long, default_value = "false")]
        verbose: bool,

        /// Config file (defaults to ./lumi-probe.yaml when present)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Generate report from saved probe results
    Report {
        /// Path to a JSON probe report
        results: PathBuf,

        /// Output format (json, html, junit)
        #[arg(short, long, default_value = "html")]
        format: String,

        /// Output file path
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Decode and print the claims of a bearer token
    Token {
        /// JWT, with or without the "Bearer " prefix
        token: String,
    },

    /// List built-in suites
    Suites,
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        None => {
            init_logging(false);
            let config = Config::load(None)?;
            run_probes(&RunOptions::for_url(cli.base_url), &config)?;
        }

        Some(Commands::Run {
            url,
            server,
            suite,
            phone,
            tags,
            output,
            report,
            verbose,
            config,
        }) => {
            init_logging(verbose);
            let config = Config::load(config.as_deref())?;

            if let Some(ref tags_list) = tags {
                println!("  Tags: {}", tags_list.join(", ").yellow());
            }

            let options = RunOptions {
                url,
                server,
                suite,
                phone,
                tags: tags.unwrap_or_default(),
                output,
                report,
                verbose,
            };
            let reports = run_probes(&options, &config)?;

            if reports.len() > 1 {
                let total: usize = reports.iter().map(|r| r.summary.total).sum();
                let passed: usize = reports.iter().map(|r| r.summary.passed).sum();
                println!(
                    "\n{} {} suite(s), {}/{} probe(s) passed",
                    "■".blue(),
                    reports.len(),
                    passed,
                    total
                );
            }
        }

        Some(Commands::Report {
            results,
            format,
            output,
        }) => {
            init_logging(false);
            println!(
                "{} Generating {} report from: {}",
                "📊".cyan(),
                format,
                results.display()
            );
            report::generate_report(&results, &format, output.as_deref())?;
        }

        Some(Commands::Token { token }) => {
            init_logging(false);
            print_token(&token)?;
        }

        Some(Commands::Suites) => {
            println!("{}", "Built-in suites".bold());
            for name in builtin_names() {
                let suite = builtin_suite(name)?;
                println!(
                    "  {} {} ({} step(s)) {}",
                    "•".cyan(),
                    name.green(),
                    suite.step_count(),
                    suite.description.as_deref().unwrap_or("").dimmed()
                );
            }
        }
    }

    Ok(())
}

fn print_token(token: &str) -> anyhow::Result<()> {
    let claims = jwt::decode_claims(token)?;

    println!("{}", "Token claims".bold());
    println!("{}", serde_json::to_string_pretty(&claims.claims)?);

    if let Some(sub) = claims.subject() {
        println!("  Subject:    {}", sub.cyan());
    }
    if let Some(iat) = claims.issued_at() {
        println!("  Issued at:  {}", iat.to_rfc3339());
    }
    match claims.expires_at() {
        Some(exp) => {
            let state = if claims.is_expired_at(chrono::Utc::now()) {
                "expired".red()
            } else {
                "valid".green()
            };
            println!("  Expires at: {} ({})", exp.to_rfc3339(), state);
        }
        None => println!("  Expires at: {}", "never".yellow()),
    }

    Ok(())
}

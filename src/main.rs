use std::fs;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use eligibility_oracle::chain::rpc::JsonRpcReader;
use eligibility_oracle::config::{Config, ConfigOverrides};
use eligibility_oracle::engine::evaluator::evaluate_eligibility;
use eligibility_oracle::engine::EligibilityReport;
use eligibility_oracle::output::json::render_json;
use eligibility_oracle::output::table::{
    render_report_table, render_rules_table, render_tokens_table,
};
use eligibility_oracle::rules::builder::{default_rules, display_label};
use eligibility_oracle::rules::{Operator, Rule};
use eligibility_oracle::server::run_server;
use eligibility_oracle::tokens::store::FileTokenStore;
use eligibility_oracle::tokens::{NewToken, TokenRecord, TokenStore};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Table,
    Json,
}

#[derive(Debug, Parser)]
#[command(
    name = "eligibility-oracle",
    about = "Token-gated eligibility checks over ERC-20 style contracts"
)]
struct Cli {
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[arg(short, long)]
    rpc: Option<String>,
    #[arg(long = "tokens-path")]
    tokens_path: Option<String>,
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Table)]
    output: OutputFormat,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Register a token contract with its ABI.
    AddToken {
        name: String,
        address: String,
        #[arg(long = "abi-file")]
        abi_file: PathBuf,
    },
    /// List registered tokens.
    Tokens,
    /// Remove a token by id.
    RemoveToken { id: u64 },
    /// Show the default rule set derived from a token's ABI.
    Rules { token: String },
    /// Evaluate eligibility of a wallet address against a token's rules.
    Check {
        token: String,
        address: String,
        /// Rule override, e.g. "balanceOf>=100". Repeatable; replaces the
        /// ABI-derived defaults entirely when given.
        #[arg(long = "rule")]
        rules: Vec<String>,
    },
    Serve {
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
        #[arg(long, default_value_t = 3001)]
        port: u16,
    },
    Config {
        #[arg(long)]
        init: bool,
        #[arg(long)]
        show: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load(Some(&config_path))?;
    config.apply_overrides(ConfigOverrides {
        rpc_url: cli.rpc.clone(),
        tokens_path: cli.tokens_path.clone(),
    });

    if matches!(cli.command, Commands::Config { .. }) {
        return handle_config_command(&cli.command, &config, &config_path);
    }

    let store = FileTokenStore::open(&config.resolved_tokens_path())?;

    if let Commands::Serve { host, port } = &cli.command {
        let bind = format!("{host}:{port}");
        let addr: SocketAddr = bind
            .parse()
            .map_err(|e| anyhow!("invalid bind address {bind}: {e}"))?;
        let reader = JsonRpcReader::new(&config.rpc.url, config.rpc.timeout_secs);
        return run_server(config, Arc::new(store), Arc::new(reader), addr).await;
    }

    match &cli.command {
        Commands::AddToken {
            name,
            address,
            abi_file,
        } => {
            let abi = fs::read_to_string(abi_file)
                .with_context(|| format!("failed reading ABI file: {}", abi_file.display()))?;
            let record = store.insert(NewToken {
                name: name.clone(),
                address: address.clone(),
                abi,
            })?;
            println!("Registered token {} with id {}", record.name, record.id);
        }
        Commands::Tokens => {
            let tokens = store.list()?;
            print_tokens(&tokens, cli.output)?;
        }
        Commands::RemoveToken { id } => {
            if store.delete(*id)? {
                println!("Removed token {id}");
            } else {
                return Err(anyhow!("no token with id {id}"));
            }
        }
        Commands::Rules { token } => {
            let token = resolve_token(&store, token)?;
            let rules = default_rules(&token.abi);
            print_rules(&rules, cli.output)?;
        }
        Commands::Check {
            token,
            address,
            rules,
        } => {
            let token = resolve_token(&store, token)?;
            let rules = if rules.is_empty() {
                default_rules(&token.abi)
            } else {
                rules
                    .iter()
                    .map(|spec| parse_rule_spec(spec))
                    .collect::<Result<Vec<_>>>()?
            };
            if rules.is_empty() {
                return Err(anyhow!(
                    "token {} has no rule-capable functions in its ABI",
                    token.name
                ));
            }
            let reader = JsonRpcReader::new(&config.rpc.url, config.rpc.timeout_secs);
            let report = evaluate_eligibility(
                &reader,
                &token,
                address,
                &rules,
                config.evaluation.default_decimals,
            )
            .await?;
            print_report(&report, cli.output)?;
            if !report.success {
                std::process::exit(1);
            }
        }
        Commands::Config { .. } => {}
        Commands::Serve { .. } => unreachable!("serve command handled before dispatch"),
    }

    Ok(())
}

fn handle_config_command(command: &Commands, config: &Config, config_path: &PathBuf) -> Result<()> {
    let Commands::Config { init, show } = command else {
        return Ok(());
    };
    if *init {
        Config::write_template(config_path)?;
        println!("Wrote config template to {}", config_path.display());
    }
    if *show || !*init {
        println!("{}", render_json(config)?);
    }
    Ok(())
}

fn resolve_token(store: &FileTokenStore, selector: &str) -> Result<TokenRecord> {
    let found = if let Ok(id) = selector.parse::<u64>() {
        store.get(id)?
    } else {
        store.find_by_name(selector)?
    };
    found.ok_or_else(|| anyhow!("no token matching {selector}"))
}

/// Parse a compact rule override like "balanceOf>=100" or "tier == 3".
fn parse_rule_spec(spec: &str) -> Result<Rule> {
    // Two-character operators must be tried first so ">=" does not split
    // as ">" at the wrong position.
    for symbol in [">=", "<=", "==", "!=", ">", "<"] {
        let Some(at) = spec.find(symbol) else {
            continue;
        };
        let function_name = spec[..at].trim();
        let raw_value = spec[at + symbol.len()..].trim();
        if function_name.is_empty() {
            return Err(anyhow!("rule is missing a function name: {spec}"));
        }
        let value = f64::from_str(raw_value)
            .map_err(|_| anyhow!("invalid threshold in rule {spec}: {raw_value}"))?;
        let operator = Operator::from_str(symbol)?;
        return Ok(Rule {
            function_name: function_name.to_string(),
            operator,
            value,
            display_name: display_label(function_name),
        });
    }
    Err(anyhow!(
        "rule must look like <function><op><value>, e.g. balanceOf>=100: {spec}"
    ))
}

fn print_tokens(tokens: &[TokenRecord], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_tokens_table(tokens)),
        OutputFormat::Json => println!("{}", render_json(tokens)?),
    }
    Ok(())
}

fn print_rules(rules: &[Rule], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_rules_table(rules)),
        OutputFormat::Json => println!("{}", render_json(rules)?),
    }
    Ok(())
}

fn print_report(report: &EligibilityReport, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Table => println!("{}", render_report_table(report)),
        OutputFormat::Json => println!("{}", render_json(report)?),
    }
    Ok(())
}

//! `waypoint`: inspect, import, and filter recorded searches from the shell.

use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use waypoint_rs::config::{LayeredConfigOptions, WaypointConfig};
use waypoint_rs::ledger::{Ledger, Predicate, VendorGateway};
use waypoint_rs::protocol::{Domain, ListOrder, RequestParams};
use waypoint_rs::tools::parse_resource_uri;
use waypoint_rs::{ReplayGateway, domain_server, init_logging};

/// Command-line options for the waypoint CLI.
#[derive(Parser)]
#[command(name = "waypoint", version, about = "Search-result ledger for the domain servers")]
struct Cli {
    /// Optional path to a waypoint.json5 applied over the discovered layers
    #[arg(long)]
    config: Option<PathBuf>,
    /// Storage root override
    #[arg(long)]
    root: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List recorded searches of a domain
    List {
        domain: Domain,
        /// Newest first
        #[arg(long)]
        descending: bool,
    },
    /// Print one stored record
    Show { domain: Domain, id: String },
    /// Filter a stored record; repeat --predicate to chain
    Filter {
        domain: Domain,
        id: String,
        /// Predicate JSON, e.g. '{"kind":"range","field":"price","max":25}'
        #[arg(long = "predicate", required = true)]
        predicates: Vec<String>,
    },
    /// Record a search from a captured vendor response
    Import {
        domain: Domain,
        /// Request parameters as a JSON object
        #[arg(long)]
        params: String,
        /// File holding the vendor response JSON
        #[arg(long)]
        response: PathBuf,
    },
    /// Render a resource such as hotels://searches
    Resource { uri: String },
    /// List the tools a domain server exposes
    Tools { domain: Domain },
    /// Call a domain tool
    Call {
        domain: Domain,
        tool: String,
        /// Tool arguments as a JSON object
        #[arg(long)]
        args: Option<String>,
        /// Captured vendor response answering search tools
        #[arg(long)]
        response: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let cli = Cli::parse();
    info!(
        "starting waypoint (config_set={}, root_set={})",
        cli.config.is_some(),
        cli.root.is_some()
    );
    let config = load_config(cli.config.as_deref(), cli.root.as_deref())?;
    let ledger = Arc::new(Ledger::from_config(&config));

    match cli.command {
        Command::List { domain, descending } => {
            let order = if descending {
                ListOrder::Descending
            } else {
                ledger.list_order()
            };
            let summaries = ledger
                .enumerate(domain, order)
                .with_context(|| format!("failed to list {domain} searches"))?;
            print_json(&summaries)?;
        }
        Command::Show { domain, id } => {
            let record = ledger
                .retrieve(domain, &id)
                .with_context(|| format!("failed to load {domain} search {id}"))?;
            print_json(&record)?;
        }
        Command::Filter {
            domain,
            id,
            predicates,
        } => {
            let predicates = predicates
                .iter()
                .map(|raw| {
                    serde_json::from_str::<Predicate>(raw)
                        .with_context(|| format!("invalid predicate JSON: {raw}"))
                })
                .collect::<anyhow::Result<Vec<_>>>()?;
            let view = ledger
                .derive_all(domain, &id, &predicates)
                .with_context(|| format!("failed to filter {domain} search {id}"))?;
            print_json(&view)?;
        }
        Command::Import {
            domain,
            params,
            response,
        } => {
            let params = RequestParams::from_value(parse_json("--params", &params)?)
                .context("invalid --params")?;
            let gateway = ReplayGateway::new(domain, &response);
            let outcome = ledger
                .record_with(&gateway, params)
                .await
                .with_context(|| format!("failed to import {}", response.display()))?;
            print_json(&outcome)?;
        }
        Command::Resource { uri } => {
            let (domain, _) = parse_resource_uri(&uri)?;
            let server = domain_server(&config, domain, ledger, None);
            let markdown = server
                .read_resource(&uri)
                .with_context(|| format!("failed to read {uri}"))?;
            print!("{markdown}");
        }
        Command::Tools { domain } => {
            let server = domain_server(&config, domain, ledger, None);
            print_json(&server.tools())?;
        }
        Command::Call {
            domain,
            tool,
            args,
            response,
        } => {
            let args = match args.as_deref() {
                Some(raw) => parse_json("--args", raw)?,
                None => Value::Null,
            };
            let gateway = response.map(|path| {
                Arc::new(ReplayGateway::new(domain, path)) as Arc<dyn VendorGateway>
            });
            let server = domain_server(&config, domain, ledger, gateway);
            let output = server
                .call_tool(&tool, args)
                .await
                .with_context(|| format!("{tool} failed"))?;
            print_json(&output)?;
        }
    }
    Ok(())
}

/// Discovered config layers, then `--config`, then `--root`.
fn load_config(path: Option<&Path>, root: Option<&Path>) -> anyhow::Result<WaypointConfig> {
    let cwd = std::env::current_dir().context("failed to resolve current directory")?;
    let mut options = LayeredConfigOptions::new(&cwd);
    if let Some(path) = path {
        options = options.with_runtime_path(path);
    }
    let mut config = WaypointConfig::load_layered_with_options(options)
        .context("failed to load waypoint config")?
        .config;
    if let Some(root) = root {
        config.storage.root = root.display().to_string();
    }
    config.validate().context("invalid waypoint config")?;
    debug!(
        "effective storage root (root={})",
        config.storage.root_path().display()
    );
    Ok(config)
}

fn parse_json(flag: &str, raw: &str) -> anyhow::Result<Value> {
    let value: Value =
        serde_json::from_str(raw).with_context(|| format!("{flag} is not valid JSON"))?;
    if !value.is_object() {
        bail!("{flag} must be a JSON object");
    }
    Ok(value)
}

fn print_json(value: &impl serde::Serialize) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value).context("failed to encode output")?;
    println!("{rendered}");
    Ok(())
}

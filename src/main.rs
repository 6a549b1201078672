//! AGV Monitor Web CLI
//!
//! - `serve` runs the production SPA host
//! - `routes`, `resolve` and `navigate` inspect the route table and page units
//! - `init-config` writes a default configuration file

use agv_monitor_web::{
    config::{generate_default_config, Config},
    logging,
    server::{self, HostState},
    ManifestPageLoader, NavTarget, NavigationOutcome, RenderState, Resolution, RouteTable, Shell,
    ShellConfig,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "agv-monitor-web")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "AGV Monitor dashboard host and route tools")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file (default: search standard locations)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table", global = true)]
    pub format: String,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Serve the built dashboard
    Serve {
        /// Port to listen on
        #[arg(short, long)]
        port: Option<u16>,
        /// Built front-end directory
        #[arg(long)]
        dist: Option<PathBuf>,
    },

    /// List the route table
    Routes,

    /// Resolve a browser path to a route
    Resolve {
        /// Path, optionally with query and fragment
        path: String,
    },

    /// Navigate to a named route and load its page unit
    Navigate {
        /// Route name
        name: String,
        /// Route parameters in key=value format
        #[arg(short = 'p', long = "param")]
        params: Vec<String>,
        /// Built front-end directory
        #[arg(long)]
        dist: Option<PathBuf>,
    },

    /// Generate default config file
    InitConfig {
        /// Output path (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    logging::init(&config.logging)?;

    let table = RouteTable::canonical()?.with_base(&config.app.base)?;

    match cli.command {
        Commands::Serve { port, dist } => {
            let mut host = config.host.clone();
            if let Some(port) = port {
                host.port = port;
            }
            if let Some(dist) = dist {
                host.dist_dir = dist;
            }

            tracing::info!("AGV Monitor web host v{}", env!("CARGO_PKG_VERSION"));
            let state = HostState::new(Arc::new(table), &host.dist_dir, &config.app.mount_id);
            server::run(state, &host).await?;
        }

        Commands::Routes => {
            if cli.format == "json" {
                let routes: Vec<_> = table
                    .entries()
                    .iter()
                    .map(|e| {
                        serde_json::json!({
                            "name": e.name(),
                            "path": e.path(),
                            "page": e.page(),
                        })
                    })
                    .collect();
                let doc = serde_json::json!({
                    "version": table.version(),
                    "base": table.base(),
                    "routes": routes,
                    "fallback": table.fallback(),
                });
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                println!("Route table v{} (base {})", table.version(), table.base());
                println!();
                println!("{:<20} {:<30} PAGE", "NAME", "PATH");
                println!("{}", "-".repeat(80));
                for entry in table.entries() {
                    println!("{:<20} {:<30} {}", entry.name(), entry.path(), entry.page());
                }
                if let Some(fallback) = table.fallback() {
                    println!();
                    println!("Fallback: {}", fallback);
                }
            }
        }

        Commands::Resolve { path } => match table.resolve(&path) {
            Resolution::Matched(found) => {
                if cli.format == "json" {
                    println!("{}", serde_json::to_string_pretty(&found)?);
                } else {
                    println!("Route:  {}", found.name);
                    println!("Pattern: {}", found.pattern);
                    println!("Page:   {}", found.page);
                    for (key, value) in &found.params {
                        println!("  {} = {}", key, value);
                    }
                    if !found.query.is_empty() {
                        println!("Query:");
                        for (key, value) in &found.query {
                            println!("  {} = {}", key, value);
                        }
                    }
                    if let Some(hash) = &found.hash {
                        println!("Hash:   #{}", hash);
                    }
                }
            }
            Resolution::NotFound { path } => {
                let fallback = table
                    .fallback()
                    .map(|p| p.to_string())
                    .unwrap_or_else(|| "none".to_string());
                eprintln!("No route for {} (fallback page: {})", path, fallback);
                std::process::exit(1);
            }
        },

        Commands::Navigate { name, params, dist } => {
            let mut target = NavTarget::name(&name);
            for param in params {
                let (key, value) = param
                    .split_once('=')
                    .with_context(|| format!("Invalid parameter {:?}, expected key=value", param))?;
                target = target.param(key, value);
            }

            let dist = dist.unwrap_or_else(|| config.host.dist_dir.clone());
            let loader = Arc::new(ManifestPageLoader::new(dist));
            let shell = Shell::mount(
                ShellConfig::from_app(&config.app),
                RouteTable::canonical()?,
                loader,
            )?;

            let outcome = shell.navigator().navigate(target).await?;
            match (&outcome, shell.navigator().state()) {
                (
                    NavigationOutcome::Rendered { cached, .. },
                    RenderState::Rendered { route, page, .. },
                ) => {
                    let path = shell.navigator().current_path().unwrap_or_default();
                    println!("Path:  {}", path);
                    println!("Route: {}", route.name);
                    println!(
                        "Page:  {} -> {} ({} bytes{})",
                        page.id,
                        page.asset,
                        page.size(),
                        if *cached { ", cached" } else { "" }
                    );
                }
                (NavigationOutcome::Failed(error), _) => {
                    eprintln!("Page failed to load: {}", error);
                    std::process::exit(1);
                }
                (other, _) => println!("{:?}", other),
            }
        }

        Commands::InitConfig { output } => {
            let content = generate_default_config();

            match output {
                Some(path) => {
                    if let Some(parent) = path.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::write(&path, &content)?;
                    println!("Config written to {:?}", path);
                }
                None => {
                    print!("{}", content);
                }
            }
        }
    }

    Ok(())
}

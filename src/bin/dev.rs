//! AGV Monitor Development Server
//!
//! Run with: cargo run --bin agv-monitor-dev
//!
//! Serves the dashboard on `localhost:3000` and proxies `/api` and `/ws` to
//! the backend on `localhost:8000`.
//!
//! # Configuration
//!
//! Environment variables:
//! - `AGV_WEB_DEV_PORT`: Port to listen on (default: 3000)
//! - `AGV_WEB_BACKEND`: Backend origin for every proxy rule
//! - `AGV_WEB_DIST_DIR`: Built front-end directory (default: web/dist)
//! - `RUST_LOG`: Log filter (default: agv_monitor_web=info)

use agv_monitor_web::{
    config::Config,
    dev::{self, DevState},
    logging, HostState, RouteTable,
};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "agv-monitor-dev")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Development server for the AGV Monitor dashboard")]
struct Args {
    /// Config file (default: search standard locations)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Open the browser on start
    #[arg(long, overrides_with = "no_open")]
    open: bool,

    /// Do not open the browser
    #[arg(long, overrides_with = "open")]
    no_open: bool,

    /// Backend origin, e.g. http://192.168.1.20:8000
    #[arg(long)]
    backend: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => Config::load_with_env(path)?,
        None => Config::load_default(),
    };
    logging::init(&config.logging)?;

    if let Some(port) = args.port {
        config.dev.port = port;
    }
    if let Some(backend) = &args.backend {
        config.dev.retarget(backend);
    }
    if args.open {
        config.dev.open = true;
    }
    if args.no_open {
        config.dev.open = false;
    }

    tracing::info!("AGV Monitor dev server v{}", env!("CARGO_PKG_VERSION"));

    let table = RouteTable::canonical()?.with_base(&config.app.base)?;
    let host = HostState::new(Arc::new(table), &config.host.dist_dir, &config.app.mount_id);
    let state = DevState::new(host, &config.dev)?;

    dev::run(state, &config.dev).await?;
    Ok(())
}

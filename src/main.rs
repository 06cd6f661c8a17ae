use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{info, warn};

use pyintel::config::ServerConfig;
use pyintel::lsp::knowledge::KnowledgeBase;
use pyintel::lsp::service::CodeIntel;
use pyintel::server;
use pyintel::treesitter::PythonEngine;

#[derive(Parser)]
#[command(name = "pyintel", about = "Python completion, hover and definitions over HTTP.")]
struct Cli {
    /// Config file (defaults to .pyintel/config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// SDK knowledge table replacing the built-in one
    #[arg(long)]
    knowledge_base: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = ServerConfig::load(cli.config.as_deref())?;
    let mut config = loaded.config;
    config.apply_env()?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }
    if let Some(kb) = cli.knowledge_base {
        config.knowledge_base = Some(kb);
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(config.log_filter.parse()?),
        )
        .init();

    if let Some(e) = loaded.ignored {
        warn!(error = %e, "ignoring project config");
    }

    let kb = match &config.knowledge_base {
        Some(path) => KnowledgeBase::load(path)
            .with_context(|| format!("loading knowledge table {}", path.display()))?,
        None => KnowledgeBase::builtin().context("loading built-in knowledge table")?,
    };
    info!(
        sdks = kb.sdks().len(),
        namespaces = kb.namespace_count(),
        version = kb.version(),
        "knowledge table loaded"
    );

    let intel = CodeIntel::new(
        Arc::new(PythonEngine::new()),
        Arc::new(kb),
        config.buffer_uri.clone(),
    )?;

    info!("pyintel starting on {}", config.bind_addr());
    server::serve(&config, Arc::new(intel)).await?;
    Ok(())
}

//! Oryx bot gateway binary: WhatsApp webhook intake, dry-run chat endpoint,
//! and pipeline wiring.

mod completion;
mod config;
mod server;
mod whatsapp;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;

use oryx_agent::{Orchestrator, OrchestratorConfig, ResponseCache, Tone};
use oryx_core::{AuditLog, InteractionLog};
use oryx_knowledge::{load_knowledge_docs, KnowledgeIndex};
use oryx_session::SessionStore;

use crate::completion::DeferredGroqClient;
use crate::config::GatewayConfig;
use crate::server::{build_router, AppState};
use crate::whatsapp::WhatsAppClient;

#[derive(Debug, Parser)]
#[command(name = "oryx-gateway", about = "WhatsApp support bot gateway")]
struct Args {
    /// Directory for session state and interaction/audit logs.
    #[arg(long, env = "DATA_DIR", default_value = "data")]
    data_dir: PathBuf,

    /// Directory of FAQ documents indexed for retrieval.
    #[arg(long, env = "KNOWLEDGE_DIR", default_value = "knowledge/faq")]
    knowledge_dir: PathBuf,
}

fn init_tracing() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();
    let config = GatewayConfig::from_env();

    std::fs::create_dir_all(&args.data_dir)
        .with_context(|| format!("failed to create {}", args.data_dir.display()))?;

    let index = match load_knowledge_docs(&args.knowledge_dir, config.chunk_size, config.chunk_overlap)
    {
        Ok(docs) => {
            info!(chunks = docs.len(), "knowledge index loaded");
            KnowledgeIndex::build(docs)
        }
        Err(error) => {
            warn!(%error, "failed to load knowledge, continuing without context");
            KnowledgeIndex::build(Vec::new())
        }
    };

    let transport = Arc::new(WhatsAppClient::new(
        config.whatsapp_access_token.clone(),
        config.whatsapp_phone_number_id.clone(),
    ));
    let orchestrator = Orchestrator::new(OrchestratorConfig {
        sessions: SessionStore::new(&args.data_dir),
        cache: Arc::new(ResponseCache::new()),
        knowledge: Arc::new(index),
        completion: Arc::new(DeferredGroqClient::new(config.groq_config())),
        transport: transport.clone(),
        interactions: InteractionLog::new(args.data_dir.join("interactions.csv")),
        audit: AuditLog::new(args.data_dir.join("audit.jsonl")),
        tone: Tone::parse(&config.agent_tone),
        retrieval_top_k: config.retrieval_top_k,
    });

    let state = Arc::new(AppState {
        orchestrator,
        transport,
        verify_token: config.whatsapp_verify_token.clone(),
    });

    let bind_addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind gateway on {bind_addr}"))?;
    info!(addr = %bind_addr, "gateway listening");

    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("gateway server exited unexpectedly")?;
    Ok(())
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use caption_server::{
    api::start_server,
    cli::ServerArgs,
    config::ServerConfig,
    vision::CaptionModelManager,
};
use clap::Parser;
use std::{env, sync::Arc};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before clap reads environment fallbacks
    dotenv::dotenv().ok();

    if env::var("RUST_LOG").is_err() {
        env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt::init();

    let config = ServerConfig::from(ServerArgs::parse());
    config.validate()?;

    println!("🚀 Starting caption server...");
    println!("📦 BUILD VERSION: {}", caption_server::version::VERSION);
    println!();

    // A failed load is logged inside the manager; the server still starts
    let manager = Arc::new(CaptionModelManager::new(config.model_config()).await);
    if manager.has_model() {
        println!("✅ Caption model ready");
    } else {
        println!("⚠️  No caption model loaded");
        println!("   POST /caption will fail (mode: {})", config.error_mode);
    }

    start_server(&config, manager).await
}

// Copyright (c) 2025 Fabstir
// SPDX-License-Identifier: BUSL-1.1
use anyhow::Result;
use caption_server::{cli::CaptionCliArgs, client::CaptionClient};
use clap::Parser;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "warn");
    }
    tracing_subscriber::fmt::init();

    let args = CaptionCliArgs::parse();
    let client = CaptionClient::new(&args.url);

    let response = match client.caption_file(&args.image).await {
        Ok(response) => response,
        Err(e) => {
            eprintln!("❌ Error: {}", e);
            std::process::exit(1);
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&response)?);
        return Ok(());
    }

    match (&response.caption_conditional, &response.caption_unconditional) {
        (Some(conditional), Some(unconditional)) => {
            println!("Conditional:   {}", conditional);
            println!("Unconditional: {}", unconditional);
            Ok(())
        }
        _ => {
            eprintln!("❌ Server could not caption {}", args.image.display());
            std::process::exit(1);
        }
    }
}

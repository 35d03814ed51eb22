use std::{fs, path::PathBuf};

use clap::Parser;
use storefront_api::openapi::ApiDocV1;
use utoipa::OpenApi;

#[derive(Debug, Parser)]
#[command(name = "openapi-export", about = "Write the OpenAPI document to disk")]
struct Cli {
    /// Output file
    #[arg(long, default_value = "openapi/storefront-api.v1.json")]
    output: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let json = serde_json::to_string_pretty(&ApiDocV1::openapi())?;

    if let Some(dir) = cli.output.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    fs::write(&cli.output, json)?;

    println!("OpenAPI document written to {}", cli.output.display());
    Ok(())
}

//! `tablesnap extract`: upload one image to the relay and print the table.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tablesnap_core::{render, resolve_mime_type, OutputFormat, RelayClient};

pub struct ExtractArgs {
    pub image: PathBuf,
    pub server: String,
    pub format: OutputFormat,
    pub output: Option<PathBuf>,
    pub mime_type: Option<String>,
    pub timeout_secs: Option<u64>,
}

pub async fn run(args: ExtractArgs) -> Result<()> {
    let data = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("Failed to read {}", args.image.display()))?;

    let mime_type = args
        .mime_type
        .unwrap_or_else(|| resolve_mime_type(None, &data));

    tracing::debug!(
        image = %args.image.display(),
        mime_type = %mime_type,
        bytes = data.len(),
        "Uploading image"
    );

    let client = RelayClient::builder()
        .base_url(&args.server)
        .timeout(args.timeout_secs.map(Duration::from_secs))
        .build();

    let table = client
        .extract(data, &mime_type)
        .await
        .map_err(|e| anyhow::anyhow!("Extraction failed: {}", e))?;

    let rendered = render(&table, args.format)?;
    write_output(&rendered, args.output.as_deref()).await
}

async fn write_output(rendered: &str, output: Option<&Path>) -> Result<()> {
    match output {
        Some(path) => {
            let mut contents = rendered.to_string();
            if !contents.is_empty() && !contents.ends_with('\n') {
                contents.push('\n');
            }
            tokio::fs::write(path, contents)
                .await
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!("Wrote {}", path.display());
        }
        None => {
            if rendered.ends_with('\n') {
                print!("{}", rendered);
            } else {
                println!("{}", rendered);
            }
        }
    }
    Ok(())
}

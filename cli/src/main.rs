mod extract;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tablesnap_core::client::DEFAULT_SERVER_URL;
use tablesnap_core::OutputFormat;

#[derive(Parser)]
#[command(name = "tablesnap")]
#[command(about = "Turn a photo of a table into spreadsheet-ready rows", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Upload an image of a table and print the extracted rows
    Extract {
        /// Image file containing a table
        image: PathBuf,
        /// Server URL (default: http://localhost:3000)
        #[arg(long, env = "TABLESNAP_SERVER", default_value = DEFAULT_SERVER_URL)]
        server: String,
        /// Output format: text, tsv or json
        #[arg(long, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
        /// Write the output to a file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,
        /// MIME type to upload with (default: detected from the file contents)
        #[arg(long)]
        mime_type: Option<String>,
        /// Give up after this many seconds (default: wait indefinitely)
        #[arg(long)]
        timeout_secs: Option<u64>,
    },
}

fn init_logging() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    match cli.command {
        Commands::Extract {
            image,
            server,
            format,
            output,
            mime_type,
            timeout_secs,
        } => {
            extract::run(extract::ExtractArgs {
                image,
                server,
                format,
                output,
                mime_type,
                timeout_secs,
            })
            .await?;
        }
    }

    Ok(())
}

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

use org_from_nnex::convert_archive;

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Note archive to convert.
    #[arg(long)]
    input: PathBuf,

    /// Output directory (defaults to a sibling of the archive named after it).
    #[arg(long)]
    out_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();

    let args = Args::parse();
    println!("input: {}", args.input.display());

    let summary = convert_archive(&args.input, args.out_dir.as_deref())?;
    info!(notes = summary.notes, attachments = summary.attachments, "done");

    println!(
        "\nThere are {} notes and {} attachments created",
        summary.notes, summary.attachments
    );
    Ok(())
}

use std::path::PathBuf;

use bytes::Bytes;
use clap::Parser;
use serde_json::{json, Value};

use caching_proxy::cache::snapshot;

#[derive(Parser)]
#[command(name = "cache-inspect")]
#[command(about = "Print the entries of a caching-proxy cache snapshot", long_about = None)]
struct Cli {
    /// Snapshot file (usually <state_dir>/cache.bin)
    path: PathBuf,

    /// Emit JSON instead of a table
    #[arg(long)]
    json: bool,

    /// Only show keys containing this substring
    #[arg(short, long)]
    filter: Option<String>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let raw = std::fs::read(&cli.path)?;
    let entries = snapshot::decode(Bytes::from(raw))?;

    let mut keys: Vec<_> = entries
        .keys()
        .filter(|k| cli.filter.as_deref().map_or(true, |f| k.as_str().contains(f)))
        .collect();
    keys.sort();

    if cli.json {
        let rows: Vec<Value> = keys
            .iter()
            .map(|key| {
                let entry = &entries[*key];
                json!({
                    "key": key.as_str(),
                    "etag": entry.etag,
                    "status": entry.response.status.as_u16(),
                    "headers": entry.response.headers.len(),
                    "body_bytes": entry.response.body.len(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{} entries in {}", keys.len(), cli.path.display());
    for key in keys {
        let entry = &entries[key];
        println!(
            "{}\t{}\t{}\t{} headers\t{} bytes",
            key,
            entry.response.status.as_u16(),
            entry.etag,
            entry.response.headers.len(),
            entry.response.body.len()
        );
    }
    Ok(())
}

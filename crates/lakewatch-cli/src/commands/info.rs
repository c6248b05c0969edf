use std::path::PathBuf;

use anyhow::Result;
use clap::Args;
use lakewatch_core::io::catalog::CatalogStore;

#[derive(Args)]
pub struct InfoArgs {
    /// Catalog directory or catalog.json file
    pub catalog: PathBuf,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let store = CatalogStore::open(&args.catalog)?;
    let entries = store.entries();

    println!("Catalog:     {}", args.catalog.display());
    println!("Scenes:      {}", entries.len());
    if let (Some(first), Some(last)) = (
        entries.iter().map(|e| e.acquired).min(),
        entries.iter().map(|e| e.acquired).max(),
    ) {
        println!("Span:        {} .. {}", first.date_naive(), last.date_naive());
    }
    println!();

    for entry in entries {
        let bands: Vec<&str> = entry.bands.keys().map(String::as_str).collect();
        let properties: Vec<String> = entry
            .properties
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect();
        println!(
            "  {:<28} {}  [{}]  {}",
            entry.id,
            entry.acquired.format("%Y-%m-%d %H:%M"),
            bands.join(","),
            properties.join(" ")
        );
    }

    Ok(())
}

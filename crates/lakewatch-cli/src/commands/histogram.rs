use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use lakewatch_core::analysis::reclassify::{reclassify, water_table, ReclassTable};
use lakewatch_core::analysis::zonal::{zonal_histogram, Zone, ZoneDef};
use lakewatch_core::io::geotiff::read_geotiff;

#[derive(Args)]
pub struct HistogramArgs {
    /// Composite GeoTIFF (single band)
    pub file: PathBuf,

    /// Zones as a JSON array of {"name", "exterior"} objects
    #[arg(long)]
    pub zones: PathBuf,

    /// Reclassification table as JSON ({"rules": [...], "nodata_for_missing": bool});
    /// defaults to the NDWI water table
    #[arg(long)]
    pub table: Option<PathBuf>,

    /// Print counts as JSON
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: &HistogramArgs) -> Result<()> {
    let (raster, grid) = read_geotiff(&args.file)
        .with_context(|| format!("Failed to read {}", args.file.display()))?;

    let zone_defs: Vec<ZoneDef> = serde_json::from_str(
        &std::fs::read_to_string(&args.zones)
            .with_context(|| format!("Failed to read zones {}", args.zones.display()))?,
    )
    .context("Invalid zones file")?;
    let zones: Vec<Zone> = zone_defs.iter().map(Zone::from).collect();

    let table: ReclassTable = match args.table {
        Some(ref path) => serde_json::from_str(
            &std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read table {}", path.display()))?,
        )
        .context("Invalid reclassification table")?,
        None => water_table(),
    };

    let classes = reclassify(&raster, &table);
    let histograms = zonal_histogram(&classes, &grid, &zones)?;

    let column = args
        .file
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    if args.json {
        let rows: Vec<serde_json::Value> = histograms
            .iter()
            .map(|h| {
                let counts: serde_json::Map<String, serde_json::Value> = h
                    .counts
                    .iter()
                    .map(|(class, n)| (format!("{column}_{class}"), (*n).into()))
                    .collect();
                serde_json::json!({
                    "zone": h.zone,
                    "counts": counts,
                    "nodata": h.nodata,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!("{column}");
    for h in &histograms {
        let counts: Vec<String> = h
            .counts
            .iter()
            .map(|(class, n)| format!("{class}:{n}"))
            .collect();
        println!(
            "  {:<20} {}  nodata:{}  total:{}",
            h.zone,
            counts.join("  "),
            h.nodata,
            h.total()
        );
    }
    Ok(())
}

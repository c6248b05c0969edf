use anyhow::Result;
use chrono::NaiveDate;
use clap::Args;
use lakewatch_core::naming::composite_name;
use lakewatch_core::window::generate_windows;

#[derive(Args)]
pub struct WindowsArgs {
    /// First day of the first window (YYYY-MM-DD)
    #[arg(long)]
    pub start: NaiveDate,

    /// Months to advance; the run covers count + 1 windows
    #[arg(long, default_value = "11")]
    pub count: i64,

    /// Area prefix of the composite names
    #[arg(long, default_value = "MDAS_NDWI_")]
    pub area: String,

    /// Sensor suffix of the composite names
    #[arg(long, default_value = "_L5")]
    pub sensor: String,
}

pub fn run(args: &WindowsArgs) -> Result<()> {
    let windows = generate_windows(args.start, args.count)?;
    for (i, window) in windows.iter().enumerate() {
        println!(
            "{:>3}  {}  {}",
            i,
            window,
            composite_name(&args.area, window, &args.sensor)
        );
    }
    Ok(())
}

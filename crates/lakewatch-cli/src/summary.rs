use std::path::Path;

use console::Style;
use lakewatch_core::export::ExportReport;
use lakewatch_core::pipeline::config::PipelineConfig;
use lakewatch_core::pipeline::RunReport;

struct Styles {
    title: Style,
    header: Style,
    label: Style,
    value: Style,
    method: Style,
    warning: Style,
    error: Style,
    path: Style,
}

impl Styles {
    fn new() -> Self {
        Self {
            title: Style::new().cyan().bold(),
            header: Style::new().cyan().bold(),
            label: Style::new().dim(),
            value: Style::new().bold().white(),
            method: Style::new().green(),
            warning: Style::new().yellow(),
            error: Style::new().red().bold(),
            path: Style::new().underlined(),
        }
    }
}

pub fn print_pipeline_summary(config: &PipelineConfig, catalog: &Path, output: &Path) {
    let s = Styles::new();

    println!();
    println!("  {}", s.title.apply_to("Lakewatch Composites"));
    println!("  {}", s.title.apply_to("\u{2550}".repeat(20)));
    println!();

    println!(
        "  {:<14}{}",
        s.label.apply_to("Catalog"),
        s.path.apply_to(catalog.display())
    );
    println!(
        "  {:<14}{}",
        s.label.apply_to("Output"),
        s.path.apply_to(output.join(&config.export.folder).display())
    );
    println!();

    println!("  {}", s.header.apply_to("Series"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("Start"),
        s.value.apply_to(config.start)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Windows"),
        s.value.apply_to(config.window_count.saturating_add(1))
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Sensor"),
        s.method.apply_to(&config.sensor)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Mode"),
        s.method.apply_to(&config.mode)
    );
    println!(
        "    {:<12}{} < {}%",
        s.label.apply_to("Clouds"),
        s.value.apply_to(config.cloud_attribute()),
        s.value.apply_to(config.cloud_threshold)
    );
    println!();

    println!("  {}", s.header.apply_to("Export"));
    println!(
        "    {:<12}{}",
        s.label.apply_to("CRS"),
        s.value.apply_to(&config.export.crs)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Scale"),
        s.value.apply_to(config.export.scale)
    );
    println!(
        "    {:<12}{}",
        s.label.apply_to("Pixels"),
        s.value.apply_to(config.export.pixel_type)
    );
    println!();
}

pub fn print_run_report(report: &RunReport, exports: &ExportReport) {
    let s = Styles::new();

    println!();
    println!("  {}", s.header.apply_to("Composites"));
    for composite in &report.series {
        let status = if composite.is_empty() {
            s.warning.apply_to("empty".to_string())
        } else {
            s.method.apply_to(format!("{} px", composite.valid_pixels()))
        };
        println!(
            "    {:<32}{:>3} scenes  {}",
            s.value.apply_to(&composite.name),
            composite.scene_count,
            status
        );
    }
    for failure in &report.failures {
        println!(
            "    {:<32}{}",
            s.error.apply_to(&failure.name),
            s.error.apply_to(&failure.error)
        );
    }
    println!();

    println!("  {}", s.header.apply_to("Exports"));
    for receipt in &exports.receipts {
        println!("    {}", s.path.apply_to(receipt.location.display()));
    }
    for failure in &exports.failures {
        println!(
            "    {:<32}{}",
            s.error.apply_to(&failure.name),
            s.error.apply_to(&failure.reason)
        );
    }
    println!();
}

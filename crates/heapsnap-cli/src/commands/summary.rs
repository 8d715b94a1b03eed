//! Per-type totals of one capture.

use std::path::Path;

use anyhow::Result;
use heapsnap_core::{SummaryReport, format_size};
use owo_colors::OwoColorize;

use super::Context;
use crate::output::{print_output, truncate};

pub fn run(ctx: &Context, capture: &Path, top: usize) -> Result<()> {
    let snapshot = ctx.load_snapshot(capture)?;
    let mut report = SummaryReport::new(&snapshot);
    report.types.truncate(top);

    print_output(&report, ctx.json, |report| {
        println!("{}", capture.display().bold());
        println!(
            "  {} objects, {} in {} types",
            report.object_count,
            format_size(report.total_bytes),
            report.type_count
        );
        println!(
            "  {} sections, {} captured",
            report.section_count,
            format_size(report.section_bytes)
        );
        if report.unresolved_count > 0 {
            println!(
                "  {}",
                format!("{} unresolved addresses", report.unresolved_count).yellow()
            );
        }
        println!();

        println!(
            "{:>10}  {:>12}  {:<48}  {}",
            "Count".bold(),
            "Bytes".bold(),
            "Type".bold(),
            "Assembly".bold()
        );
        for row in &report.types {
            println!(
                "{:>10}  {:>12}  {:<48}  {}",
                row.count,
                format_size(row.total_size),
                truncate(&row.type_name, 48),
                row.assembly.dimmed()
            );
        }
    })
}

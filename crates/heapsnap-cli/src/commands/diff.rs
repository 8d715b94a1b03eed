//! Compare two captures.

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use heapsnap_core::{AssemblyFilter, DiffReport, TypeFilter, compare, format_size};
use owo_colors::OwoColorize;
use tracing::{info, warn};

use super::Context;
use crate::output::{print_output, truncate};

pub struct DiffOptions {
    pub include: Vec<String>,
    pub exclude: Vec<String>,
    pub output: Option<PathBuf>,
    pub limit: usize,
}

pub fn run(ctx: &Context, before: &Path, after: &Path, options: DiffOptions) -> Result<()> {
    let old = ctx.load_snapshot(before)?;
    let new = ctx.load_snapshot(after)?;

    if old.layout().pointer_size() != new.layout().pointer_size() {
        warn!(
            "Captures use different pointer sizes ({} vs {}), addresses will not line up",
            old.layout().pointer_size(),
            new.layout().pointer_size()
        );
    }

    let filter = build_filter(&ctx.config.exclude_assemblies, &options);
    let filter_ref: Option<&dyn TypeFilter> = if filter.is_empty() {
        None
    } else {
        Some(&filter)
    };
    let diff = compare(&old, &new, filter_ref);
    let report = DiffReport::new(&diff);

    if let Some(path) = &options.output {
        report
            .save(path)
            .with_context(|| format!("failed to write diff report: {}", path.display()))?;
        info!("Diff report written to {}", path.display());
    }

    print_output(&report, ctx.json, |report| display(report, options.limit))
}

/// Config exclusions first, then the command-line lists
fn build_filter(config_excludes: &[String], options: &DiffOptions) -> AssemblyFilter {
    let mut filter = AssemblyFilter::excluding(config_excludes.iter().cloned());
    for assembly in &options.include {
        filter = filter.include(assembly.as_str());
    }
    for assembly in &options.exclude {
        filter = filter.exclude(assembly.as_str());
    }
    filter
}

fn display(report: &DiffReport, limit: usize) {
    println!(
        "{}  {}",
        format!(
            "+{} objects ({})",
            report.added_count,
            format_size(report.added_bytes)
        )
        .green(),
        format!(
            "-{} objects ({})",
            report.removed_count,
            format_size(report.removed_bytes)
        )
        .red()
    );

    if report.deltas.is_empty() {
        println!("No per-type changes");
        return;
    }

    println!();
    println!("{:>8}  {}", "Delta".bold(), "Type".bold());
    for delta in &report.deltas {
        let count = format!("{:+}", delta.delta);
        if delta.delta > 0 {
            println!("{:>8}  {}", count.green(), delta.type_name);
        } else {
            println!("{:>8}  {}", count.red(), delta.type_name);
        }
    }

    for (title, rows) in [("Added", &report.added), ("Removed", &report.removed)] {
        if rows.is_empty() || limit == 0 {
            continue;
        }
        println!();
        println!("{} (showing {} of {})", title.bold(), rows.len().min(limit), rows.len());
        for row in rows.iter().take(limit) {
            let value = row
                .value
                .as_deref()
                .map(|v| format!(" {:?}", truncate(v, 40)))
                .unwrap_or_default();
            println!(
                "  {}  {:<40} {:>10}{}",
                row.address.cyan(),
                truncate(&row.type_name, 40),
                format_size(row.size),
                value.dimmed()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(include: &[&str], exclude: &[&str]) -> DiffOptions {
        DiffOptions {
            include: include.iter().map(|s| s.to_string()).collect(),
            exclude: exclude.iter().map(|s| s.to_string()).collect(),
            output: None,
            limit: 10,
        }
    }

    #[test]
    fn test_build_filter_empty() {
        assert!(build_filter(&[], &options(&[], &[])).is_empty());
    }

    #[test]
    fn test_build_filter_merges_config_and_args() {
        let config = vec!["mscorlib".to_string()];
        let filter = build_filter(&config, &options(&["Game"], &["UnityEngine"]));
        let expected = AssemblyFilter::excluding(["mscorlib"])
            .include("Game")
            .exclude("UnityEngine");
        assert_eq!(filter, expected);
    }
}

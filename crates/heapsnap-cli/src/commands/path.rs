//! Retention path from an object to its root.

use std::path::Path;

use anyhow::{Result, bail};
use heapsnap_core::{ReferenceFrom, format_address};
use owo_colors::OwoColorize;
use serde::Serialize;

use super::Context;
use super::hex_utils::parse_object_address;
use super::inspect::describe_edge;
use crate::output::print_output;

#[derive(Debug, Serialize)]
struct PathRow {
    address: String,
    type_name: String,
    held_by: ReferenceFrom,
}

pub fn run(ctx: &Context, capture: &Path, address: &str) -> Result<()> {
    let snapshot = ctx.load_snapshot(capture)?;
    let address = parse_object_address(address, snapshot.layout())?;

    if !snapshot.contains(address) {
        bail!("No object at {}", format_address(address));
    }
    let Some(steps) = snapshot.path_to_root(address) else {
        bail!("{} is not reachable from any root", format_address(address));
    };

    let rows: Vec<PathRow> = steps
        .into_iter()
        .map(|step| PathRow {
            address: format_address(step.address),
            type_name: snapshot
                .object(step.address)
                .map(|object| snapshot.type_name(object).to_string())
                .unwrap_or_default(),
            held_by: step.edge,
        })
        .collect();

    print_output(&rows, ctx.json, |rows| {
        for (depth, row) in rows.iter().enumerate() {
            println!(
                "{:indent$}{} {}",
                "",
                row.address.cyan(),
                row.type_name.bold(),
                indent = depth * 2
            );
            println!(
                "{:indent$}  <- {}",
                "",
                describe_edge(&row.held_by).dimmed(),
                indent = depth * 2
            );
        }
    })
}

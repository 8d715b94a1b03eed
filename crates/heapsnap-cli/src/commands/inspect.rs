//! Show one object and its edges.

use std::path::Path;

use anyhow::{Result, bail};
use heapsnap_core::{ObjectInfo, ReferenceFrom, format_address, format_size};
use owo_colors::OwoColorize;

use super::Context;
use super::hex_utils::parse_object_address;
use crate::output::print_output;

pub fn run(ctx: &Context, capture: &Path, address: &str) -> Result<()> {
    let snapshot = ctx.load_snapshot(capture)?;
    let address = parse_object_address(address, snapshot.layout())?;

    let Some(info) = ObjectInfo::from_address(&snapshot, address) else {
        match snapshot.unresolved(address) {
            Some(reason) => bail!("{} is not an object: {}", format_address(address), reason),
            None => bail!("No object at {}", format_address(address)),
        }
    };

    print_output(&info, ctx.json, |info| {
        println!("{} {}", info.type_name.bold(), info.address.cyan());
        println!("  assembly: {}", info.assembly);
        println!("  size:     {}", format_size(info.size));
        if let Some(value) = &info.value {
            println!("  value:    {:?}", value);
        }

        println!();
        println!("{} ({})", "Referenced by".bold(), info.references_from.len());
        for edge in &info.references_from {
            println!("  {}", describe_edge(edge));
        }

        println!();
        println!("{} ({})", "References".bold(), info.references_to.len());
        for edge in &info.references_to {
            if edge.is_null() {
                println!("  {:<32} {}", edge.path, "null".dimmed());
            } else {
                println!("  {:<32} {}", edge.path, format_address(edge.address).cyan());
            }
        }
    })
}

pub(crate) fn describe_edge(edge: &ReferenceFrom) -> String {
    match edge {
        ReferenceFrom::GcRoot { index } => format!("GC handle #{}", index),
        ReferenceFrom::Static { path } => format!("static {}", path),
        ReferenceFrom::Object { address, path } => {
            format!("{}.{}", format_address(*address), path)
        }
    }
}

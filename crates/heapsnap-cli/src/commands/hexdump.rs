//! Hexdump command implementation.
//!
//! Displays captured bytes in traditional hexdump format. Only the section
//! list of the capture is decoded; no object graph is built.
//!
//! # Output Format
//!
//! ```text
//! 0x10000000: 00 00 00 08 00 00 00 00  00 00 00 00 00 00 00 00  |................|
//! ```

use std::path::Path;

use anyhow::{Context as _, Result, bail};
use heapsnap_core::{MemorySection, ReadMemory, SectionIndex, format_address, load_capture};

use super::hex_utils::parse_object_address;

const BYTES_PER_LINE: usize = 16;

/// Run the hexdump command
pub fn run(capture: &Path, address: &str, size: usize, ascii: bool) -> Result<()> {
    let capture = load_capture(capture)
        .with_context(|| format!("failed to load capture: {}", capture.display()))?;
    let layout = capture.layout.to_layout()?;
    let sections = SectionIndex::new(
        capture.sections.into_iter().map(MemorySection::from).collect(),
        &layout,
    )?;

    let address = parse_object_address(address, &layout)?;
    let Some(section) = sections.find(address) else {
        bail!("{} is not inside any captured section", format_address(address));
    };
    // Reads never cross a section boundary
    let available = usize::try_from(section.remaining(address)).unwrap_or(usize::MAX);
    let length = size.min(available);
    let (start, end) = (section.start(), section.end());
    let bytes = sections.read_bytes(address, length)?;

    println!(
        "Hexdump at {} ({} bytes, section [{}, {})):",
        format_address(address),
        length,
        format_address(start),
        format_address(end)
    );
    println!();

    for (i, chunk) in bytes.chunks(BYTES_PER_LINE).enumerate() {
        let line_address = address + (i * BYTES_PER_LINE) as u64;
        println!("{}", format_line(line_address, chunk, ascii));
    }

    Ok(())
}

fn format_line(address: u64, chunk: &[u8], ascii: bool) -> String {
    let mut line = format!("0x{:08X}: ", address);

    for j in 0..BYTES_PER_LINE {
        if j == 8 {
            line.push(' ');
        }
        match chunk.get(j) {
            Some(byte) => line.push_str(&format!("{:02X} ", byte)),
            None => line.push_str("   "),
        }
    }

    if ascii {
        line.push_str(" |");
        for byte in chunk {
            if (0x20..0x7F).contains(byte) {
                line.push(*byte as char);
            } else {
                line.push('.');
            }
        }
        for _ in chunk.len()..BYTES_PER_LINE {
            line.push(' ');
        }
        line.push('|');
    }

    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_full_line() {
        let chunk = b"Hello World\0\0\0\0\0";
        assert_eq!(
            format_line(0x1000_0000, chunk, true),
            "0x10000000: 48 65 6C 6C 6F 20 57 6F  72 6C 64 00 00 00 00 00  |Hello World.....|"
        );
    }

    #[test]
    fn test_format_partial_line_pads() {
        let line = format_line(0x20, &[0xAB, 0xCD], true);
        assert_eq!(
            line,
            format!(
                "0x00000020: AB CD {}|..{}|",
                " ".repeat(3 * 14 + 2),
                " ".repeat(14)
            )
        );
    }

    #[test]
    fn test_format_line_without_ascii() {
        let line = format_line(0, &[0x41; 16], false);
        assert!(!line.contains('|'));
        assert!(line.ends_with("41 "));
    }
}

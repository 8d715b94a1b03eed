//! Hex address parsing.

use anyhow::Result;
use heapsnap_core::VmLayout;

/// Parse a hex address string (with or without 0x prefix).
pub fn parse_hex_address(s: &str) -> Result<u64> {
    let s = s.trim();
    let s = s.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(s, 16).map_err(|e| anyhow::anyhow!("Invalid hex address: {}", e))
}

/// Parse an address typed by the user and narrow it to the capture's pointer width.
pub fn parse_object_address(s: &str, layout: &VmLayout) -> Result<u64> {
    Ok(layout.mask_address(parse_hex_address(s)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_address_with_prefix() {
        assert_eq!(parse_hex_address("0x1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("0X1000").unwrap(), 0x1000);
    }

    #[test]
    fn test_parse_hex_address_without_prefix() {
        assert_eq!(parse_hex_address("1000").unwrap(), 0x1000);
        assert_eq!(parse_hex_address("deadbeef").unwrap(), 0xDEADBEEF);
    }

    #[test]
    fn test_parse_hex_address_large() {
        assert_eq!(parse_hex_address(" 0x7FF6A0001000 ").unwrap(), 0x7FF6_A000_1000);
    }

    #[test]
    fn test_parse_hex_address_invalid() {
        assert!(parse_hex_address("GHIJK").is_err());
        assert!(parse_hex_address("0x").is_err());
        assert!(parse_hex_address("0x1_0000_0000_0000_0000").is_err());
    }

    #[test]
    fn test_parse_object_address_masks_32_bit() {
        let layout = VmLayout::mono_32();
        assert_eq!(parse_object_address("0xFFFFFFFF00001000", &layout).unwrap(), 0x1000);
        assert_eq!(parse_object_address("0x00001000", &layout).unwrap(), 0x1000);

        let wide = VmLayout::mono_64();
        assert_eq!(
            parse_object_address("0xFFFFFFFF00001000", &wide).unwrap(),
            0xFFFF_FFFF_0000_1000
        );
        assert!(parse_object_address("nope", &layout).is_err());
    }
}

use crate::geometry::{ADDRESS_BITS, CacheGeometry};

pub const HEX_DIGITS: usize = (ADDRESS_BITS / 4) as usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AddressFields {
    pub tag: u32,
    pub index: u32,
    pub offset: u32,
}

/// Splits 32-bit addresses into tag/index/offset for one geometry.
#[derive(Debug, Clone, Copy)]
pub struct AddressCodec {
    tag_bits: u32,
    index_bits: u32,
    offset_bits: u32,
}

impl AddressCodec {
    pub fn new(geometry: &CacheGeometry) -> Self {
        Self {
            tag_bits: geometry.tag_bits,
            index_bits: geometry.index_bits,
            offset_bits: geometry.offset_bits,
        }
    }

    pub fn split(&self, address: u32) -> AddressFields {
        // Widen so a zero-width field never shifts by the full word size.
        let address = address as u64;
        let tag_shift = self.index_bits + self.offset_bits;
        AddressFields {
            tag: ((address >> tag_shift) & mask(self.tag_bits)) as u32,
            index: ((address >> self.offset_bits) & mask(self.index_bits)) as u32,
            offset: (address & mask(self.offset_bits)) as u32,
        }
    }
}

fn mask(bits: u32) -> u64 {
    (1u64 << bits) - 1
}

/// Parses exactly eight hex digits (either case) into an address.
pub fn parse_hex_address(text: &str) -> Option<u32> {
    if text.len() != HEX_DIGITS || !text.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(text, 16).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{CacheConfiguration, ReplacementKind};

    fn codec(size_kb: u32, block: u32, ways: u32) -> AddressCodec {
        let config =
            CacheConfiguration::new("t", size_kb, block, ways, ReplacementKind::RoundRobin)
                .unwrap();
        AddressCodec::new(&CacheGeometry::from_config(&config))
    }

    #[test]
    fn splits_fields_in_big_endian_order() {
        // 22 tag bits, 8 index bits, 2 offset bits.
        let codec = codec(1, 4, 1);
        let fields = codec.split(0x0000_ABCD);
        assert_eq!(fields.offset, 0b01);
        assert_eq!(fields.index, 0xF3);
        assert_eq!(fields.tag, 0x2A);
    }

    #[test]
    fn all_ones_fill_every_field() {
        let codec = codec(16, 32, 4);
        let fields = codec.split(u32::MAX);
        assert_eq!(fields.offset, 31);
        assert_eq!(fields.index, 127);
        assert_eq!(fields.tag, (1 << 20) - 1);
    }

    #[test]
    fn zero_index_width_yields_zero_index() {
        let codec = codec(1, 64, 16);
        let fields = codec.split(0xDEAD_BEEF);
        assert_eq!(fields.index, 0);
        assert_eq!(fields.offset, 0x2F);
        assert_eq!(fields.tag, 0xDEAD_BEEF >> 6);
    }

    #[test]
    fn parses_hex_in_either_case() {
        assert_eq!(parse_hex_address("7c809767"), Some(0x7C80_9767));
        assert_eq!(parse_hex_address("7C809767"), Some(0x7C80_9767));
        assert_eq!(parse_hex_address("00000000"), Some(0));
    }

    #[test]
    fn rejects_non_hex_or_wrong_length() {
        assert_eq!(parse_hex_address("7c80976g"), None);
        assert_eq!(parse_hex_address("+c809767"), None);
        assert_eq!(parse_hex_address("7c8097"), None);
        assert_eq!(parse_hex_address("7c809767a"), None);
    }
}

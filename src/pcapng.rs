//! PCAPNG blocks
//!
//! See <https://github.com/pcapng/pcapng> for details.
//!
//! A capture file is organized in blocks. Every block starts with a 4-byte
//! type code and a 4-byte total length, and ends with a copy of that length,
//! so a file can be traversed both forward and backward. The total length is
//! always a multiple of 4.
//!
//! The files produced by this crate always contain exactly one section, with
//! one interface:
//!
//! ```text
//! +-----+-----+-----+-----+-----+-----+
//! | SHB | IDB | EPB | EPB | ... | EPB |
//! +-----+-----+-----+-----+-----+-----+
//! ```
//!
//! All blocks are written little-endian. The parsing functions of this module
//! (`parse_block_le`, `parse_section_le`, ...) read them back, and are mainly
//! useful to inspect or verify produced files.

use rusticata_macros::newtype_enum;

mod block;
mod enhanced_packet;
mod interface_description;
mod option;
mod section;
mod section_header;
mod time;

pub use block::*;
pub use enhanced_packet::*;
pub use interface_description::*;
pub use option::*;
pub use section::*;
pub use section_header::*;
pub use time::*;

/// Section Header Block magic
pub const SHB_MAGIC: u32 = 0x0A0D_0D0A;
/// Interface Description Block magic
pub const IDB_MAGIC: u32 = 0x0000_0001;
/// Enhanced Packet Block magic
pub const EPB_MAGIC: u32 = 0x0000_0006;

/// Byte Order magic
pub const BOM_MAGIC: u32 = 0x1A2B_3C4D;

#[derive(Clone, Copy, Eq, PartialEq)]
pub struct OptionCode(pub u16);

newtype_enum! {
impl debug OptionCode {
    EndOfOpt = 0,
    Comment = 1,
}
}

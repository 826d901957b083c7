use std::borrow::Cow;

use nom::number::streaming::{le_i64, le_u16, le_u32};
use nom::{Err, IResult};

use crate::error::PcapNGParseError;
use crate::pcapng::option::opt_parse_comment;

use super::*;

/// Comment written in the section header when none is configured
pub const DEFAULT_SECTION_COMMENT: &str = "Pcapng file converted using ndis-pcapng.";

/// The Section Header Block (SHB) identifies the
/// beginning of a section of the capture file.
///
/// ```text
///    0                   1                   2                   3
///    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///   +---------------------------------------------------------------+
/// 0 |                   Block Type = 0x0A0D0D0A                     |
///   +---------------------------------------------------------------+
/// 4 |                      Block Total Length                       |
///   +---------------------------------------------------------------+
/// 8 |                Byte-Order Magic = 0x1A2B3C4D                  |
///   +---------------------------------------------------------------+
/// 12|        Major Version = 1      |       Minor Version = 0       |
///   +---------------------------------------------------------------+
/// 16|                        Section Length                         |
///   |                          (64 bits)                            |
///   +---------------------------------------------------------------+
/// 24/                     Comment option                            /
///   +---------------------------------------------------------------+
///   |                      Block Total Length                       |
///   +---------------------------------------------------------------+
/// ```
///
/// The section length is `-1` (unknown) until the owning writer knows how
/// many bytes follow the header, see [`SectionHeaderBlock::set_section_len`].
#[derive(Debug)]
pub struct SectionHeaderBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    /// Byte-order magic
    pub bom: u32,
    pub major_version: u16,
    pub minor_version: u16,
    pub section_len: i64,
    pub comment: Option<CommentOption<'a>>,
    pub block_len2: u32,
}

impl<'a> SectionHeaderBlock<'a> {
    /// Build a section header, using the default comment if `comment` is `None`
    pub fn new(comment: Option<&'a str>) -> Self {
        Self::with_comment(comment.unwrap_or(DEFAULT_SECTION_COMMENT))
    }

    /// Build a section header with the given comment
    pub fn with_comment<S: Into<Cow<'a, str>>>(comment: S) -> Self {
        let comment = CommentOption::new(comment);
        let length = (28 + comment.total_len()) as u32;
        SectionHeaderBlock {
            block_type: SHB_MAGIC,
            block_len1: length,
            bom: BOM_MAGIC,
            major_version: 1,
            minor_version: 0,
            section_len: -1,
            comment: Some(comment),
            block_len2: length,
        }
    }

    /// Set the number of bytes in the section, following this header
    #[inline]
    pub fn set_section_len(&mut self, section_len: i64) {
        self.section_len = section_len;
    }

    #[inline]
    pub fn section_len(&self) -> i64 {
        self.section_len
    }

    /// Total length of the block, in bytes
    #[inline]
    pub fn total_len(&self) -> u32 {
        self.block_len1
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_ref().map(|c| c.text())
    }

    pub fn into_owned(self) -> SectionHeaderBlock<'static> {
        SectionHeaderBlock {
            block_type: self.block_type,
            block_len1: self.block_len1,
            bom: self.bom,
            major_version: self.major_version,
            minor_version: self.minor_version,
            section_len: self.section_len,
            comment: self.comment.map(CommentOption::into_owned),
            block_len2: self.block_len2,
        }
    }
}

impl<'a> PcapNGBlockParser<'a, SectionHeaderBlock<'a>> for SectionHeaderBlock<'a> {
    const HDR_SZ: usize = 28;
    const MAGIC: u32 = SHB_MAGIC;

    fn inner_parse(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], SectionHeaderBlock<'a>, PcapNGParseError<&'a [u8]>> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, bom) = le_u32(i)?;
        if bom != BOM_MAGIC {
            return Err(Err::Error(PcapNGParseError::HeaderNotRecognized));
        }
        let (i, major_version) = le_u16(i)?;
        let (i, minor_version) = le_u16(i)?;
        let (i, section_len) = le_i64(i)?;
        let (i, comment) = opt_parse_comment(i)?;
        let block = SectionHeaderBlock {
            block_type,
            block_len1,
            bom,
            major_version,
            minor_version,
            section_len,
            comment,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse a Section Header Block (little endian)
pub fn parse_sectionheaderblock_le(
    i: &[u8],
) -> IResult<&[u8], SectionHeaderBlock, PcapNGParseError<&[u8]>> {
    ng_block_parser::<SectionHeaderBlock, _>()(i)
}

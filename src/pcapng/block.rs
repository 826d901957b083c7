use nom::bytes::streaming::take;
use nom::combinator::map;
use nom::error::{make_error, ErrorKind};
use nom::number::streaming::le_u32;
use nom::{Err, IResult, Needed};

use crate::error::PcapNGParseError;

use super::*;

/// A block from a PcapNG file
#[derive(Debug)]
pub enum Block<'a> {
    SectionHeader(SectionHeaderBlock<'a>),
    InterfaceDescription(InterfaceDescriptionBlock<'a>),
    EnhancedPacket(EnhancedPacketBlock<'a>),
    Unknown(UnknownBlock<'a>),
}

impl<'a> Block<'a> {
    /// Returns true if blocks contains a network packet
    pub fn is_data_block(&self) -> bool {
        matches!(self, &Block::EnhancedPacket(_))
    }

    /// Return the magic number of the block
    pub fn magic(&self) -> u32 {
        match self {
            Block::SectionHeader(_) => SHB_MAGIC,
            Block::InterfaceDescription(_) => IDB_MAGIC,
            Block::EnhancedPacket(_) => EPB_MAGIC,
            Block::Unknown(ub) => ub.block_type,
        }
    }

    /// Return the total length of the block, as read from its header
    pub fn block_len(&self) -> u32 {
        match self {
            Block::SectionHeader(b) => b.block_len1,
            Block::InterfaceDescription(b) => b.block_len1,
            Block::EnhancedPacket(b) => b.block_len1,
            Block::Unknown(b) => b.block_len1,
        }
    }
}

/// Unknown block (magic not recognized)
#[derive(Debug)]
pub struct UnknownBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub data: &'a [u8],
    pub block_len2: u32,
}

impl<'a> PcapNGBlockParser<'a, UnknownBlock<'a>> for UnknownBlock<'a> {
    const HDR_SZ: usize = 12;
    const MAGIC: u32 = 0;

    fn inner_parse(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], UnknownBlock<'a>, PcapNGParseError<&'a [u8]>> {
        let block = UnknownBlock {
            block_type,
            block_len1,
            data: i,
            block_len2,
        };
        Ok((&i[i.len()..], block))
    }
}

/// Parse an unknown block (little-endian)
pub fn parse_unknownblock_le(i: &[u8]) -> IResult<&[u8], UnknownBlock, PcapNGParseError<&[u8]>> {
    ng_block_parser::<UnknownBlock, _>()(i)
}

/// Parse any block, as little-endian
pub fn parse_block_le(i: &[u8]) -> IResult<&[u8], Block, PcapNGParseError<&[u8]>> {
    match le_u32(i) {
        Ok((_, id)) => match id {
            SHB_MAGIC => map(parse_sectionheaderblock_le, Block::SectionHeader)(i),
            IDB_MAGIC => map(
                parse_interfacedescriptionblock_le,
                Block::InterfaceDescription,
            )(i),
            EPB_MAGIC => map(parse_enhancedpacketblock_le, Block::EnhancedPacket)(i),
            _ => map(parse_unknownblock_le, Block::Unknown)(i),
        },
        Err(e) => Err(e),
    }
}

pub(crate) trait PcapNGBlockParser<'a, O: 'a> {
    /// Minimum header size, in bytes
    const HDR_SZ: usize;
    /// Magic number for this block type, or 0 to accept any
    const MAGIC: u32;

    // caller function must have tested header type(magic) and length
    fn inner_parse(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], O, PcapNGParseError<&'a [u8]>>;
}

/// Create a block parser function for the given block object
pub(crate) fn ng_block_parser<'a, P, O>(
) -> impl FnMut(&'a [u8]) -> IResult<&'a [u8], O, PcapNGParseError<&'a [u8]>>
where
    P: PcapNGBlockParser<'a, O>,
    O: 'a,
{
    move |i: &'a [u8]| {
        // read generic block layout
        if i.len() < P::HDR_SZ {
            return Err(Err::Incomplete(Needed::new(P::HDR_SZ - i.len())));
        }
        let (i, block_type) = le_u32(i)?;
        let (i, block_len1) = le_u32(i)?;
        if P::MAGIC != 0 && block_type != P::MAGIC {
            return Err(Err::Error(PcapNGParseError::UnexpectedBlockType(
                block_type,
            )));
        }
        if block_len1 < P::HDR_SZ as u32 || block_len1 % 4 != 0 {
            return Err(Err::Error(make_error(i, ErrorKind::Verify)));
        }
        // 12 is block_type (4) + block_len1 (4) + block_len2 (4)
        let (i, block_content) = take(block_len1 - 12)(i)?;
        let (i, block_len2) = le_u32(i)?;
        if block_len2 != block_len1 {
            return Err(Err::Error(PcapNGParseError::BlockLengthMismatch {
                head: block_len1,
                tail: block_len2,
            }));
        }
        // call block content parsing function
        let (_, b) = P::inner_parse(block_type, block_len1, block_content, block_len2)?;
        // return the remaining bytes from the container, not content
        Ok((i, b))
    }
}

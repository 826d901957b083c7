use nom::number::streaming::{le_u16, le_u32};
use nom::IResult;

use crate::error::PcapNGParseError;
use crate::pcapng::option::opt_parse_comment;
use crate::Linktype;

use super::*;

/// An Interface Description Block (IDB) is the container for information
/// describing an interface on which packet data is captured.
///
/// Files produced by this crate have a single interface, with id 0.
#[derive(Debug)]
pub struct InterfaceDescriptionBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub linktype: Linktype,
    pub reserved: u16,
    pub snaplen: u32,
    pub comment: Option<CommentOption<'a>>,
    pub block_len2: u32,
}

impl InterfaceDescriptionBlock<'static> {
    /// Build the interface description for the captured frames
    ///
    /// The link type is stored as given. The comment names the assumed frame
    /// type, see [`Linktype::frame_label`].
    pub fn new(max_packet_size: u32, linktype: Linktype) -> Self {
        let comment = CommentOption::new(format!(
            "Etl packet capture converted assuming {} frames.",
            linktype.frame_label()
        ));
        let length = (20 + comment.total_len()) as u32;
        InterfaceDescriptionBlock {
            block_type: IDB_MAGIC,
            block_len1: length,
            linktype,
            reserved: 0,
            snaplen: max_packet_size,
            comment: Some(comment),
            block_len2: length,
        }
    }
}

impl<'a> InterfaceDescriptionBlock<'a> {
    /// Total length of the block, in bytes
    #[inline]
    pub fn total_len(&self) -> u32 {
        self.block_len1
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_ref().map(|c| c.text())
    }
}

impl<'a> PcapNGBlockParser<'a, InterfaceDescriptionBlock<'a>> for InterfaceDescriptionBlock<'a> {
    const HDR_SZ: usize = 20;
    const MAGIC: u32 = IDB_MAGIC;

    fn inner_parse(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], InterfaceDescriptionBlock<'a>, PcapNGParseError<&'a [u8]>> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, linktype) = le_u16(i)?;
        let (i, reserved) = le_u16(i)?;
        let (i, snaplen) = le_u32(i)?;
        let (i, comment) = opt_parse_comment(i)?;
        let block = InterfaceDescriptionBlock {
            block_type,
            block_len1,
            linktype: Linktype(linktype as i32),
            reserved,
            snaplen,
            comment,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse an Interface Description Block (little endian)
pub fn parse_interfacedescriptionblock_le(
    i: &[u8],
) -> IResult<&[u8], InterfaceDescriptionBlock, PcapNGParseError<&[u8]>> {
    ng_block_parser::<InterfaceDescriptionBlock, _>()(i)
}

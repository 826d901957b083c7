use cookie_factory::bytes::{le_i32, le_i64, le_u16, le_u32, le_u64, le_u8};
use cookie_factory::combinator::slice;
use cookie_factory::sequence::tuple;
use cookie_factory::{gen_simple, GenError, SerializeFn, WriteContext};
use rusticata_macros::align32;
use std::io::Write;

use crate::ndis_metadata::NdisRadioMetadata;
use crate::pcapng::*;

/// Common trait for all serialization functions
pub trait ToVec {
    /// Serialize to bytes representation (little-endian).
    /// Check values and fix all fields before serializing.
    fn to_vec(&mut self) -> Result<Vec<u8>, GenError> {
        self.fix();
        self.to_vec_raw()
    }

    /// Check and correct all fields: use magic, fix lengths fields and other values if possible.
    fn fix(&mut self) {}

    /// Serialize to bytes representation (little-endian). Do not check values
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError>;
}

fn padding_for<'a, W: Write + 'a>(unaligned_length: u32) -> impl SerializeFn<W> + 'a {
    let length = align32!(unaligned_length) - unaligned_length;
    slice(if length > 0 {
        &[0, 0, 0, 0][..length as usize]
    } else {
        b""
    })
}

// text length is bounded by `CommentOption::new`
fn comment_le<'a, W: Write + 'a>(text: &'a str) -> impl SerializeFn<W> + 'a {
    let len = text.len() as u16;
    tuple((
        le_u16(OptionCode::Comment.0),
        le_u16(len),
        slice(text.as_bytes()),
        padding_for(len as u32),
        le_u16(OptionCode::EndOfOpt.0),
        le_u16(0),
    ))
}

fn opt_comment_le<'a, W: Write + 'a>(c: &'a Option<CommentOption>) -> impl SerializeFn<W> + 'a {
    let text = c.as_ref().map(|c| c.text());
    move |out: WriteContext<W>| match text {
        Some(text) => comment_le(text)(out),
        None => Ok(out),
    }
}

impl<'a> ToVec for CommentOption<'a> {
    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        gen_simple(comment_le(self.text()), Vec::with_capacity(self.total_len()))
    }
}

impl<'a> ToVec for SectionHeaderBlock<'a> {
    /// Check and correct all fields: use magic, version and fix lengths fields
    fn fix(&mut self) {
        self.block_type = SHB_MAGIC;
        self.bom = BOM_MAGIC;
        self.major_version = 1;
        self.minor_version = 0;
        // fix length
        let length = (28 + self.comment.as_ref().map_or(0, |c| c.total_len())) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let v = Vec::with_capacity(self.block_len1 as usize);
        gen_simple(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u32(self.bom),
                le_u16(self.major_version),
                le_u16(self.minor_version),
                le_i64(self.section_len),
                opt_comment_le(&self.comment),
                le_u32(self.block_len2),
            )),
            v,
        )
    }
}

impl<'a> ToVec for InterfaceDescriptionBlock<'a> {
    /// Check and correct all fields: use magic and fix lengths fields
    fn fix(&mut self) {
        self.block_type = IDB_MAGIC;
        self.reserved = 0;
        // fix length
        let length = (20 + self.comment.as_ref().map_or(0, |c| c.total_len())) as u32;
        self.block_len1 = length;
        self.block_len2 = length;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let v = Vec::with_capacity(self.block_len1 as usize);
        gen_simple(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u16(self.linktype.0 as u16),
                le_u16(self.reserved),
                le_u32(self.snaplen),
                opt_comment_le(&self.comment),
                le_u32(self.block_len2),
            )),
            v,
        )
    }
}

impl<'a> ToVec for EnhancedPacketBlock<'a> {
    /// Check and correct all fields: use magic, keep data within `caplen` and fix lengths fields
    fn fix(&mut self) {
        self.block_type = EPB_MAGIC;
        let data = self.data;
        if data.len() > self.caplen as usize {
            self.data = &data[..self.caplen as usize];
        }
        self.caplen = self.data.len() as u32;
        if self.origlen < self.caplen {
            self.origlen = self.caplen;
        }
        // fix length
        let length = 32
            + align32!(self.data.len())
            + self.comment.as_ref().map_or(0, |c| c.total_len());
        self.block_len1 = length as u32;
        self.block_len2 = self.block_len1;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let v = Vec::with_capacity(self.block_len1 as usize);
        gen_simple(
            tuple((
                le_u32(self.block_type),
                le_u32(self.block_len1),
                le_u32(self.if_id),
                le_u32(self.ts_high),
                le_u32(self.ts_low),
                le_u32(self.caplen),
                le_u32(self.origlen),
                slice(self.data),
                padding_for(self.data.len() as u32),
                opt_comment_le(&self.comment),
                le_u32(self.block_len2),
            )),
            v,
        )
    }
}

impl ToVec for NdisRadioMetadata {
    fn fix(&mut self) {
        self.size = NdisRadioMetadata::SIZE as u16;
    }

    fn to_vec_raw(&self) -> Result<Vec<u8>, GenError> {
        let v = Vec::with_capacity(NdisRadioMetadata::SIZE);
        gen_simple(
            tuple((
                le_u8(self.md_type),
                le_u8(self.revision),
                le_u16(self.size),
                le_u32(self.receive_flags),
                le_u32(self.phy_id),
                le_u32(self.center_freq),
                le_u32(self.num_mpdus_received),
                le_i32(self.rssi),
                le_u32(self.data_rate),
                le_u32(self.size_media_specific_info),
                le_u64(self.media_specific_info),
                le_u64(self.timestamp),
            )),
            v,
        )
    }
}

#[cfg(test)]
mod tests {
    use crate::pcapng::*;
    use crate::serialize::ToVec;
    use crate::Linktype;

    fn block_should_not_be_fixed<T: ToVec>(block: &mut T) {
        let raw = block.to_vec_raw().expect("serialize");
        assert_eq!(block.to_vec().expect("serialize"), raw);
    }

    #[test]
    fn built_blocks_are_consistent() {
        block_should_not_be_fixed(&mut SectionHeaderBlock::new(None));
        block_should_not_be_fixed(&mut InterfaceDescriptionBlock::new(
            65535,
            Linktype::IEEE802_11,
        ));
        let packet = [1u8, 2, 3, 4, 5, 6, 7];
        block_should_not_be_fixed(
            &mut EnhancedPacketBlock::new(42, &packet, 4, Some(CommentOption::new("x"))).unwrap(),
        );
    }

    #[test]
    fn fix_epb_lengths() {
        let packet = [9u8; 6];
        let mut epb = EnhancedPacketBlock {
            block_type: 0,
            block_len1: 0,
            if_id: 0,
            ts_high: 0,
            ts_low: 0,
            caplen: 5,
            origlen: 0,
            data: &packet,
            comment: None,
            block_len2: 0,
        };
        let v = epb.to_vec().expect("serialize");
        assert_eq!(epb.caplen, 5);
        assert_eq!(epb.origlen, 5);
        assert_eq!(epb.block_len1, 40);
        assert_eq!(v.len(), 40);
        let (rem, parsed) = parse_enhancedpacketblock_le(&v).expect("parse epb");
        assert!(rem.is_empty());
        assert_eq!(parsed.packet_data(), &packet[..5]);
    }

    #[test]
    fn fix_shb_without_comment() {
        let mut shb = SectionHeaderBlock::new(None);
        shb.comment = None;
        let v = shb.to_vec().expect("serialize");
        assert_eq!(v.len(), 28);
        let (_, parsed) = parse_sectionheaderblock_le(&v).expect("parse shb");
        assert!(parsed.comment.is_none());
    }
}

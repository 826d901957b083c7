use nom::{
    combinator::complete,
    error::{make_error, ErrorKind},
    multi::many0,
    Err, IResult,
};

use crate::error::PcapNGParseError;

use super::*;

/// A Section (including all blocks) from a PcapNG file
#[derive(Debug)]
pub struct Section<'a> {
    /// The list of blocks, starting with the section header
    pub blocks: Vec<Block<'a>>,
}

impl<'a> Section<'a> {
    /// Returns the section header
    pub fn header(&self) -> Option<&SectionHeaderBlock<'a>> {
        if let Some(Block::SectionHeader(ref b)) = self.blocks.first() {
            Some(b)
        } else {
            None
        }
    }

    /// Returns the first interface description block
    pub fn interface(&self) -> Option<&InterfaceDescriptionBlock<'a>> {
        self.blocks.iter().find_map(|b| match b {
            Block::InterfaceDescription(idb) => Some(idb),
            _ => None,
        })
    }

    /// Returns an iterator over the enhanced packet blocks
    pub fn iter_packets(&self) -> PacketBlockIterator<'_, 'a> {
        PacketBlockIterator {
            section: self,
            index_block: 0,
        }
    }

    /// Number of bytes following the section header, as counted from the blocks
    pub fn content_len(&self) -> u64 {
        self.blocks
            .iter()
            .skip(1)
            .map(|b| u64::from(b.block_len()))
            .sum()
    }
}

// Non-consuming iterator over packet blocks of a Section
pub struct PacketBlockIterator<'s, 'a> {
    section: &'s Section<'a>,
    index_block: usize,
}

impl<'s, 'a> Iterator for PacketBlockIterator<'s, 'a> {
    type Item = &'s EnhancedPacketBlock<'a>;

    fn next(&mut self) -> Option<&'s EnhancedPacketBlock<'a>> {
        if self.index_block >= self.section.blocks.len() {
            return None;
        }
        for block in &self.section.blocks[self.index_block..] {
            self.index_block += 1;
            if let Block::EnhancedPacket(ref epb) = block {
                return Some(epb);
            }
        }
        None
    }
}

/// Parse any block from a section (little-endian)
pub fn parse_section_content_block_le(
    i: &[u8],
) -> IResult<&[u8], Block, PcapNGParseError<&[u8]>> {
    let (rem, block) = parse_block_le(i)?;
    match block {
        Block::SectionHeader(_) => Err(Err::Error(make_error(i, ErrorKind::Tag))),
        _ => Ok((rem, block)),
    }
}

/// Parse one section (little-endian)
pub fn parse_section_le(i: &[u8]) -> IResult<&[u8], Section, PcapNGParseError<&[u8]>> {
    let (rem, shb) = parse_sectionheaderblock_le(i)?;
    let (rem, mut b) = many0(complete(parse_section_content_block_le))(rem)?;
    let mut blocks = Vec::with_capacity(b.len() + 1);
    blocks.push(Block::SectionHeader(shb));
    blocks.append(&mut b);
    let section = Section { blocks };
    Ok((rem, section))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::serialize::ToVec;
    use crate::Linktype;

    fn build_file(packets: &[&[u8]]) -> Vec<u8> {
        let mut v = SectionHeaderBlock::new(Some("test")).to_vec().unwrap();
        v.extend(
            InterfaceDescriptionBlock::new(65535, Linktype::ETHERNET)
                .to_vec()
                .unwrap(),
        );
        for (n, p) in packets.iter().enumerate() {
            v.extend(
                EnhancedPacketBlock::new(n as u64, p, 65535, None)
                    .unwrap()
                    .to_vec()
                    .unwrap(),
            );
        }
        v
    }

    #[test]
    fn parse_section_blocks() {
        let data = build_file(&[&b"one"[..], &b"three"[..], &b""[..]]);
        let (rem, section) = parse_section_le(&data).expect("parse section");
        assert!(rem.is_empty());
        assert_eq!(section.blocks.len(), 5);
        assert_eq!(section.header().and_then(|h| h.comment()), Some("test"));
        assert_eq!(section.interface().map(|i| i.snaplen), Some(65535));
        let payloads: Vec<&[u8]> = section.iter_packets().map(|p| p.packet_data()).collect();
        assert_eq!(payloads, vec![&b"one"[..], &b"three"[..], &b""[..]]);
        let ts: Vec<u64> = section.iter_packets().map(|p| p.timestamp_micros()).collect();
        assert_eq!(ts, vec![0, 1, 2]);
        let shb_len = section.header().map(|h| h.total_len()).unwrap() as usize;
        assert_eq!(section.content_len() as usize, data.len() - shb_len);
    }

    #[test]
    fn second_header_ends_section() {
        let mut data = build_file(&[&b"abcd"[..]]);
        let first_len = data.len();
        data.extend(build_file(&[]));
        let (rem, section) = parse_section_le(&data).expect("parse section");
        assert_eq!(rem.len(), data.len() - first_len);
        assert_eq!(section.iter_packets().count(), 1);
    }
}

use std::convert::TryFrom;

use nom::bytes::streaming::take;
use nom::error::{make_error, ErrorKind};
use nom::number::streaming::le_u32;
use nom::{Err, IResult};
use rusticata_macros::align32;

use crate::error::{PcapNGParseError, PcapNGWriteError, Result};
use crate::ndis_metadata::NdisRadioMetadata;
use crate::pcapng::option::opt_parse_comment;
use crate::record::CaptureRecord;
use crate::utils::pad4;

use super::*;

/// An Enhanced Packet Block (EPB) is the standard container for storing
/// the packets coming from the network.
///
/// ```text
///    0                   1                   2                   3
///    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
///   +---------------------------------------------------------------+
/// 0 |                    Block Type = 0x00000006                    |
///   +---------------------------------------------------------------+
/// 4 |                      Block Total Length                       |
///   +---------------------------------------------------------------+
/// 8 |                         Interface ID                          |
///   +---------------------------------------------------------------+
/// 12|                        Timestamp (High)                       |
///   +---------------------------------------------------------------+
/// 16|                        Timestamp (Low)                        |
///   +---------------------------------------------------------------+
/// 20|                    Captured Packet Length                     |
///   +---------------------------------------------------------------+
/// 24|                    Original Packet Length                     |
///   +---------------------------------------------------------------+
/// 28/                Packet Data, padded to 32 bits                 /
///   +---------------------------------------------------------------+
///   /                  Comment option (optional)                    /
///   +---------------------------------------------------------------+
///   |                      Block Total Length                       |
///   +---------------------------------------------------------------+
/// ```
///
/// Timestamps are in microseconds since 1970-01-01 UTC (the default
/// interface resolution). `data` holds the captured bytes only, without
/// padding: it is never longer than `caplen`.
#[derive(Debug)]
pub struct EnhancedPacketBlock<'a> {
    pub block_type: u32,
    pub block_len1: u32,
    pub if_id: u32,
    pub ts_high: u32,
    pub ts_low: u32,
    /// Captured packet length
    pub caplen: u32,
    /// Original packet length
    pub origlen: u32,
    /// Captured packet data
    pub data: &'a [u8],
    pub comment: Option<CommentOption<'a>>,
    pub block_len2: u32,
}

impl<'a> EnhancedPacketBlock<'a> {
    /// Build a packet block on interface 0
    ///
    /// `packet` is truncated to `max_packet_size` bytes; the original length
    /// is kept in `origlen`.
    pub fn new(
        ts_micros: u64,
        packet: &'a [u8],
        max_packet_size: u32,
        comment: Option<CommentOption<'a>>,
    ) -> Result<Self> {
        let origlen = u32::try_from(packet.len())
            .map_err(|_| PcapNGWriteError::InvalidRecord("packet longer than 4 GiB"))?;
        let caplen = origlen.min(max_packet_size);
        if caplen < origlen {
            log::warn!(
                "packet size of {} exceeded max packet size {}, truncated",
                origlen,
                max_packet_size
            );
        }
        let data = &packet[..caplen as usize];
        let length = 32 + pad4(data.len()) + comment.as_ref().map_or(0, |c| c.total_len());
        let length = u32::try_from(length).map_err(|_| {
            PcapNGWriteError::InvalidArgument(format!("block length {} exceeds 32 bits", length))
        })?;
        let (ts_high, ts_low) = split_ts(ts_micros);
        Ok(EnhancedPacketBlock {
            block_type: EPB_MAGIC,
            block_len1: length,
            if_id: 0,
            ts_high,
            ts_low,
            caplen,
            origlen,
            data,
            comment,
            block_len2: length,
        })
    }

    /// Build the packet block for a capture record
    ///
    /// If the record carries NDIS radio metadata, its rendering is attached
    /// as a comment. Other auxiliary blobs are ignored.
    pub fn from_record<R: CaptureRecord + ?Sized>(
        record: &'a R,
        max_packet_size: u32,
    ) -> Result<Self> {
        let packet = record
            .packet_data()
            .ok_or(PcapNGWriteError::InvalidRecord("missing packet payload"))?;
        let time_created = record
            .time_created()
            .ok_or(PcapNGWriteError::InvalidRecord("missing creation time"))?;
        let ts_micros = micros_since_epoch(&time_created).ok_or(
            PcapNGWriteError::InvalidRecord("creation time before the Unix epoch"),
        )?;
        let comment = match record.metadata() {
            Some(blob) if NdisRadioMetadata::is_metadata(blob) => {
                let metadata = NdisRadioMetadata::decode(blob)?;
                Some(CommentOption::new(metadata.to_string()))
            }
            _ => None,
        };
        Self::new(ts_micros, packet, max_packet_size, comment)
    }

    /// Total length of the block, in bytes
    #[inline]
    pub fn total_len(&self) -> u32 {
        self.block_len1
    }

    /// Timestamp, in microseconds since the epoch
    #[inline]
    pub fn timestamp_micros(&self) -> u64 {
        ((self.ts_high as u64) << 32) | (self.ts_low as u64)
    }

    /// Decode the packet timestamp
    ///
    /// Return the timestamp seconds and fractional part (in resolution units)
    #[inline]
    pub fn decode_ts(&self, ts_offset: u64, resolution: u64) -> (u32, u32) {
        build_ts(self.ts_high, self.ts_low, ts_offset, resolution)
    }

    /// Captured bytes, limited to `caplen`
    pub fn packet_data(&self) -> &[u8] {
        let caplen = self.caplen as usize;
        if caplen < self.data.len() {
            &self.data[..caplen]
        } else {
            self.data
        }
    }

    #[inline]
    pub fn truncated(&self) -> bool {
        self.origlen != self.caplen
    }

    pub fn comment(&self) -> Option<&str> {
        self.comment.as_ref().map(|c| c.text())
    }
}

impl<'a> PcapNGBlockParser<'a, EnhancedPacketBlock<'a>> for EnhancedPacketBlock<'a> {
    const HDR_SZ: usize = 32;
    const MAGIC: u32 = EPB_MAGIC;

    fn inner_parse(
        block_type: u32,
        block_len1: u32,
        i: &'a [u8],
        block_len2: u32,
    ) -> IResult<&'a [u8], EnhancedPacketBlock<'a>, PcapNGParseError<&'a [u8]>> {
        // caller function already tested header type(magic) and length
        // read end of header
        let (i, if_id) = le_u32(i)?;
        let (i, ts_high) = le_u32(i)?;
        let (i, ts_low) = le_u32(i)?;
        let (i, caplen) = le_u32(i)?;
        let (i, origlen) = le_u32(i)?;
        // align32 can overflow
        if caplen >= u32::MAX - 4 {
            return Err(Err::Error(make_error(i, ErrorKind::Verify)));
        }
        let (i, padded) = take(align32!(caplen))(i)?;
        let (i, comment) = opt_parse_comment(i)?;
        let block = EnhancedPacketBlock {
            block_type,
            block_len1,
            if_id,
            ts_high,
            ts_low,
            caplen,
            origlen,
            data: &padded[..caplen as usize],
            comment,
            block_len2,
        };
        Ok((i, block))
    }
}

/// Parse an Enhanced Packet Block (little-endian)
pub fn parse_enhancedpacketblock_le(
    i: &[u8],
) -> IResult<&[u8], EnhancedPacketBlock, PcapNGParseError<&[u8]>> {
    ng_block_parser::<EnhancedPacketBlock, _>()(i)
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use hex_literal::hex;

    use super::*;
    use crate::ndis_metadata::tests::NDIS_METADATA;
    use crate::record::PacketRecord;
    use crate::serialize::ToVec;

    #[test]
    fn serialize_epb() {
        let packet = hex!("01 02 03 04 05");
        let mut epb =
            EnhancedPacketBlock::new(0x0000_0001_0000_0002, &packet, 65535, None).unwrap();
        assert_eq!(epb.total_len(), 40);
        let v = epb.to_vec().expect("serialize");
        assert_eq!(
            v,
            hex!(
                "
06 00 00 00 28 00 00 00 00 00 00 00 01 00 00 00
02 00 00 00 05 00 00 00 05 00 00 00 01 02 03 04
05 00 00 00 28 00 00 00"
            )
        );
    }

    #[test]
    fn lengths_for_fitting_packets() {
        for len in [0usize, 1, 3, 4, 5, 60, 1514].iter() {
            let packet: Vec<u8> = (0..*len).map(|n| n as u8).collect();
            let mut epb = EnhancedPacketBlock::new(1, &packet, 65535, None).unwrap();
            assert_eq!(epb.caplen as usize, *len);
            assert_eq!(epb.origlen as usize, *len);
            assert!(!epb.truncated());
            let v = epb.to_vec().expect("serialize");
            assert_eq!(v.len(), epb.total_len() as usize);
            assert_eq!(v.len() % 4, 0);
            assert_eq!(&v[4..8], &v[v.len() - 4..]);
            // payload, then zero padding
            assert_eq!(&v[28..28 + len], &packet[..]);
            assert!(v[28 + len..28 + pad4(*len)].iter().all(|&b| b == 0));
        }
    }

    #[test]
    fn oversized_packet_is_truncated() {
        let packet = [0xaau8; 10];
        let mut epb = EnhancedPacketBlock::new(1, &packet, 6, None).unwrap();
        assert_eq!(epb.caplen, 6);
        assert_eq!(epb.origlen, 10);
        assert!(epb.truncated());
        assert_eq!(epb.data.len(), 6);
        assert_eq!(epb.total_len(), 32 + 8);
        let v = epb.to_vec().expect("serialize");
        assert_eq!(v.len(), 40);
        assert_eq!(&v[28..34], &[0xaa; 6]);
        assert_eq!(&v[34..36], &[0, 0]);
    }

    #[test]
    fn from_record_without_metadata() {
        let t = Utc.timestamp_opt(1_340_954_905, 298_858_000).single().unwrap();
        let record = PacketRecord::new(t, vec![1, 2, 3]);
        let epb = EnhancedPacketBlock::from_record(&record, 65535).unwrap();
        assert_eq!(epb.if_id, 0);
        assert_eq!(epb.timestamp_micros(), 1_340_954_905_298_858);
        assert_eq!(epb.decode_ts(0, 1_000_000), (1_340_954_905, 298_858));
        assert!(epb.comment.is_none());
        assert_eq!(epb.total_len(), 36);
    }

    #[test]
    fn from_record_with_metadata() {
        let t = Utc.timestamp_opt(1, 0).single().unwrap();
        let record = PacketRecord::new(t, vec![0u8; 8]).with_metadata(NDIS_METADATA.to_vec());
        let mut epb = EnhancedPacketBlock::from_record(&record, 65535).unwrap();
        let comment = epb.comment().unwrap().to_owned();
        assert!(comment.starts_with("NdisEtwMetaData:\r\n"));
        assert!(comment.contains(" RSSI: -42 |"));
        assert_eq!(
            epb.total_len() as usize,
            32 + 8 + 8 + pad4(comment.len())
        );
        let v = epb.to_vec().expect("serialize");
        let (rem, parsed) = parse_enhancedpacketblock_le(&v).expect("parse epb");
        assert!(rem.is_empty());
        assert_eq!(parsed.comment(), Some(comment.as_str()));
        assert_eq!(parsed.packet_data(), &[0u8; 8]);
    }

    #[test]
    fn from_record_ignores_other_blobs() {
        let t = Utc.timestamp_opt(1, 0).single().unwrap();
        let mut blob = NDIS_METADATA.to_vec();
        blob[2] = 0x31;
        let record = PacketRecord::new(t, vec![0u8; 8]).with_metadata(blob);
        let epb = EnhancedPacketBlock::from_record(&record, 65535).unwrap();
        assert!(epb.comment.is_none());
    }

    #[test]
    fn from_record_short_metadata() {
        let t = Utc.timestamp_opt(1, 0).single().unwrap();
        let record =
            PacketRecord::new(t, vec![0u8; 8]).with_metadata(NDIS_METADATA[..20].to_vec());
        let res = EnhancedPacketBlock::from_record(&record, 65535);
        assert!(matches!(
            res,
            Err(PcapNGWriteError::MalformedMetadata { len: 20 })
        ));
    }

    #[test]
    fn from_record_missing_fields() {
        let record = PacketRecord::default();
        let res = EnhancedPacketBlock::from_record(&record, 65535);
        assert!(matches!(res, Err(PcapNGWriteError::InvalidRecord(_))));

        let before_epoch = Utc.timestamp_opt(-10, 0).single().unwrap();
        let record = PacketRecord::new(before_epoch, vec![1]);
        let res = EnhancedPacketBlock::from_record(&record, 65535);
        assert!(matches!(res, Err(PcapNGWriteError::InvalidRecord(_))));
    }
}

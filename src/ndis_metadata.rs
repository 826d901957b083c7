//! NDIS radio metadata
//!
//! Wireless captures from the NDIS packet capture provider attach a 48-byte
//! header describing the physical-layer receive conditions of each frame.
//! The header starts with a fixed signature (type `0x80`, revision `0x01`,
//! size `0x30`); any other blob is not radio metadata and must not be decoded.
//!
//! ```text
//!    0                   1                   2                   3
//!    0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//!   +---------------+---------------+-------------------------------+
//! 0 |   Type=0x80   | Revision=0x01 |          Size=0x0030          |
//!   +---------------+---------------+-------------------------------+
//! 4 |                        Receive Flags                          |
//! 8 |                           PHY Id                              |
//! 12|                       Center Frequency                        |
//! 16|                    Number of MPDUs received                   |
//! 20|                        RSSI (signed)                          |
//! 24|                          Data Rate                            |
//! 28|                 Size of media-specific info                   |
//!   +---------------------------------------------------------------+
//! 32|                 Media-specific info (64 bits)                 |
//!   +---------------------------------------------------------------+
//! 40|                       Timestamp (64 bits)                     |
//!   +---------------------------------------------------------------+
//! ```
//!
//! All fields are little-endian.

use std::fmt;

use nom::number::complete::{le_i32, le_u16, le_u32, le_u64, le_u8};
use nom::IResult;

use crate::error::{PcapNGWriteError, Result};

/// Leading bytes of a radio metadata blob: type, revision and low byte of size
pub const NDIS_METADATA_SIGNATURE: [u8; 3] = [0x80, 0x01, 0x30];

/// NDIS radio metadata header
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct NdisRadioMetadata {
    pub md_type: u8,
    pub revision: u8,
    pub size: u16,
    pub receive_flags: u32,
    pub phy_id: u32,
    pub center_freq: u32,
    pub num_mpdus_received: u32,
    /// Received signal strength, in dBm
    pub rssi: i32,
    pub data_rate: u32,
    pub size_media_specific_info: u32,
    /// Opaque vendor-specific value, never rendered
    pub media_specific_info: u64,
    pub timestamp: u64,
}

impl NdisRadioMetadata {
    /// Encoded size, in bytes
    pub const SIZE: usize = 48;

    /// Test if `i` starts with the radio metadata signature
    pub fn is_metadata(i: &[u8]) -> bool {
        i.starts_with(&NDIS_METADATA_SIGNATURE)
    }

    /// Decode the fixed 48-byte header at the start of `i`
    ///
    /// The signature is not checked: use [`NdisRadioMetadata::is_metadata`] first.
    pub fn decode(i: &[u8]) -> Result<Self> {
        if i.len() < Self::SIZE {
            return Err(PcapNGWriteError::MalformedMetadata { len: i.len() });
        }
        match parse_ndis_radio_metadata(i) {
            Ok((_, metadata)) => Ok(metadata),
            Err(_) => Err(PcapNGWriteError::MalformedMetadata { len: i.len() }),
        }
    }

    /// Displayed fields, in layout order
    ///
    /// `media_specific_info` is left out: it is opaque vendor data.
    pub fn fields(&self) -> [(&'static str, i128); 11] {
        [
            ("Type", i128::from(self.md_type)),
            ("Revision", i128::from(self.revision)),
            ("Size", i128::from(self.size)),
            ("ReceiveFlags", i128::from(self.receive_flags)),
            ("PhyId", i128::from(self.phy_id)),
            ("CenterFreq", i128::from(self.center_freq)),
            ("NumMPDUsReceived", i128::from(self.num_mpdus_received)),
            ("RSSI", i128::from(self.rssi)),
            ("DataRate", i128::from(self.data_rate)),
            ("SizeMediaSpecificInfo", i128::from(self.size_media_specific_info)),
            ("Timestamp", i128::from(self.timestamp)),
        ]
    }
}

impl fmt::Display for NdisRadioMetadata {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("NdisEtwMetaData:\r\n")?;
        for (label, value) in self.fields().iter() {
            write!(f, " {}: {} |", label, value)?;
        }
        Ok(())
    }
}

/// Parse a radio metadata header (little-endian, fixed offsets)
pub fn parse_ndis_radio_metadata(i: &[u8]) -> IResult<&[u8], NdisRadioMetadata> {
    let (i, md_type) = le_u8(i)?;
    let (i, revision) = le_u8(i)?;
    let (i, size) = le_u16(i)?;
    let (i, receive_flags) = le_u32(i)?;
    let (i, phy_id) = le_u32(i)?;
    let (i, center_freq) = le_u32(i)?;
    let (i, num_mpdus_received) = le_u32(i)?;
    let (i, rssi) = le_i32(i)?;
    let (i, data_rate) = le_u32(i)?;
    let (i, size_media_specific_info) = le_u32(i)?;
    let (i, media_specific_info) = le_u64(i)?;
    let (i, timestamp) = le_u64(i)?;
    let metadata = NdisRadioMetadata {
        md_type,
        revision,
        size,
        receive_flags,
        phy_id,
        center_freq,
        num_mpdus_received,
        rssi,
        data_rate,
        size_media_specific_info,
        media_specific_info,
        timestamp,
    };
    Ok((i, metadata))
}

//! # PCAPNG writer for NDIS network traces
//!
//! This crate converts network events captured by the Windows NDIS packet
//! capture provider into a standard PCAPNG file, readable by Wireshark and
//! other common analysis tools.
//!
//! The produced file contains one section with one interface:
//!
//! - a Section Header Block, with a free-text comment and the section length,
//! - an Interface Description Block, with the link type and snapshot length,
//! - one Enhanced Packet Block per record, with a microsecond timestamp.
//!
//! Records carrying NDIS radio metadata (wireless captures) get a
//! human-readable rendering of that metadata as packet comment.
//!
//! The section length is only known when the capture ends: when the output
//! supports random access (files, cursors), the section header is rewritten
//! in place by [`PcapNGWriter::finalize`]. Otherwise, it stays `-1`
//! (unspecified), which is valid PCAPNG.
//!
//! # Example
//!
//! ```rust
//! use chrono::{TimeZone, Utc};
//! use ndis_pcapng::*;
//! use std::io::Cursor;
//!
//! let config = WriterConfig::default()
//!     .with_linktype(Linktype::IEEE802_11)
//!     .with_max_packet_size(2048);
//! let mut writer = PcapNGWriter::new(Cursor::new(Vec::new()), config)
//!     .expect("could not write prologue");
//!
//! let t = Utc.timestamp_opt(1_600_000_000, 250_000_000).unwrap();
//! let records = vec![
//!     PacketRecord::new(t, vec![0u8; 64]),
//!     PacketRecord::new(t, vec![0u8; 4096]),
//! ];
//! let count = writer.write_packets(&records).expect("could not write packets");
//! assert_eq!(count, 2);
//!
//! let (cursor, stats) = writer.finish().expect("could not finalize");
//! assert!(stats.section_len_patched);
//!
//! // read the file back
//! let data = cursor.into_inner();
//! let (_, section) = parse_section_le(&data).expect("could not parse section");
//! assert_eq!(section.header().map(|h| h.section_len), Some(stats.section_len as i64));
//! let caplens: Vec<u32> = section.iter_packets().map(|p| p.caplen).collect();
//! assert_eq!(caplens, vec![64, 2048]);
//! ```
//!
//! # Logging
//!
//! Events are reported through the [`log`](https://docs.rs/log) facade. The
//! crate never installs a logger.

mod error;
mod linktype;
mod ndis_metadata;
mod record;
mod serialize;
mod utils;
mod writer;

pub mod pcapng;

pub use error::*;
pub use linktype::*;
pub use ndis_metadata::*;
pub use pcapng::*;
pub use record::*;
pub use serialize::ToVec;
pub use utils::{pad4, project_to_bytes};
pub use writer::*;

//! Capture session
//!
//! A [`PcapNGWriter`] owns an output sink for the whole capture. It writes the
//! file prologue (section header, then interface description) when created,
//! appends one Enhanced Packet Block per record, and patches the section
//! length into the header when finalized.

use std::convert::TryFrom;
use std::fs::File;
use std::io::{self, BufWriter, Cursor, Seek, SeekFrom, Stdout, Write};

use crate::error::{PcapNGWriteError, Result};
use crate::pcapng::{EnhancedPacketBlock, InterfaceDescriptionBlock, SectionHeaderBlock};
use crate::record::CaptureRecord;
use crate::serialize::ToVec;
use crate::utils::project_to_bytes;
use crate::Linktype;

/// Default snapshot length
pub const DEFAULT_SNAPLEN: u32 = 65535;

/// An output for capture files
///
/// Everything is appended, except the section header that may be rewritten
/// once when the capture is finalized.
pub trait CaptureSink: Write {
    /// Overwrite the first `head.len()` bytes of the output, then restore the
    /// current position.
    ///
    /// Returns `Ok(false)` if the sink does not support random access.
    fn rewrite_head(&mut self, head: &[u8]) -> io::Result<bool> {
        let _ = head;
        Ok(false)
    }
}

fn rewrite_at_start<S: Write + Seek + ?Sized>(sink: &mut S, head: &[u8]) -> io::Result<bool> {
    let pos = sink.stream_position()?;
    sink.seek(SeekFrom::Start(0))?;
    sink.write_all(head)?;
    sink.flush()?;
    // files opened in append mode ignore the seek and write at the end
    let end = sink.stream_position()?;
    if end != head.len() as u64 {
        return Err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "header rewrite landed at offset {}, sink is append-only",
                end.saturating_sub(head.len() as u64)
            ),
        ));
    }
    sink.seek(SeekFrom::Start(pos))?;
    Ok(true)
}

impl CaptureSink for File {
    fn rewrite_head(&mut self, head: &[u8]) -> io::Result<bool> {
        rewrite_at_start(self, head)
    }
}

impl<T> CaptureSink for Cursor<T>
where
    Cursor<T>: Write + Seek,
{
    fn rewrite_head(&mut self, head: &[u8]) -> io::Result<bool> {
        rewrite_at_start(self, head)
    }
}

impl<W: Write + Seek> CaptureSink for BufWriter<W> {
    fn rewrite_head(&mut self, head: &[u8]) -> io::Result<bool> {
        rewrite_at_start(self, head)
    }
}

impl CaptureSink for Vec<u8> {}

impl CaptureSink for Stdout {}

impl<'s, S: CaptureSink + ?Sized> CaptureSink for &'s mut S {
    fn rewrite_head(&mut self, head: &[u8]) -> io::Result<bool> {
        (**self).rewrite_head(head)
    }
}

/// Append-only wrapper around any writer (pipes, sockets, ...)
///
/// The section length of the produced file stays unspecified (`-1`).
#[derive(Debug)]
pub struct Sequential<W>(pub W);

impl<W> Sequential<W> {
    pub fn into_inner(self) -> W {
        self.0
    }
}

impl<W: Write> Write for Sequential<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.flush()
    }
}

impl<W: Write> CaptureSink for Sequential<W> {}

/// Writer configuration
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct WriterConfig {
    /// Snapshot length: packets are truncated to this size
    pub max_packet_size: u32,
    /// Link type of the captured frames
    pub linktype: Linktype,
    /// Section header comment, a default text is used if `None`
    pub section_comment: Option<String>,
}

impl Default for WriterConfig {
    fn default() -> Self {
        WriterConfig {
            max_packet_size: DEFAULT_SNAPLEN,
            linktype: Linktype::ETHERNET,
            section_comment: None,
        }
    }
}

impl WriterConfig {
    pub fn with_max_packet_size(mut self, max_packet_size: u32) -> Self {
        self.max_packet_size = max_packet_size;
        self
    }

    pub fn with_linktype(mut self, linktype: Linktype) -> Self {
        self.linktype = linktype;
        self
    }

    pub fn with_section_comment<S: Into<String>>(mut self, comment: S) -> Self {
        self.section_comment = Some(comment.into());
        self
    }

    /// Check configuration values
    pub fn validate(&self) -> Result<()> {
        if self.max_packet_size == 0 {
            return Err(PcapNGWriteError::InvalidArgument(
                "max packet size must be greater than 0".to_owned(),
            ));
        }
        // stored as 16 bits in the interface description
        if u16::try_from(self.linktype.0).is_err() {
            return Err(PcapNGWriteError::InvalidArgument(format!(
                "link type {} does not fit in 16 bits",
                self.linktype.0
            )));
        }
        Ok(())
    }
}

/// Counters of a capture session
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct CaptureStats {
    /// Number of packet blocks written
    pub packets: u64,
    /// Number of packet blocks carrying a radio metadata comment
    pub metadata_packets: u64,
    /// Bytes written after the section header
    pub section_len: u64,
    /// True if the section length was written back into the header
    pub section_len_patched: bool,
}

/// PCAPNG capture file writer
///
/// The writer produces a single section, with a single interface:
///
/// ```text
/// SHB IDB EPB EPB ... EPB
/// ```
///
/// The prologue is written by the constructor. Each call to
/// [`write_packet`](PcapNGWriter::write_packet) appends one block.
/// [`finalize`](PcapNGWriter::finalize) closes the session: on sinks with
/// random access, the section header is rewritten in place with the final
/// section length.
///
/// ```rust
/// use chrono::{TimeZone, Utc};
/// use ndis_pcapng::{Linktype, PacketRecord, PcapNGWriter};
/// use std::io::Cursor;
///
/// let mut writer = PcapNGWriter::open(Cursor::new(Vec::new()), 65535, Linktype::ETHERNET)
///     .expect("could not write prologue");
/// let t = Utc.timestamp_opt(1_600_000_000, 0).unwrap();
/// writer
///     .write_packet(&PacketRecord::new(t, vec![0u8; 60]))
///     .expect("could not write packet");
/// let (cursor, stats) = writer.finish().expect("could not finalize");
/// assert_eq!(stats.packets, 1);
/// assert!(stats.section_len_patched);
/// assert!(!cursor.into_inner().is_empty());
/// ```
#[derive(Debug)]
pub struct PcapNGWriter<W: CaptureSink> {
    sink: W,
    config: WriterConfig,
    shb: SectionHeaderBlock<'static>,
    idb: InterfaceDescriptionBlock<'static>,
    stats: CaptureStats,
    closed: bool,
}

impl<W: CaptureSink> PcapNGWriter<W> {
    /// Create a writer and write the file prologue to `sink`
    pub fn new(mut sink: W, config: WriterConfig) -> Result<Self> {
        config.validate()?;
        let mut shb = match config.section_comment {
            Some(ref comment) => SectionHeaderBlock::with_comment(comment.clone()),
            None => SectionHeaderBlock::new(None),
        };
        let shb_bytes = shb.to_vec()?;
        sink.write_all(&shb_bytes)?;
        let mut idb = InterfaceDescriptionBlock::new(config.max_packet_size, config.linktype);
        let idb_bytes = idb.to_vec()?;
        sink.write_all(&idb_bytes)?;
        log::debug!(
            "wrote prologue: section header ({} bytes), interface {} snaplen {} ({} bytes)",
            shb_bytes.len(),
            config.linktype,
            config.max_packet_size,
            idb_bytes.len()
        );
        let stats = CaptureStats {
            section_len: idb_bytes.len() as u64,
            ..CaptureStats::default()
        };
        Ok(PcapNGWriter {
            sink,
            config,
            shb,
            idb,
            stats,
            closed: false,
        })
    }

    /// Create a writer with the default section comment
    pub fn open(sink: W, max_packet_size: u32, linktype: Linktype) -> Result<Self> {
        let config = WriterConfig::default()
            .with_max_packet_size(max_packet_size)
            .with_linktype(linktype);
        Self::new(sink, config)
    }

    /// Append one packet block built from `record`
    ///
    /// Returns the number of bytes written.
    pub fn write_packet<R: CaptureRecord + ?Sized>(&mut self, record: &R) -> Result<usize> {
        if self.closed {
            return Err(PcapNGWriteError::NotOpen);
        }
        let mut epb = EnhancedPacketBlock::from_record(record, self.config.max_packet_size)?;
        let has_metadata = epb.comment.is_some();
        let v = epb.to_vec()?;
        self.sink.write_all(&v)?;
        self.stats.packets += 1;
        if has_metadata {
            self.stats.metadata_packets += 1;
        }
        self.stats.section_len += v.len() as u64;
        log::debug!(
            "wrote packet block #{}: caplen {} origlen {} ({} bytes)",
            self.stats.packets,
            epb.caplen,
            epb.origlen,
            v.len()
        );
        Ok(v.len())
    }

    /// Write all records, in order
    ///
    /// Stops at the first error. Returns the number of records written.
    pub fn write_packets<I>(&mut self, records: I) -> Result<usize>
    where
        I: IntoIterator,
        I::Item: CaptureRecord,
    {
        let mut count = 0;
        for record in records {
            self.write_packet(&record)?;
            count += 1;
        }
        Ok(count)
    }

    /// Close the capture session
    ///
    /// Sets the section length in the section header. If the sink supports
    /// random access, the header is rewritten at the start of the output,
    /// otherwise the written value stays `-1` (unspecified). The sink is
    /// flushed in both cases.
    ///
    /// The session is closed even if this fails: counters stay available
    /// through [`stats`](PcapNGWriter::stats), and `section_len_patched` is
    /// only set once the header rewrite succeeded.
    pub fn finalize(&mut self) -> Result<CaptureStats> {
        if self.closed {
            return Err(PcapNGWriteError::AlreadyClosed);
        }
        self.closed = true;
        let section_len = i64::try_from(self.stats.section_len).map_err(|_| {
            PcapNGWriteError::InvalidArgument(format!(
                "section length {} exceeds 63 bits",
                self.stats.section_len
            ))
        })?;
        self.shb.set_section_len(section_len);
        // same size as the block written by the constructor
        let head = project_to_bytes(&self.shb, self.shb.total_len() as usize)?;
        if self.sink.rewrite_head(&head)? {
            self.stats.section_len_patched = true;
            log::debug!("rewrote section header, section length {}", section_len);
        } else {
            log::warn!(
                "sink does not support random access, section length left unspecified ({} bytes)",
                section_len
            );
        }
        self.sink.flush()?;
        log::info!(
            "capture finalized: {} packets ({} with radio metadata), section length {} bytes",
            self.stats.packets,
            self.stats.metadata_packets,
            self.stats.section_len
        );
        Ok(self.stats)
    }

    /// Finalize the session if still open, and return the sink
    pub fn finish(mut self) -> Result<(W, CaptureStats)> {
        let stats = if self.closed {
            self.stats
        } else {
            self.finalize()?
        };
        Ok((self.sink, stats))
    }

    #[inline]
    pub fn stats(&self) -> CaptureStats {
        self.stats
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        !self.closed
    }

    #[inline]
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }

    pub fn section_header(&self) -> &SectionHeaderBlock<'static> {
        &self.shb
    }

    pub fn interface_description(&self) -> &InterfaceDescriptionBlock<'static> {
        &self.idb
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Return the sink, without finalizing the session
    pub fn into_inner(self) -> W {
        self.sink
    }
}

use chrono::{DateTime, Utc};

/// A captured network event, as delivered by the trace reader
///
/// Every field is optional in the source trace: the writer rejects records
/// missing a creation time or a payload.
pub trait CaptureRecord {
    /// Creation time of the event
    fn time_created(&self) -> Option<DateTime<Utc>>;

    /// Raw frame bytes
    fn packet_data(&self) -> Option<&[u8]>;

    /// Auxiliary blob attached to the frame, e.g. NDIS radio metadata
    fn metadata(&self) -> Option<&[u8]> {
        None
    }
}

/// An owned capture record
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PacketRecord {
    pub time_created: Option<DateTime<Utc>>,
    pub data: Option<Vec<u8>>,
    pub metadata: Option<Vec<u8>>,
}

impl PacketRecord {
    pub fn new<D: Into<Vec<u8>>>(time_created: DateTime<Utc>, data: D) -> Self {
        PacketRecord {
            time_created: Some(time_created),
            data: Some(data.into()),
            metadata: None,
        }
    }

    /// Attach an auxiliary blob to the record
    pub fn with_metadata<M: Into<Vec<u8>>>(mut self, metadata: M) -> Self {
        self.metadata = Some(metadata.into());
        self
    }
}

impl CaptureRecord for PacketRecord {
    fn time_created(&self) -> Option<DateTime<Utc>> {
        self.time_created
    }

    fn packet_data(&self) -> Option<&[u8]> {
        self.data.as_deref()
    }

    fn metadata(&self) -> Option<&[u8]> {
        self.metadata.as_deref()
    }
}

impl<'r, R: CaptureRecord + ?Sized> CaptureRecord for &'r R {
    fn time_created(&self) -> Option<DateTime<Utc>> {
        (**self).time_created()
    }

    fn packet_data(&self) -> Option<&[u8]> {
        (**self).packet_data()
    }

    fn metadata(&self) -> Option<&[u8]> {
        (**self).metadata()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    struct FrameOnly(Vec<u8>);

    impl CaptureRecord for FrameOnly {
        fn time_created(&self) -> Option<DateTime<Utc>> {
            Utc.timestamp_opt(0, 0).single()
        }

        fn packet_data(&self) -> Option<&[u8]> {
            Some(&self.0)
        }
    }

    #[test]
    fn packet_record_accessors() {
        let t = Utc.timestamp_opt(1_600_000_000, 0).single().unwrap();
        let record = PacketRecord::new(t, &b"frame"[..]).with_metadata(vec![0x80, 0x01, 0x30]);
        assert_eq!(record.time_created(), Some(t));
        assert_eq!(record.packet_data(), Some(&b"frame"[..]));
        assert_eq!(record.metadata(), Some(&[0x80, 0x01, 0x30][..]));
    }

    #[test]
    fn default_record_is_empty() {
        let record = PacketRecord::default();
        assert!(record.time_created().is_none());
        assert!(record.packet_data().is_none());
        assert!(record.metadata().is_none());
    }

    #[test]
    fn metadata_defaults_to_none() {
        let record = FrameOnly(vec![1, 2]);
        assert!(record.metadata().is_none());
        let by_ref = &record;
        assert_eq!(CaptureRecord::packet_data(&by_ref), Some(&[1u8, 2][..]));
    }
}

use std::convert::TryFrom;

use chrono::{DateTime, Utc};

/// Microseconds elapsed since 1970-01-01T00:00:00Z
///
/// Returns `None` for instants before the epoch, which cannot be stored in an
/// unsigned pcap-ng timestamp.
pub fn micros_since_epoch(t: &DateTime<Utc>) -> Option<u64> {
    u64::try_from(t.timestamp_micros()).ok()
}

/// Split a 64-bit timestamp into its (high, low) 32-bit halves
#[inline]
pub fn split_ts(ts: u64) -> (u32, u32) {
    ((ts >> 32) as u32, ts as u32)
}

/// Compute the timestamp resolution, in units per second
///
/// Return the resolution, or `None` if the resolution is invalid (for ex. greater than `2^64`)
pub fn build_ts_resolution(ts_resol: u8) -> Option<u64> {
    let ts_mode = ts_resol & 0x80;
    let unit = if ts_mode == 0 {
        // 10^if_tsresol
        // check that if_tsresol <= 19 (10^19 is the largest power of 10 to fit in a u64)
        if ts_resol > 19 {
            return None;
        }
        10u64.pow(ts_resol as u32)
    } else {
        // 2^if_tsresol
        let exp = ts_resol & 0x7f;
        if exp > 63 {
            return None;
        }
        1u64 << exp
    };
    Some(unit)
}

/// Given the timestamp parameters, return the timestamp seconds and fractional part (in resolution
/// units)
pub fn build_ts(ts_high: u32, ts_low: u32, ts_offset: u64, resolution: u64) -> (u32, u32) {
    let ts: u64 = ((ts_high as u64) << 32) | (ts_low as u64);
    let ts_sec = (ts_offset + (ts / resolution)) as u32;
    let ts_fractional = (ts % resolution) as u32;
    (ts_sec, ts_fractional)
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use hex_literal::hex;

    use super::*;

    #[test]
    fn decode_ts() {
        // from https://datatracker.ietf.org/doc/html/draft-ietf-opsawg-pcapng section 4.6 (ISB)
        // '97 c3 04 00 aa 47 ca 64', in Little Endian, decodes to 2012-06-29 07:28:25.298858 UTC.
        const INPUT_HIGH: [u8; 4] = hex!("97 c3 04 00");
        const INPUT_LOW: [u8; 4] = hex!("aa 47 ca 64");
        let ts_high = u32::from_le_bytes(INPUT_HIGH);
        let ts_low = u32::from_le_bytes(INPUT_LOW);
        let resolution = build_ts_resolution(6).unwrap();

        let (ts_sec, ts_usec) = build_ts(ts_high, ts_low, 0, resolution);
        assert_eq!(ts_sec, 1_340_954_905);
        assert_eq!(ts_usec, 298_858);
    }

    #[test]
    fn encode_ts() {
        // same instant as `decode_ts`, going the other way
        let t = Utc
            .timestamp_opt(1_340_954_905, 298_858_000)
            .single()
            .unwrap();
        let micros = micros_since_epoch(&t).unwrap();
        let (ts_high, ts_low) = split_ts(micros);
        assert_eq!(ts_high.to_le_bytes(), hex!("97 c3 04 00"));
        assert_eq!(ts_low.to_le_bytes(), hex!("aa 47 ca 64"));
    }

    #[test]
    fn epoch_and_before() {
        let epoch = Utc.timestamp_opt(0, 0).single().unwrap();
        assert_eq!(micros_since_epoch(&epoch), Some(0));
        let before = Utc.timestamp_opt(-1, 0).single().unwrap();
        assert_eq!(micros_since_epoch(&before), None);
    }

    #[test]
    fn split_halves() {
        assert_eq!(split_ts(0x0000_0001_0000_0002), (1, 2));
        assert_eq!(split_ts(u64::MAX), (u32::MAX, u32::MAX));
    }
}

use rusticata_macros::align32;

use crate::error::{PcapNGWriteError, Result};
use crate::serialize::ToVec;

/// Round `n` up to the next multiple of 4 bytes
#[inline]
pub fn pad4(n: usize) -> usize {
    align32!(n)
}

/// Serialize a fixed-layout value into exactly `size` bytes (little-endian)
///
/// Every field is written at its documented offset by the value's `ToVec`
/// implementation. If the layout is shorter than `size`, the remaining bytes
/// are zero.
pub fn project_to_bytes<T: ToVec + ?Sized>(value: &T, size: usize) -> Result<Vec<u8>> {
    if size < 1 {
        return Err(PcapNGWriteError::InvalidArgument(format!(
            "size must be positive, got {}",
            size
        )));
    }
    let mut v = value.to_vec_raw()?;
    if v.len() > size {
        return Err(PcapNGWriteError::InvalidArgument(format!(
            "layout is {} bytes, does not fit in {}",
            v.len(),
            size
        )));
    }
    v.resize(size, 0);
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pcapng::CommentOption;

    #[test]
    fn pad4_values() {
        assert_eq!(pad4(0), 0);
        assert_eq!(pad4(1), 4);
        assert_eq!(pad4(3), 4);
        assert_eq!(pad4(4), 4);
        assert_eq!(pad4(5), 8);
        assert_eq!(pad4(1514), 1516);
    }

    #[test]
    fn project_rejects_zero_size() {
        let c = CommentOption::new("abc");
        let res = project_to_bytes(&c, 0);
        assert!(matches!(res, Err(PcapNGWriteError::InvalidArgument(_))));
    }

    #[test]
    fn project_zero_fills_tail() {
        let c = CommentOption::new("abc");
        let v = project_to_bytes(&c, 16).expect("projection");
        assert_eq!(v.len(), 16);
        assert_eq!(&v[..4], &[1, 0, 3, 0]);
        assert_eq!(&v[12..], &[0, 0, 0, 0]);
    }

    #[test]
    fn project_rejects_short_size() {
        let c = CommentOption::new("abcdef");
        assert!(project_to_bytes(&c, 8).is_err());
    }
}

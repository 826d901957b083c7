use std::borrow::Cow;

use nom::bytes::streaming::take;
use nom::combinator::{complete, map_res, verify};
use nom::error::{ErrorKind, ParseError};
use nom::multi::many0;
use nom::number::streaming::le_u16;
use nom::{Err, IResult};
use rusticata_macros::align32;

use crate::error::PcapNGParseError;
use crate::utils::pad4;

use super::OptionCode;

/// A raw option, as read back from a block
#[derive(Debug)]
pub struct PcapNGOption<'a> {
    pub code: OptionCode,
    pub len: u16,
    /// Option value, including padding
    pub value: &'a [u8],
}

impl<'a> PcapNGOption<'a> {
    /// Return the option value, using the `len` field to limit it, or None if length is invalid
    pub fn as_bytes(&self) -> Option<&'a [u8]> {
        let len = usize::from(self.len);
        if len <= self.value.len() {
            Some(&self.value[..len])
        } else {
            None
        }
    }
}

/// A free-text comment option (`opt_comment`), always followed by `opt_endofopt`
///
/// ```text
///  0                   1                   2                   3
///  0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Option Code = 1          |         Option Length         |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// /              UTF-8 text, padded to 32 bits                    /
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// |      Option Code = 0          |       Option Length = 0       |
/// +-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+-+
/// ```
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommentOption<'a> {
    text: Cow<'a, str>,
}

impl<'a> CommentOption<'a> {
    /// Create a comment option
    ///
    /// The option length is a 16-bit field: text longer than `u16::MAX` bytes is
    /// cut at the last character boundary that fits.
    pub fn new<S: Into<Cow<'a, str>>>(text: S) -> Self {
        let mut text = text.into();
        let max = usize::from(u16::MAX);
        if text.len() > max {
            let mut end = max;
            while !text.is_char_boundary(end) {
                end -= 1;
            }
            log::warn!(
                "comment of {} bytes truncated to {} bytes",
                text.len(),
                end
            );
            text = match text {
                Cow::Borrowed(s) => Cow::Borrowed(&s[..end]),
                Cow::Owned(mut s) => {
                    s.truncate(end);
                    Cow::Owned(s)
                }
            };
        }
        CommentOption { text }
    }

    #[inline]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Length of the text, without padding
    #[inline]
    pub fn value_len(&self) -> u16 {
        // bounded by the constructor
        self.text.len() as u16
    }

    /// Encoded length: option header, padded text and end-of-options marker
    #[inline]
    pub fn total_len(&self) -> usize {
        pad4(self.text.len()) + 8
    }

    pub fn into_owned(self) -> CommentOption<'static> {
        CommentOption {
            text: Cow::Owned(self.text.into_owned()),
        }
    }
}

/// Parse a pcap-ng Option (little-endian)
pub fn parse_option_le<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], PcapNGOption<'i>, E> {
    let (i, code) = le_u16(i)?;
    let (i, len) = le_u16(i)?;
    let (i, value) = take(align32!(len as u32))(i)?;
    let option = PcapNGOption {
        code: OptionCode(code),
        len,
        value,
    };
    Ok((i, option))
}

/// Parse a comment option followed by the end-of-options marker (little-endian)
pub fn parse_comment_option_le(
    i: &[u8],
) -> IResult<&[u8], CommentOption, PcapNGParseError<&[u8]>> {
    let (i, opt) = verify(parse_option_le, |o: &PcapNGOption| {
        o.code == OptionCode::Comment
    })(i)?;
    let (_, text) = map_res(take(opt.len), std::str::from_utf8)(opt.value)?;
    let (i, _) = verify(parse_option_le, |o: &PcapNGOption| {
        o.code == OptionCode::EndOfOpt && o.len == 0
    })(i)?;
    Ok((i, CommentOption::new(text)))
}

// Read the options area of a block, keeping the first comment
pub(crate) fn opt_parse_comment<'i, E: ParseError<&'i [u8]>>(
    i: &'i [u8],
) -> IResult<&'i [u8], Option<CommentOption<'i>>, E> {
    let (rem, options) = many0(complete(parse_option_le::<E>))(i)?;
    let comment = match options.iter().find(|o| o.code == OptionCode::Comment) {
        Some(opt) => {
            let text = opt
                .as_bytes()
                .and_then(|b| std::str::from_utf8(b).ok())
                .ok_or_else(|| Err::Error(E::from_error_kind(i, ErrorKind::Verify)))?;
            Some(CommentOption::new(text))
        }
        None => None,
    };
    Ok((rem, comment))
}

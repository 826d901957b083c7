use rusticata_macros::newtype_enum;

/// Data link type
///
/// The link-layer header type specifies the type of headers at the beginning
/// of the packet. Values outside the named constants are written verbatim.
///
/// See <http://www.tcpdump.org/linktypes.html>
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Linktype(pub i32);

newtype_enum! {
impl display Linktype {
    NULL = 0,
    ETHERNET = 1,

    RAW = 101,

    // IEEE 802.11 wireless LAN
    IEEE802_11 = 105,

    // 802.11 preceded by a radiotap header
    IEEE802_11_RADIOTAP = 127,
}
}

impl Default for Linktype {
    fn default() -> Self {
        Linktype::ETHERNET
    }
}

impl Linktype {
    /// Frame label used in the interface description comment
    ///
    /// Only 802.11 is recognized; every other value is labeled as Ethernet,
    /// including codes that are not Ethernet at all.
    pub fn frame_label(self) -> &'static str {
        match self {
            Linktype::IEEE802_11 => "802.11",
            _ => "Ethernet",
        }
    }
}

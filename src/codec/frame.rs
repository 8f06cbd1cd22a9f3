use std::fmt;
use std::str::FromStr;

use crate::dbc::types::errors::FrameParseError;

/// Extended frame format flag (bit 31 of the identifier).
pub const CAN_EFF_FLAG: u32 = 0x8000_0000;
/// Remote transmission request flag.
pub const CAN_RTR_FLAG: u32 = 0x4000_0000;
/// Error frame flag.
pub const CAN_ERR_FLAG: u32 = 0x2000_0000;
/// Standard frame format (11 bit).
pub const CAN_SFF_MASK: u32 = 0x0000_07FF;
/// Extended frame format (29 bit).
pub const CAN_EFF_MASK: u32 = 0x1FFF_FFFF;

/// Classic CAN data frame as received from the bus.
///
/// `id` follows the SocketCAN layout: arbitration ID in the low bits and
/// [`CAN_EFF_FLAG`] set for 29-bit identifiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CanFrame {
    id: u32,
    len: u8,
    data: [u8; 8],
}

impl CanFrame {
    /// Builds a frame from a flagged identifier. `None` if `data` holds more than 8 bytes.
    pub fn new(id: u32, data: &[u8]) -> Option<Self> {
        if data.len() > 8 {
            return None;
        }
        let mut buf: [u8; 8] = [0; 8];
        buf[..data.len()].copy_from_slice(data);
        Some(Self::from_register(id, buf, data.len()))
    }

    /// Frame over the first `len` bytes of `data` (at most 8).
    pub(crate) fn from_register(id: u32, mut data: [u8; 8], len: usize) -> Self {
        let len: usize = len.min(8);
        data[len..].fill(0);
        let id: u32 = if id & CAN_EFF_FLAG != 0 {
            CAN_EFF_FLAG | (id & CAN_EFF_MASK)
        } else {
            id & CAN_SFF_MASK
        };
        CanFrame {
            id,
            len: len as u8,
            data,
        }
    }

    pub fn standard(id: u16, data: &[u8]) -> Option<Self> {
        Self::new(id as u32 & CAN_SFF_MASK, data)
    }

    pub fn extended(id: u32, data: &[u8]) -> Option<Self> {
        Self::new((id & CAN_EFF_MASK) | CAN_EFF_FLAG, data)
    }

    /// Identifier including [`CAN_EFF_FLAG`] for extended frames.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Arbitration ID without flags.
    pub fn raw_id(&self) -> u32 {
        self.id & CAN_EFF_MASK
    }

    pub fn is_extended(&self) -> bool {
        self.id & CAN_EFF_FLAG != 0
    }

    pub fn data(&self) -> &[u8] {
        &self.data[..self.len as usize]
    }

    pub fn len(&self) -> usize {
        self.len as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl fmt::Display for CanFrame {
    /// candump notation: `123#DEADBEEF` or `18FEF100#01`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_extended() {
            write!(f, "{:08X}#", self.raw_id())?;
        } else {
            write!(f, "{:03X}#", self.raw_id())?;
        }
        for b in self.data() {
            write!(f, "{b:02X}")?;
        }
        Ok(())
    }
}

impl FromStr for CanFrame {
    type Err = FrameParseError;

    /// Parses candump notation. An identifier written with more than three hex digits
    /// (or above 0x7FF) is extended. Payload bytes may be separated by `.`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s: &str = s.trim();
        let (id_str, data_str) = s
            .split_once('#')
            .ok_or_else(|| FrameParseError::MissingSeparator(s.to_string()))?;

        let id: u32 = u32::from_str_radix(id_str, 16)
            .map_err(|_| FrameParseError::InvalidId(id_str.to_string()))?;
        let extended: bool = id_str.len() > 3 || id > CAN_SFF_MASK;
        if extended && id > CAN_EFF_MASK {
            return Err(FrameParseError::InvalidId(id_str.to_string()));
        }

        let hex: String = data_str.chars().filter(|c| *c != '.').collect();
        if hex.len() % 2 != 0 || !hex.is_ascii() {
            return Err(FrameParseError::InvalidData(data_str.to_string()));
        }
        let bytes: Vec<u8> = (0..hex.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&hex[i..i + 2], 16))
            .collect::<Result<_, _>>()
            .map_err(|_| FrameParseError::InvalidData(data_str.to_string()))?;
        if bytes.len() > 8 {
            return Err(FrameParseError::TooLong(bytes.len()));
        }

        let frame: Option<CanFrame> = if extended {
            CanFrame::extended(id, &bytes)
        } else {
            CanFrame::new(id, &bytes)
        };
        frame.ok_or(FrameParseError::TooLong(bytes.len()))
    }
}

// embedded_can integration (requires `can` feature)
#[cfg(feature = "can")]
impl embedded_can::Frame for CanFrame {
    fn new(id: impl Into<embedded_can::Id>, data: &[u8]) -> Option<Self> {
        match id.into() {
            embedded_can::Id::Standard(sid) => CanFrame::standard(sid.as_raw(), data),
            embedded_can::Id::Extended(eid) => CanFrame::extended(eid.as_raw(), data),
        }
    }

    fn new_remote(_id: impl Into<embedded_can::Id>, _dlc: usize) -> Option<Self> {
        None // remote frames carry no signals
    }

    fn is_extended(&self) -> bool {
        CanFrame::is_extended(self)
    }

    fn is_remote_frame(&self) -> bool {
        false
    }

    fn id(&self) -> embedded_can::Id {
        if CanFrame::is_extended(self) {
            embedded_can::ExtendedId::new(self.raw_id())
                .map(embedded_can::Id::Extended)
                .unwrap_or(embedded_can::Id::Extended(embedded_can::ExtendedId::ZERO))
        } else {
            embedded_can::StandardId::new(self.raw_id() as u16)
                .map(embedded_can::Id::Standard)
                .unwrap_or(embedded_can::Id::Standard(embedded_can::StandardId::ZERO))
        }
    }

    fn dlc(&self) -> usize {
        self.len()
    }

    fn data(&self) -> &[u8] {
        CanFrame::data(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_candump_notation() {
        let f: CanFrame = "064#10270000".parse().unwrap();
        assert!(!f.is_extended());
        assert_eq!(f.id(), 0x64);
        assert_eq!(f.data(), &[0x10, 0x27, 0x00, 0x00]);

        let f: CanFrame = "0CF00400#FF.FF.7D".parse().unwrap();
        assert!(f.is_extended());
        assert_eq!(f.id(), 0x8CF0_0400);
        assert_eq!(f.raw_id(), 0x0CF0_0400);
        assert_eq!(f.len(), 3);
        assert_eq!(f.to_string(), "0CF00400#FFFF7D");
    }

    #[test]
    fn rejects_malformed_frames() {
        assert!(matches!(
            "123DEAD".parse::<CanFrame>(),
            Err(FrameParseError::MissingSeparator(_))
        ));
        assert!(matches!(
            "XYZ#00".parse::<CanFrame>(),
            Err(FrameParseError::InvalidId(_))
        ));
        assert!(matches!(
            "123#0".parse::<CanFrame>(),
            Err(FrameParseError::InvalidData(_))
        ));
        assert!(matches!(
            "123#000000000000000000".parse::<CanFrame>(),
            Err(FrameParseError::TooLong(9))
        ));
    }

    #[test]
    fn empty_payload_is_allowed() {
        let f: CanFrame = "7FF#".parse().unwrap();
        assert!(f.is_empty());
        assert_eq!(f.to_string(), "7FF#");
    }

    #[cfg(feature = "can")]
    #[test]
    fn embedded_can_frame() {
        use embedded_can::{Frame, Id, StandardId};
        let id = StandardId::new(0x123).unwrap();
        let f = <CanFrame as Frame>::new(id, &[1, 2]).unwrap();
        assert_eq!(Frame::id(&f), Id::Standard(id));
        assert_eq!(f.dlc(), 2);
        assert!(!Frame::is_extended(&f));
    }
}

//! J1939 view of a 29-bit CAN identifier.
//!
//! ```text
//!  28..26   25   24   23..16   15..8   7..0
//! priority  EDP  DP     PF       PS     SA
//! ```
//!
//! PF < 240 is PDU1 (peer-to-peer): PS is the destination address and is not part of the PGN.
//! PF >= 240 is PDU2 (broadcast): PS is the group extension and belongs to the PGN.

use serde::{Deserialize, Serialize};

pub const PRIORITY_MASK: u32 = 0x1C00_0000;
pub const PRIORITY_POS: u32 = 26;
pub const EDP_MASK: u32 = 0x0200_0000;
pub const DP_MASK: u32 = 0x0100_0000;
pub const PF_MASK: u32 = 0x00FF_0000;
pub const PF_POS: u32 = 16;
pub const PS_MASK: u32 = 0x0000_FF00;
pub const PS_POS: u32 = 8;
pub const SA_MASK: u32 = 0x0000_00FF;

const PDU1_PGN_MASK: u32 = 0x03FF_0000;
const PDU2_PGN_MASK: u32 = 0x03FF_FF00;
const PGN_POS: u32 = 8;

/// First PDU format value of the broadcast (PDU2) range.
pub const PDU2_THRESHOLD: u8 = 240;
/// Global destination address.
pub const ADDRESS_GLOBAL: u8 = 0xFF;

/// Where a J1939 message is sent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Destination {
    Broadcast,
    Address(u8),
}

/// Fields of a 29-bit J1939 identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct J1939Id {
    pub priority: u8,
    pub extended_data_page: bool,
    pub data_page: bool,
    pub pdu_format: u8,
    pub pdu_specific: u8,
    /// Parameter group number (18 bits).
    pub pgn: u32,
    pub source_address: u8,
    pub destination: Destination,
}

impl J1939Id {
    /// `true` for the broadcast format (PF >= 240).
    pub fn is_pdu2(&self) -> bool {
        self.pdu_format >= PDU2_THRESHOLD
    }

    /// Rebuilds the 29-bit identifier.
    pub fn to_raw(&self) -> u32 {
        let edp: u32 = if self.extended_data_page { EDP_MASK } else { 0 };
        let dp: u32 = if self.data_page { DP_MASK } else { 0 };
        ((self.priority as u32 & 0x7) << PRIORITY_POS)
            | edp
            | dp
            | ((self.pdu_format as u32) << PF_POS)
            | ((self.pdu_specific as u32) << PS_POS)
            | self.source_address as u32
    }
}

/// Splits a CAN identifier into its J1939 fields. Bits above 28 are ignored.
pub fn decompose(id: u32) -> J1939Id {
    let pdu_format: u8 = ((id & PF_MASK) >> PF_POS) as u8;
    let pdu_specific: u8 = ((id & PS_MASK) >> PS_POS) as u8;
    let (pgn, destination) = if pdu_format >= PDU2_THRESHOLD {
        ((id & PDU2_PGN_MASK) >> PGN_POS, Destination::Broadcast)
    } else {
        let destination: Destination = match pdu_specific {
            ADDRESS_GLOBAL => Destination::Broadcast,
            da => Destination::Address(da),
        };
        ((id & PDU1_PGN_MASK) >> PGN_POS, destination)
    };
    J1939Id {
        priority: ((id & PRIORITY_MASK) >> PRIORITY_POS) as u8,
        extended_data_page: id & EDP_MASK != 0,
        data_page: id & DP_MASK != 0,
        pdu_format,
        pdu_specific,
        pgn,
        source_address: (id & SA_MASK) as u8,
        destination,
    }
}

/// Builds a 29-bit identifier. For PDU1 PGNs the destination fills PS
/// (broadcast meaning the global address); for PDU2 PGNs the destination is ignored.
pub fn compose(priority: u8, pgn: u32, source_address: u8, destination: Destination) -> u32 {
    let mut id: u32 = ((priority as u32 & 0x7) << PRIORITY_POS)
        | ((pgn << PGN_POS) & PDU2_PGN_MASK)
        | source_address as u32;
    let pdu_format: u8 = ((id & PF_MASK) >> PF_POS) as u8;
    if pdu_format < PDU2_THRESHOLD {
        let da: u8 = match destination {
            Destination::Broadcast => ADDRESS_GLOBAL,
            Destination::Address(a) => a,
        };
        id = (id & !PS_MASK) | ((da as u32) << PS_POS);
    }
    id
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pdu2_broadcast() {
        // EEC1 from the engine: priority 3, PGN 61444, SA 0
        let id = decompose(0x0CF0_0400);
        assert_eq!(id.priority, 3);
        assert_eq!(id.pgn, 0xF004);
        assert_eq!(id.pdu_format, 0xF0);
        assert_eq!(id.pdu_specific, 0x04);
        assert_eq!(id.source_address, 0x00);
        assert_eq!(id.destination, Destination::Broadcast);
        assert!(id.is_pdu2());
    }

    #[test]
    fn pdu1_peer_to_peer() {
        // Request PGN 59904 from 0xF9 to 0x17
        let id = decompose(0x18EA_17F9);
        assert_eq!(id.priority, 6);
        assert_eq!(id.pgn, 0xEA00);
        assert_eq!(id.destination, Destination::Address(0x17));
        assert_eq!(id.source_address, 0xF9);
        assert!(!id.is_pdu2());
    }

    #[test]
    fn pdu1_to_global_address_is_broadcast() {
        let id = decompose(0x18EA_FFF9);
        assert_eq!(id.pgn, 0xEA00);
        assert_eq!(id.destination, Destination::Broadcast);
    }

    #[test]
    fn data_page_bits_belong_to_pgn() {
        let id = decompose(0x1BFE_CA00);
        assert!(id.data_page);
        assert!(id.extended_data_page);
        assert_eq!(id.pgn, 0x3FECA);
    }

    #[test]
    fn compose_inverts_decompose() {
        for raw in [0x0CF0_0400, 0x18EA_17F9, 0x18EA_FFF9, 0x1BFE_CA00] {
            let id = decompose(raw);
            assert_eq!(id.to_raw(), raw);
            assert_eq!(
                compose(id.priority, id.pgn, id.source_address, id.destination),
                raw
            );
        }
    }

    #[test]
    fn flag_bits_are_ignored() {
        assert_eq!(decompose(0x8CF0_0400), decompose(0x0CF0_0400));
    }
}

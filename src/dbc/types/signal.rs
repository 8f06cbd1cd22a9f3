use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::codec::register::PayloadRegister;
use crate::dbc::types::{
    attributes::AttributeValue,
    database::MessageKey,
    message::MuxRole,
    names::Symbol,
    value_table::ValueTable,
};

/// Bit numbering declared by the `@0`/`@1` marker of a `SG_` line.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum ByteOrder {
    /// `@0`, "Motorola": the start bit is the most significant bit of the field.
    BigEndian,
    /// `@1`, "Intel": the start bit is the least significant bit of the field.
    #[default]
    LittleEndian,
}

/// How the raw field is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalKind {
    #[default]
    Unsigned,
    Signed,
    /// Declared real by `SIG_VALTYPE_`; still carried as a scaled integer field.
    Float,
    /// Has a value table; the raw code is looked up instead of scaled.
    Enumerated,
}

/// 64-bit view of the payload a field is read from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Register {
    /// `u64::from_le_bytes(payload)`: payload bit `8*b + k` is register bit `8*b + k`.
    #[default]
    Le,
    /// `u64::from_be_bytes(payload)`: payload bit `8*b + k` is register bit `56 - 8*b + k`.
    Be,
}

/// Precomputed position of a signal's bits inside a [`PayloadRegister`].
///
/// The field is `width` bits starting at register bit `lsb`. `pad` low-order bits of the
/// declared length fall outside the register (malformed Motorola fields) and read as zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BitLayout {
    pub register: Register,
    pub lsb: u8,
    pub width: u8,
    pub pad: u8,
}

impl BitLayout {
    /// Computes the layout of a field from its stored start bit.
    ///
    /// With `reverse_bit_order` the start bit of a big-endian field has already been moved
    /// to its least significant bit, so the field is read like an Intel one.
    pub fn new(
        start_bit: u16,
        bit_length: u16,
        byte_order: ByteOrder,
        reverse_bit_order: bool,
    ) -> BitLayout {
        if start_bit >= 64 || bit_length == 0 {
            return BitLayout::default();
        }
        let len: u16 = bit_length.min(64);
        match (byte_order, reverse_bit_order) {
            (ByteOrder::LittleEndian, _) | (ByteOrder::BigEndian, true) => BitLayout {
                register: Register::Le,
                lsb: start_bit as u8,
                width: len.min(64 - start_bit) as u8,
                pad: 0,
            },
            (ByteOrder::BigEndian, false) => {
                // msb of the field in the big-endian register
                let msb: u16 = 56 - 8 * (start_bit / 8) + start_bit % 8;
                if len - 1 <= msb {
                    BitLayout {
                        register: Register::Be,
                        lsb: (msb - (len - 1)) as u8,
                        width: len as u8,
                        pad: 0,
                    }
                } else {
                    BitLayout {
                        register: Register::Be,
                        lsb: 0,
                        width: (msb + 1) as u8,
                        pad: (len - 1 - msb) as u8,
                    }
                }
            }
        }
    }

    /// Mask of the payload bits this field reads, indexed as `8 * byte + bit`.
    pub fn occupied_bits(&self) -> u64 {
        let m: u64 = low_mask(self.width as u32) << self.lsb;
        match self.register {
            Register::Le => m,
            Register::Be => m.swap_bytes(),
        }
    }

    /// Payload bit span `[lo, hi)` when the occupied bits are contiguous.
    pub fn contiguous_span(&self) -> Option<(u32, u32)> {
        let bits: u64 = self.occupied_bits();
        if bits == 0 {
            return None;
        }
        let lo: u32 = bits.trailing_zeros();
        let hi: u32 = 64 - bits.leading_zeros();
        (bits >> lo == low_mask(hi - lo)).then_some((lo, hi))
    }
}

/// `n` low bits set.
pub(crate) fn low_mask(n: u32) -> u64 {
    if n >= 64 { u64::MAX } else { (1u64 << n) - 1 }
}

/// Signal declared by a `SG_` line.
#[derive(Clone, PartialEq, Debug)]
pub struct Signal {
    /// Signal name.
    pub name: Symbol,
    /// Owning message.
    pub message: MessageKey,
    /// Start bit as stored (after the optional reverse-bit-order adjustment).
    pub start_bit: u16,
    /// Field width in bits (1..=64).
    pub bit_length: u16,
    pub byte_order: ByteOrder,
    /// `-` sign marker: the raw field is two's complement.
    pub signed: bool,
    pub kind: SignalKind,
    /// physical = raw * factor + offset
    pub factor: f64,
    pub offset: f64,
    pub min: f64,
    pub max: f64,
    /// Unit string, possibly empty.
    pub unit: String,
    pub mux: MuxRole,
    /// Receiving nodes, as written.
    pub receivers: Vec<Symbol>,
    /// Enumeration from `VAL_`.
    pub value_table: Option<ValueTable>,
    /// Associated comment (`CM_ SG_`).
    pub comment: Option<String>,

    // --- Signal Attribute Entry ---
    pub attributes: BTreeMap<Symbol, AttributeValue>,

    pub(crate) layout: BitLayout,
}

impl Signal {
    /// Recomputes the register layout from `start_bit`, `bit_length` and `byte_order`.
    pub(crate) fn compile_layout(&mut self, reverse_bit_order: bool) {
        self.layout = BitLayout::new(
            self.start_bit,
            self.bit_length,
            self.byte_order,
            reverse_bit_order,
        );
    }

    pub fn layout(&self) -> BitLayout {
        self.layout
    }

    /// Reads the unsigned raw field.
    pub fn extract_raw_u64(&self, reg: &PayloadRegister) -> u64 {
        let l: BitLayout = self.layout;
        if l.width == 0 {
            return 0;
        }
        let word: u64 = match l.register {
            Register::Le => reg.le(),
            Register::Be => reg.be(),
        };
        ((word >> l.lsb) & low_mask(l.width as u32)) << l.pad
    }

    /// Reads the raw field, sign-extending it when the signal is signed.
    ///
    /// Widened to `i128` so the full range of an unsigned 64-bit field stays positive.
    pub fn extract_raw(&self, reg: &PayloadRegister) -> i128 {
        let raw_u: u64 = self.extract_raw_u64(reg);
        if !self.signed {
            return raw_u as i128;
        }
        let n: u32 = (self.bit_length as u32).clamp(1, 64);
        let sign_bit: u64 = 1u64 << (n - 1);
        if n < 64 && raw_u & sign_bit != 0 {
            (raw_u | !low_mask(n)) as i64 as i128
        } else {
            raw_u as i64 as i128
        }
    }

    /// Writes `raw` (already fitted to the bit width) into the register, leaving every
    /// other bit untouched.
    pub fn insert_raw(&self, reg: &mut PayloadRegister, raw: u64) {
        let l: BitLayout = self.layout;
        if l.width == 0 {
            return;
        }
        let field_mask: u64 = low_mask(l.width as u32) << l.lsb;
        let field: u64 = ((raw >> l.pad) << l.lsb) & field_mask;
        match l.register {
            Register::Le => reg.set_le((reg.le() & !field_mask) | field),
            Register::Be => reg.set_be((reg.be() & !field_mask) | field),
        }
    }

    /// Scales a raw value: `raw * factor + offset`.
    pub fn to_physical(&self, raw: i128) -> f64 {
        raw as f64 * self.factor + self.offset
    }

    /// Range of raw values the field can hold.
    pub fn raw_bounds(&self) -> (i128, i128) {
        let n: u32 = (self.bit_length as u32).clamp(1, 64);
        if self.signed {
            (-(1i128 << (n - 1)), (1i128 << (n - 1)) - 1)
        } else {
            (0, (1i128 << n) - 1)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intel_layout_is_plain_offset() {
        let l = BitLayout::new(4, 12, ByteOrder::LittleEndian, false);
        assert_eq!(l.register, Register::Le);
        assert_eq!((l.lsb, l.width, l.pad), (4, 12, 0));
        assert_eq!(l.occupied_bits(), 0xFFF0);
        assert_eq!(l.contiguous_span(), Some((4, 16)));
    }

    #[test]
    fn motorola_layout_spans_bytes_msb_first() {
        // start bit 7, 16 bits: byte 0 is the high byte, byte 1 the low byte
        let l = BitLayout::new(7, 16, ByteOrder::BigEndian, false);
        assert_eq!(l.register, Register::Be);
        assert_eq!((l.lsb, l.width), (48, 16));
        assert_eq!(l.occupied_bits(), 0xFFFF);

        // start bit 3, 12 bits: low nibble of byte 0 and all of byte 1
        let l = BitLayout::new(3, 12, ByteOrder::BigEndian, false);
        assert_eq!(l.occupied_bits(), 0xFF0F);
        assert_eq!(l.contiguous_span(), None);
    }

    #[test]
    fn motorola_running_off_the_frame_is_padded() {
        // start bit 58 (byte 7, bit 2), 8 bits: only 3 bits remain below
        let l = BitLayout::new(58, 8, ByteOrder::BigEndian, false);
        assert_eq!((l.lsb, l.width, l.pad), (0, 3, 5));
    }

    #[test]
    fn reversed_motorola_reads_like_intel() {
        let l = BitLayout::new(0, 8, ByteOrder::BigEndian, true);
        assert_eq!(l, BitLayout::new(0, 8, ByteOrder::LittleEndian, false));
    }

    #[test]
    fn start_bit_past_register_reads_nothing() {
        let l = BitLayout::new(64, 4, ByteOrder::LittleEndian, false);
        assert_eq!(l.width, 0);
        assert_eq!(l.occupied_bits(), 0);
    }

    #[test]
    fn unsigned_64_bit_field_stays_positive() {
        let mut reg = PayloadRegister::new(&[0xFF; 8], 8);
        let mut s = Signal {
            name: crate::dbc::types::names::Interner::default().intern("Big"),
            message: MessageKey::default(),
            start_bit: 0,
            bit_length: 64,
            byte_order: ByteOrder::LittleEndian,
            signed: false,
            kind: SignalKind::Unsigned,
            factor: 1.0,
            offset: 0.0,
            min: 0.0,
            max: 0.0,
            unit: String::new(),
            mux: MuxRole::None,
            receivers: Vec::new(),
            value_table: None,
            comment: None,
            attributes: BTreeMap::new(),
            layout: BitLayout::default(),
        };
        s.compile_layout(false);
        assert_eq!(s.extract_raw(&reg), u64::MAX as i128);
        assert!(s.to_physical(s.extract_raw(&reg)) > 1.8e19);

        s.signed = true;
        assert_eq!(s.extract_raw(&reg), -1);

        s.signed = false;
        s.insert_raw(&mut reg, 1 << 63);
        assert_eq!(s.extract_raw(&reg), 1i128 << 63);
    }
}

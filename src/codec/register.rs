/// The first bytes of a frame payload, seen as one 64-bit register.
///
/// Only `min(payload.len(), byte_length, 8)` bytes are ever copied in or written back;
/// the remaining bytes of the register stay zero.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PayloadRegister {
    bytes: [u8; 8],
    len: usize,
}

impl PayloadRegister {
    pub fn new(payload: &[u8], byte_length: u8) -> Self {
        let len: usize = payload.len().min(byte_length as usize).min(8);
        let mut bytes: [u8; 8] = [0; 8];
        bytes[..len].copy_from_slice(&payload[..len]);
        PayloadRegister { bytes, len }
    }

    /// Little-endian view: payload byte 0 is the least significant byte.
    pub fn le(&self) -> u64 {
        u64::from_le_bytes(self.bytes)
    }

    /// Big-endian view: payload byte 0 is the most significant byte.
    pub fn be(&self) -> u64 {
        u64::from_be_bytes(self.bytes)
    }

    pub fn set_le(&mut self, word: u64) {
        self.bytes = word.to_le_bytes();
        self.bytes[self.len..].fill(0);
    }

    pub fn set_be(&mut self, word: u64) {
        self.bytes = word.to_be_bytes();
        self.bytes[self.len..].fill(0);
    }

    /// Addressable bytes.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn never_reads_past_declared_length() {
        let reg = PayloadRegister::new(&[0x11, 0x22, 0x33, 0x44], 2);
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.le(), 0x2211);
        assert_eq!(reg.be(), 0x1122_0000_0000_0000);
    }

    #[test]
    fn short_payload_is_zero_padded() {
        let reg = PayloadRegister::new(&[0xAB], 8);
        assert_eq!(reg.le(), 0xAB);
        assert_eq!(reg.bytes(), &[0xAB]);
    }

    #[test]
    fn writes_are_clipped_to_length() {
        let mut reg = PayloadRegister::new(&[0, 0], 8);
        reg.set_le(u64::MAX);
        assert_eq!(reg.le(), 0xFFFF);
        reg.set_be(u64::MAX);
        assert_eq!(reg.bytes(), &[0xFF, 0xFF]);
    }
}

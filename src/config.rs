//! Parser configuration.

/// Options applied once while a DBC file is parsed.
///
/// ```
/// use dbc_tools::ParseOptions;
///
/// let opts = ParseOptions::new().with_reverse_bit_order(true).with_verbose(false);
/// assert!(opts.reverse_bit_order);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ParseOptions {
    /// Store big-endian start bits as the field's least significant bit
    /// (`start - (length - 1)`) and read those fields with Intel numbering.
    pub reverse_bit_order: bool,
    /// Echo every accepted record at `info` level instead of `trace`.
    pub verbose: bool,
}

impl ParseOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reverse_bit_order(mut self, enabled: bool) -> Self {
        self.reverse_bit_order = enabled;
        self
    }

    pub fn with_verbose(mut self, enabled: bool) -> Self {
        self.verbose = enabled;
        self
    }
}

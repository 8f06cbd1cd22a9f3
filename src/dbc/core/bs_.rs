use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{database::Network, errors::RecordError};

/// Decode the bit timing line.
/// Example: `BS_: 500000 : 1,2` (the baud rate part is optional).
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("BS_")?.expect(':', "':'")?;
    if c.at_end() {
        return Ok(());
    }
    let (_, baudrate) = c.uint()?;
    net.baudrate = u32::try_from(baudrate)
        .map_err(|_| RecordError::Invalid(format!("baud rate {baudrate} out of range")))?;
    ctx.echo(format_args!("BS_: {baudrate}"));
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::dbc::parse::from_str;

    #[test]
    fn baudrate_with_btr() {
        let net = from_str("BS_: 500000 : 1,2\n", &Default::default());
        assert_eq!(net.baudrate, 500000);
        assert!(net.diagnostics().is_empty());
    }

    #[test]
    fn empty_bit_timing() {
        let net = from_str("BS_:\n", &Default::default());
        assert_eq!(net.baudrate, 0);
        assert!(net.diagnostics().is_empty());
    }
}

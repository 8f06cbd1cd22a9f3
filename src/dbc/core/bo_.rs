use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{database::Network, errors::RecordError};

/// Largest payload of a classic CAN frame.
const MAX_BYTE_LENGTH: u64 = 8;

/// Decode a message header and make it the current message for the following `SG_` lines.
/// Example: `BO_ 100 EngineData: 8 ECU`
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let c: Cursor<'_> = Cursor::new(line).keyword("BO_")?;
    let (c, id) = c.uint()?;
    let (c, name) = c.identifier()?;
    let c: Cursor<'_> = c.expect(':', "':'")?;
    let (c, byte_length) = c.uint()?;
    let (_, transmitter) = c.identifier()?;

    let id: u32 = u32::try_from(id)
        .map_err(|_| RecordError::Invalid(format!("message id {id} does not fit 32 bits")))?;
    if byte_length > MAX_BYTE_LENGTH {
        return Err(RecordError::Invalid(format!(
            "byte length {byte_length} exceeds {MAX_BYTE_LENGTH}"
        )));
    }

    let key = net.insert_message(id, name, byte_length as u8, transmitter, Some(ctx.line));
    ctx.current_msg = Some(key);
    ctx.echo(format_args!("BO_ {id} {name} : {byte_length} {transmitter}"));
    Ok(())
}

use crate::dbc::core::cursor::Cursor;
use crate::dbc::parse::ParseContext;
use crate::dbc::types::{database::Network, errors::RecordError};

/// Decode the version line.
/// Example: `VERSION "1.0"`
pub(crate) fn decode(
    net: &mut Network,
    ctx: &mut ParseContext<'_>,
    line: &str,
) -> Result<(), RecordError> {
    let (_, version) = Cursor::new(line).keyword("VERSION")?.quoted()?;
    ctx.echo(format_args!("VERSION \"{version}\""));
    net.version = version;
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::dbc::parse::from_str;

    #[test]
    fn version_string() {
        let net = from_str("VERSION \"HIPBNYYYYYYYYYYYYYYYYYYYYYYYYYYYNNNNNNNNNN/4/%%%/4/'%**4NNN///\"\n", &Default::default());
        assert!(net.version.starts_with("HIPBN"));
        let net = from_str("VERSION \"\"\n", &Default::default());
        assert_eq!(net.version, "");
    }
}

// Token cursor shared by the record decoders.
//
// A `Cursor` is a position inside one record line. Every reader consumes one token,
// skips the whitespace after it and returns the advanced cursor with the value, so
// decoders chain calls with `?` and never backtrack.

use crate::dbc::types::errors::RecordError;

#[derive(Clone, Copy, Debug)]
pub(crate) struct Cursor<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Cursor { src, pos: 0 }.skip_spaces()
    }

    pub(crate) fn rest(&self) -> &'a str {
        &self.src[self.pos..]
    }

    /// 1-based column, for error messages.
    pub(crate) fn column(&self) -> usize {
        self.pos + 1
    }

    pub(crate) fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Nothing left except whitespace and an optional `;`.
    pub(crate) fn at_end(&self) -> bool {
        let rest: &str = self.rest().trim();
        rest.is_empty() || rest == ";"
    }

    pub(crate) fn skip_spaces(self) -> Self {
        let rest: &str = self.rest();
        let trimmed: &str = rest.trim_start();
        Cursor {
            src: self.src,
            pos: self.pos + (rest.len() - trimmed.len()),
        }
    }

    fn advance(self, n: usize) -> Self {
        Cursor {
            src: self.src,
            pos: self.pos + n,
        }
        .skip_spaces()
    }

    fn expected(&self, expected: &'static str) -> RecordError {
        RecordError::Expected {
            expected,
            column: self.column(),
        }
    }

    /// Consumes the single character `ch`.
    pub(crate) fn expect(self, ch: char, what: &'static str) -> Result<Self, RecordError> {
        if self.peek() == Some(ch) {
            Ok(self.advance(ch.len_utf8()))
        } else {
            Err(self.expected(what))
        }
    }

    /// Consumes `ch` if present.
    pub(crate) fn eat(self, ch: char) -> (Self, bool) {
        if self.peek() == Some(ch) {
            (self.advance(ch.len_utf8()), true)
        } else {
            (self, false)
        }
    }

    /// Consumes the keyword `kw`, which must end at a non-identifier character.
    pub(crate) fn keyword(self, kw: &'static str) -> Result<Self, RecordError> {
        let rest: &str = self.rest();
        let boundary: bool = rest
            .get(kw.len()..)
            .and_then(|r| r.chars().next())
            .is_none_or(|c| !is_ident_char(c));
        if rest.starts_with(kw) && boundary {
            Ok(self.advance(kw.len()))
        } else {
            Err(self.expected(kw))
        }
    }

    /// C identifier: `[A-Za-z_][A-Za-z0-9_]*`.
    pub(crate) fn identifier(self) -> Result<(Self, &'a str), RecordError> {
        let rest: &str = self.rest();
        match rest.chars().next() {
            Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
            _ => return Err(self.expected("identifier")),
        }
        let len: usize = rest.find(|c: char| !is_ident_char(c)).unwrap_or(rest.len());
        Ok((self.advance(len), &rest[..len]))
    }

    /// Double-quoted string. `\"` and `\\` are unescaped; the string may contain newlines.
    pub(crate) fn quoted(self) -> Result<(Self, String), RecordError> {
        let rest: &str = self.rest();
        if !rest.starts_with('"') {
            return Err(self.expected("quoted string"));
        }
        let mut out: String = String::new();
        let mut escaped: bool = false;
        for (i, ch) in rest.char_indices().skip(1) {
            if escaped {
                if ch != '"' && ch != '\\' {
                    out.push('\\');
                }
                out.push(ch);
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                return Ok((self.advance(i + 1), out));
            } else {
                out.push(ch);
            }
        }
        Err(RecordError::UnterminatedString {
            column: self.column(),
        })
    }

    /// Unsigned decimal integer.
    pub(crate) fn uint(self) -> Result<(Self, u64), RecordError> {
        let rest: &str = self.rest();
        let len: usize = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        if len == 0 {
            return Err(self.expected("unsigned integer"));
        }
        let text: &str = &rest[..len];
        let value: u64 = text.parse().map_err(|_| self.invalid_number(text))?;
        Ok((self.advance(len), value))
    }

    /// Signed decimal integer.
    pub(crate) fn int(self) -> Result<(Self, i64), RecordError> {
        let rest: &str = self.rest();
        let sign_len: usize = usize::from(rest.starts_with(['-', '+']));
        let digits: usize = rest[sign_len..]
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len() - sign_len);
        if digits == 0 {
            return Err(self.expected("integer"));
        }
        let text: &str = &rest[..sign_len + digits];
        let value: i64 = text.parse().map_err(|_| self.invalid_number(text))?;
        Ok((self.advance(sign_len + digits), value))
    }

    /// Decimal floating point number; integers are accepted.
    pub(crate) fn float(self) -> Result<(Self, f64), RecordError> {
        let rest: &str = self.rest();
        let bytes: &[u8] = rest.as_bytes();
        let mut i: usize = 0;
        if i < bytes.len() && (bytes[i] == b'-' || bytes[i] == b'+') {
            i += 1;
        }
        let int_start: usize = i;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
        let mut mantissa_digits: usize = i - int_start;
        if i < bytes.len() && bytes[i] == b'.' {
            i += 1;
            let frac_start: usize = i;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
            mantissa_digits += i - frac_start;
        }
        if mantissa_digits == 0 {
            return Err(self.expected("number"));
        }
        if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
            let mut j: usize = i + 1;
            if j < bytes.len() && (bytes[j] == b'-' || bytes[j] == b'+') {
                j += 1;
            }
            let exp_start: usize = j;
            while j < bytes.len() && bytes[j].is_ascii_digit() {
                j += 1;
            }
            if j > exp_start {
                i = j;
            }
        }
        let text: &str = &rest[..i];
        let value: f64 = text.parse().map_err(|_| self.invalid_number(text))?;
        Ok((self.advance(i), value))
    }

    fn invalid_number(&self, text: &str) -> RecordError {
        RecordError::InvalidNumber {
            text: text.to_string(),
            column: self.column(),
        }
    }
}

pub(crate) fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `true` if `name` can be used verbatim as a C identifier.
pub(crate) fn is_c_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => chars.all(is_ident_char),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chains_tokens_and_skips_spaces() {
        let c = Cursor::new("  BO_ 100   EngineData : 8 ECU");
        let c = c.keyword("BO_").unwrap();
        let (c, id) = c.uint().unwrap();
        let (c, name) = c.identifier().unwrap();
        let c = c.expect(':', "':'").unwrap();
        let (c, dlc) = c.uint().unwrap();
        let (c, tx) = c.identifier().unwrap();
        assert_eq!((id, name, dlc, tx), (100, "EngineData", 8, "ECU"));
        assert!(c.at_end());
    }

    #[test]
    fn keyword_needs_a_boundary() {
        assert!(Cursor::new("BA_DEF_ x").keyword("BA_").is_err());
        assert!(Cursor::new("BA_ x").keyword("BA_").is_ok());
        assert!(Cursor::new("BU_:").keyword("BU_").is_ok());
    }

    #[test]
    fn numbers() {
        let (c, v) = Cursor::new("-12|").int().unwrap();
        assert_eq!(v, -12);
        assert_eq!(c.peek(), Some('|'));

        let (_, v) = Cursor::new("0.25,0)").float().unwrap();
        assert_eq!(v, 0.25);
        let (_, v) = Cursor::new("1E+3]").float().unwrap();
        assert_eq!(v, 1000.0);
        let (_, v) = Cursor::new("-5").float().unwrap();
        assert_eq!(v, -5.0);
        let (c, v) = Cursor::new("3e").float().unwrap();
        assert_eq!(v, 3.0);
        assert_eq!(c.peek(), Some('e'));

        assert!(Cursor::new("abc").uint().is_err());
        assert!(Cursor::new("-").int().is_err());
        assert!(Cursor::new(".").float().is_err());
    }

    #[test]
    fn quoted_strings() {
        let (c, s) = Cursor::new(r#""say \"hi\"" ;"#).quoted().unwrap();
        assert_eq!(s, "say \"hi\"");
        assert!(c.at_end());

        let (_, s) = Cursor::new("\"two\nlines\"").quoted().unwrap();
        assert_eq!(s, "two\nlines");

        let (_, s) = Cursor::new("\"\"").quoted().unwrap();
        assert_eq!(s, "");

        assert!(matches!(
            Cursor::new("\"open").quoted(),
            Err(RecordError::UnterminatedString { column: 1 })
        ));
    }

    #[test]
    fn c_identifiers() {
        assert!(is_c_identifier("Engine_Speed2"));
        assert!(is_c_identifier("_x"));
        assert!(!is_c_identifier("2fast"));
        assert!(!is_c_identifier("Motordrehzahl_ü"));
        assert!(!is_c_identifier(""));
    }
}

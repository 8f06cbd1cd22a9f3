use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use encoding_rs::WINDOWS_1252;
use log::{debug, info, trace};

use crate::config::ParseOptions;
use crate::dbc::core::{self, cursor::is_ident_char, strings::has_open_quoted_segment};
use crate::dbc::layout;
use crate::dbc::types::{
    database::{MessageKey, Network},
    diagnostics::DiagnosticKind,
    errors::{DbcParseError, RecordError},
};

/// State threaded through the record decoders during one parse.
pub(crate) struct ParseContext<'o> {
    pub(crate) options: &'o ParseOptions,
    /// 1-based line number of the record being decoded.
    pub(crate) line: usize,
    /// Message the following `SG_` lines belong to (the last `BO_`).
    pub(crate) current_msg: Option<MessageKey>,
}

impl ParseContext<'_> {
    /// Echoes an accepted record: `info` in verbose mode, `trace` otherwise.
    pub(crate) fn echo(&self, args: fmt::Arguments<'_>) {
        if self.options.verbose {
            info!("{args}");
        } else {
            trace!("{args}");
        }
    }
}

/// Parses a DBC file and returns the populated [`Network`].
///
/// The file is read line by line. Lines that are not valid UTF-8 are decoded as
/// Windows-1252, which is what most legacy Vector exports use.
///
/// Only file-level failures are errors. Malformed records, dangling references and
/// layout problems are recorded in [`Network::diagnostics`] and the parse goes on.
///
/// # Errors
/// - [`DbcParseError::InvalidExtension`] if the path does not end in `.dbc`,
/// - [`DbcParseError::OpenFile`] / [`DbcParseError::Read`] on I/O failures.
///
/// # Example
/// ```no_run
/// use dbc_tools::{ParseOptions, dbc};
///
/// let net = dbc::parse::from_file("engine.dbc", &ParseOptions::default()).unwrap();
/// println!("{} messages", net.message_count());
/// ```
pub fn from_file(path: &str, options: &ParseOptions) -> Result<Network, DbcParseError> {
    let has_dbc_extension: bool = Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("dbc"));
    if !has_dbc_extension {
        return Err(DbcParseError::InvalidExtension {
            path: path.to_string(),
        });
    }

    let file: File = File::open(path).map_err(|source| DbcParseError::OpenFile {
        path: path.to_string(),
        source,
    })?;
    let mut reader: BufReader<File> = BufReader::new(file);

    let mut lines: Vec<String> = Vec::new();
    let mut raw_line: Vec<u8> = Vec::with_capacity(256);
    loop {
        raw_line.clear();
        let read: usize = reader
            .read_until(b'\n', &mut raw_line)
            .map_err(|source| DbcParseError::Read {
                path: path.to_string(),
                source,
            })?;
        if read == 0 {
            break;
        }
        let mut line: String = match std::str::from_utf8(&raw_line) {
            Ok(s) => s.to_string(),
            Err(_) => WINDOWS_1252.decode(&raw_line).0.into_owned(),
        };
        // trim trailing CR/LF to behave like .lines()
        while line.ends_with(['\n', '\r']) {
            line.pop();
        }
        lines.push(line);
    }
    debug!("read {} lines from {path}", lines.len());

    Ok(parse_lines(lines.iter().map(String::as_str), options))
}

/// Parses DBC text already in memory. Never fails; see [`from_file`] for diagnostics.
pub fn from_str(text: &str, options: &ParseOptions) -> Network {
    parse_lines(text.lines(), options)
}

fn parse_lines<'a, I>(lines: I, options: &ParseOptions) -> Network
where
    I: Iterator<Item = &'a str>,
{
    let mut net: Network = Network::default();
    let mut ctx: ParseContext<'_> = ParseContext {
        options,
        line: 0,
        current_msg: None,
    };

    let mut lines = lines.enumerate().map(|(i, l)| (i + 1, l.trim_start()));
    while let Some((line_no, line)) = lines.next() {
        // skip comments and empty lines
        if line.is_empty() || line.starts_with("//") {
            continue;
        }
        // lone keywords, e.g. the symbol list of the NS_ block
        if line.trim_end().chars().all(is_ident_char) {
            continue;
        }

        let keyword_len: usize = line.find(|c: char| !is_ident_char(c)).unwrap_or(line.len());
        let keyword: &str = &line[..keyword_len];
        ctx.line = line_no;

        let result: Result<(), RecordError> = match keyword {
            "VERSION" => core::version::decode(&mut net, &mut ctx, line),
            "BS_" => core::bs_::decode(&mut net, &mut ctx, line),
            "BU_" => core::bu_::decode(&mut net, &mut ctx, line),
            "BO_" => {
                // a malformed header must not leave its signals on the previous message
                ctx.current_msg = None;
                core::bo_::decode(&mut net, &mut ctx, line)
            }
            "SG_" => core::sg_::decode(&mut net, &mut ctx, line),
            "CM_" => {
                // accumulate while a quoted text is left open
                let mut record: String = line.to_string();
                while has_open_quoted_segment(&record) {
                    let Some((_, next)) = lines.next() else {
                        break;
                    };
                    record.push('\n');
                    record.push_str(next);
                }
                core::cm_::decode(&mut net, &mut ctx, &record)
            }
            "BA_DEF_" => core::ba_def_::decode(&mut net, &mut ctx, line),
            "BA_DEF_DEF_" => core::ba_def_def_::decode(&mut net, &mut ctx, line),
            "BA_" => core::ba_::decode(&mut net, &mut ctx, line),
            "VAL_" => core::val_::decode(&mut net, &mut ctx, line),
            "SIG_VALTYPE_" => core::sig_valtype_::decode(&mut net, &mut ctx, line),
            other => {
                trace!("line {line_no}: ignoring record '{other}'");
                Ok(())
            }
        };

        if let Err(reason) = result {
            net.report(
                Some(line_no),
                DiagnosticKind::MalformedRecord {
                    keyword: keyword.to_string(),
                    reason: reason.to_string(),
                },
            );
        }
    }

    layout::validate(&mut net);
    debug!(
        "parsed {} nodes, {} messages, {} signals ({} diagnostics)",
        net.node_count(),
        net.message_count(),
        net.signal_count(),
        net.diagnostics().len()
    );
    net
}

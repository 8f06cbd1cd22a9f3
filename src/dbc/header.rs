//! C header generation.
//!
//! The header lists, in this order: the node enum, the message enum, value tables,
//! per-signal macros and one bit-field struct per message. Messages are always walked in
//! ascending identifier order and signals in ascending bit position, so the same network
//! gives byte-identical output.

use log::warn;
use std::collections::HashSet;
use std::fmt::{self, Write as FmtWrite};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::dbc::core::cursor::is_c_identifier;
use crate::dbc::core::strings::{c_comment_text, escape_c_string, format_f64};
use crate::dbc::types::{
    database::Network,
    errors::HeaderError,
    message::{Message, MuxRole},
    signal::Signal,
};

const NAMES_TYPEDEF: &str = "#ifndef NAMES_T_DEFINED\n\
#define NAMES_T_DEFINED\n\
typedef struct _Names Names_t;\n\
struct _Names {\n\
\tint64_t key;\n\
\tconst char* name;\n\
};\n\
#endif\n";

/// Include guard for a header file name: `engine.h` becomes `_ENGINE_H`.
pub fn header_guard(file_name: &str) -> String {
    let mut guard: String = String::with_capacity(file_name.len() + 1);
    guard.push('_');
    guard.extend(file_name.chars().map(|c| {
        if c.is_ascii_alphanumeric() {
            c.to_ascii_uppercase()
        } else {
            '_'
        }
    }));
    guard
}

/// Writes the header of `net` to `path`, creating parent directories when needed.
/// The include guard is derived from the file name.
pub fn save_header_to_file(path: &str, net: &Network) -> Result<(), HeaderError> {
    let path_ref: &Path = Path::new(path);
    let file_name: &str = path_ref
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path);
    let header: String = generate_header(net, file_name)?;

    if let Some(parent) = path_ref.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|source| HeaderError::CreateDirectory {
            path: parent.display().to_string(),
            source,
        })?;
    }

    let file: File = File::create(path_ref).map_err(|source| HeaderError::CreateFile {
        path: path.to_string(),
        source,
    })?;
    let mut writer: BufWriter<File> = BufWriter::new(file);
    writer
        .write_all(header.as_bytes())
        .map_err(|source| HeaderError::Write {
            path: path.to_string(),
            source,
        })?;
    writer.flush().map_err(|source| HeaderError::Write {
        path: path.to_string(),
        source,
    })?;
    Ok(())
}

/// Renders the C header of `net`.
///
/// # Errors
/// [`HeaderError::InvalidIdentifier`] if a node, message or signal name is not a valid C
/// identifier. Names are never transliterated. A name used twice is only logged.
pub fn generate_header(net: &Network, file_name: &str) -> Result<String, HeaderError> {
    check_identifiers(net)?;

    let guard: String = header_guard(file_name);
    let mut out: String = String::with_capacity(4096);
    write_fmt(&mut out, format_args!("#ifndef {guard}\n#define {guard}\n\n"))?;
    out.push_str("#include <stdint.h>\n\n");
    out.push_str(NAMES_TYPEDEF);

    out.push_str("\nenum BU_ {\n");
    for (_, node) in net.nodes() {
        write_fmt(&mut out, format_args!("\tBU_{},\n", net.name(node.name)))?;
    }
    out.push_str("};\n");

    out.push_str("\nenum BO_ {\n");
    for (_, message) in net.messages() {
        write_fmt(
            &mut out,
            format_args!("\tBO_{:<20}\t=0x{:X},", net.name(message.name), message.id),
        )?;
        if let Some(comment) = &message.comment {
            write_fmt(&mut out, format_args!("\t/*!< {} */", c_comment_text(comment)))?;
        }
        out.push('\n');
    }
    out.push_str("};\n");

    out.push_str("/* Enumerated types */\n");
    for (_, message) in net.messages() {
        write_value_tables(net, message, &mut out)?;
    }

    out.push_str("/* Defines */\n");
    for (_, message) in net.messages() {
        write_defines(net, message, &mut out)?;
    }

    out.push_str("/* Messages */\n");
    for (_, message) in net.messages() {
        write_struct(net, message, &mut out)?;
    }

    write_fmt(&mut out, format_args!("\n#endif//{guard}\n"))?;
    Ok(out)
}

fn check_identifiers(net: &Network) -> Result<(), HeaderError> {
    let invalid = |name: &str| HeaderError::InvalidIdentifier {
        name: name.to_string(),
    };
    for (_, node) in net.nodes() {
        let name: &str = net.name(node.name);
        if !is_c_identifier(name) {
            return Err(invalid(name));
        }
    }
    let mut seen: HashSet<&str> = HashSet::new();
    for (_, message) in net.messages() {
        let name: &str = net.name(message.name);
        if !is_c_identifier(name) {
            return Err(invalid(name));
        }
        for (_, signal) in net.signals_of(message) {
            let name: &str = net.name(signal.name);
            if !is_c_identifier(name) {
                return Err(invalid(name));
            }
            if !seen.insert(name) {
                warn!("signal name '{name}' is used by more than one message; macros will clash");
            }
        }
    }
    Ok(())
}

fn write_value_tables(net: &Network, message: &Message, out: &mut String) -> Result<(), HeaderError> {
    let mut tables = net
        .signals_of(message)
        .filter_map(|(_, s)| s.value_table.as_ref().map(|t| (s, t)))
        .peekable();
    if tables.peek().is_none() {
        return Ok(());
    }
    write_fmt(
        out,
        format_args!("/* obj = {} {} */\n", message.id, net.name(message.name)),
    )?;
    for (signal, table) in tables {
        write_fmt(
            out,
            format_args!("static const Names_t _{}[] = {{\n", net.name(signal.name)),
        )?;
        for (code, label) in table.iter() {
            write_fmt(
                out,
                format_args!("  {{{:2}, \"{}\"}},\n", code, escape_c_string(label)),
            )?;
        }
        out.push_str("};\n");
    }
    Ok(())
}

fn write_defines(net: &Network, message: &Message, out: &mut String) -> Result<(), HeaderError> {
    for (_, signal) in net.signals_of(message) {
        let name: &str = net.name(signal.name);
        write_fmt(out, format_args!("#define {name}_Pos   \t{}\n", signal.start_bit))?;
        write_fmt(out, format_args!("#define {name}_Bits  \t{}\n", signal.bit_length))?;
        if signal.layout().contiguous_span().is_some() {
            write_fmt(
                out,
                format_args!(
                    "#define {name}_Msk   \t0x{:016X}ULL\n",
                    signal.layout().occupied_bits()
                ),
            )?;
        }
        write_fmt(
            out,
            format_args!("#define {name}_Factor\t{}\n", format_f64(signal.factor)),
        )?;
        write_fmt(
            out,
            format_args!("#define {name}_Offset\t{}\n", format_f64(signal.offset)),
        )?;
        write_fmt(
            out,
            format_args!("#define {name}_Units\t\"{}\"\n", escape_c_string(&signal.unit)),
        )?;
        out.push('\n');
    }
    Ok(())
}

/// C type of a bit-field.
fn field_type(bits: u32, signed: bool) -> &'static str {
    match (bits > 32, signed) {
        (false, false) => "unsigned",
        (false, true) => "signed",
        (true, false) => "uint64_t",
        (true, true) => "int64_t",
    }
}

fn write_field(
    out: &mut String,
    ty: &str,
    name: &str,
    lo: u32,
    hi: u32,
) -> Result<(), HeaderError> {
    write_fmt(
        out,
        format_args!("{:>12} {:<32}:{};\t// {:>2}..{:>2}:", ty, name, hi - lo, lo, hi - 1),
    )
}

fn write_padding(out: &mut String, lo: u32, hi: u32) -> Result<(), HeaderError> {
    write_field(out, field_type(hi - lo, false), "", lo, hi)?;
    out.push('\n');
    Ok(())
}

fn write_struct(net: &Network, message: &Message, out: &mut String) -> Result<(), HeaderError> {
    if message.signals.is_empty() {
        return Ok(());
    }
    let name: &str = net.name(message.name);
    write_fmt(out, format_args!("typedef struct _{name} {name}_t;\n"))?;
    write_fmt(out, format_args!("struct _{name} {{\n"))?;

    // payload bit order; fields that are not a contiguous run go last, as comments
    let mut fields: Vec<(Option<(u32, u32)>, &Signal)> = net
        .signals_of(message)
        .map(|(_, s)| (s.layout().contiguous_span(), s))
        .collect();
    fields.sort_by_key(|(span, s)| (span.map_or(u32::MAX, |(lo, _)| lo), s.mux.sort_index()));

    let mut offset: u32 = 0;
    for (span, signal) in fields {
        let signal_name: &str = net.name(signal.name);
        let Some((lo, hi)) = span else {
            write_fmt(
                out,
                format_args!(
                    "\t/* {signal_name}: {}|{} not a contiguous bit-field */\n",
                    signal.start_bit, signal.bit_length
                ),
            )?;
            continue;
        };
        if lo < offset {
            write_fmt(
                out,
                format_args!("\t/* {signal_name}: bits {lo}..{} shared{} */\n", hi - 1, mux_suffix(signal.mux)),
            )?;
            continue;
        }
        if offset < lo {
            write_padding(out, offset, lo)?;
        }
        write_field(out, field_type(hi - lo, signal.signed), signal_name, lo, hi)?;
        out.push_str(mux_suffix(signal.mux).trim_start());
        out.push('\n');
        offset = hi;
    }
    if offset < message.payload_bits() {
        write_padding(out, offset, message.payload_bits())?;
    }
    out.push_str("};\n\n");
    Ok(())
}

fn mux_suffix(mux: MuxRole) -> String {
    match mux {
        MuxRole::Multiplexed(n) => format!(" m{n}"),
        _ => String::new(),
    }
}

fn write_fmt(out: &mut String, args: fmt::Arguments<'_>) -> Result<(), HeaderError> {
    out.write_fmt(args).map_err(|_| HeaderError::Format)
}

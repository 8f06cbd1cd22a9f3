//! `dbc2h`: C header generator and frame decoder for DBC files.

use std::path::Path;
use std::process::ExitCode;

use clap::Parser;
use tracing::{error, info, warn};

use dbc_tools::{CanFrame, ParseOptions, dbc, decode_frame, save_header_to_file};

#[derive(Parser)]
#[command(name = "dbc2h")]
#[command(about = "Generate a C header from a DBC file and decode CAN frames against it")]
struct Args {
    /// Input DBC file
    input: String,

    /// Output header [default: input path with a .h extension]
    #[arg(short, long)]
    output: Option<String>,

    /// Reverse bit order of big-endian (Motorola) signals
    #[arg(short = 'r', long = "rbit")]
    rbit: bool,

    /// Echo every parsed record
    #[arg(short, long)]
    verbose: bool,

    /// Decode a frame in candump notation, e.g. 064#10270000 (repeatable)
    #[arg(short, long, value_name = "ID#DATA")]
    decode: Vec<CanFrame>,
}

fn init_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::INFO
    } else {
        tracing::Level::WARN
    };
    // also installs the `log` bridge, so the library's records are printed
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> ExitCode {
    let args: Args = Args::parse();
    init_logging(args.verbose);

    let options: ParseOptions = ParseOptions::new()
        .with_reverse_bit_order(args.rbit)
        .with_verbose(args.verbose);
    info!("File {}", args.input);
    let net = match dbc::parse::from_file(&args.input, &options) {
        Ok(net) => net,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };
    if !net.diagnostics().is_empty() {
        warn!(
            "{}: {} problem(s) reported, see above",
            args.input,
            net.diagnostics().len()
        );
    }

    let output: String = args.output.unwrap_or_else(|| {
        Path::new(&args.input)
            .with_extension("h")
            .display()
            .to_string()
    });
    if let Err(e) = save_header_to_file(&output, &net) {
        error!("{e}");
        return ExitCode::FAILURE;
    }
    info!(
        "{output}: {} nodes, {} messages, {} signals",
        net.node_count(),
        net.message_count(),
        net.signal_count()
    );

    for frame in &args.decode {
        match decode_frame(&net, frame) {
            Some(decoded) => {
                println!("{frame} {}:", decoded.name);
                print!("{decoded}");
            }
            None => println!("{frame} no match"),
        }
    }
    ExitCode::SUCCESS
}

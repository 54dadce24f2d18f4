use anyhow::{Context, Result};
use clap::Parser;
use dotenvy::dotenv;
use jpnihds::report::{OutputEncoding, ReportWriter};
use jpnihds::{decode_records, read_file_header, DecodeError, Structure, TextPolicy};
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(version, about = "JpnIHDS.dat parser")]
struct Args {
    /// Input file - JpnIHDS.dat
    input: PathBuf,

    /// Output file (default: stdout)
    #[arg(short, long, env = "JPNIHDS_OUTPUT")]
    output: Option<PathBuf>,

    /// Print every decoded header and body to stdout
    #[arg(long, default_value_t = false)]
    debug: bool,

    /// Report text encoding
    #[arg(long, value_enum, env = "JPNIHDS_ENCODING", default_value_t = OutputEncoding::Utf8)]
    encoding: OutputEncoding,

    /// Replace invalid UTF-16 with U+FFFD instead of failing
    #[arg(long, default_value_t = false)]
    lenient: bool,
}

fn init_logging(debug: bool) {
    let default = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    // Load environment variables from .env if present
    let _ = dotenv();
    let args = Args::parse();
    init_logging(args.debug);

    if !args.input.exists() {
        return Err(DecodeError::InputNotFound { path: args.input }.into());
    }
    let mut rdr = BufReader::new(File::open(&args.input).with_context(|| format!("open {:?}", args.input))?);

    let sink: Box<dyn Write> = match &args.output {
        Some(p) => Box::new(File::create(p).with_context(|| format!("create {:?}", p))?),
        None => Box::new(io::stdout().lock()),
    };
    let mut report = ReportWriter::new(BufWriter::with_capacity(1 << 20, sink), args.encoding)?;
    // Dumps and rows share stdout; rows must be flushed before the next dump.
    let interleave = args.debug && args.output.is_none();
    report.write_header()?;
    if interleave {
        report.flush()?;
    }

    let fhdr = read_file_header(&mut rdr).with_context(|| format!("read header of {:?}", args.input))?;
    if args.debug {
        println!("{fhdr}");
    }

    let policy = if args.lenient { TextPolicy::Lenient } else { TextPolicy::Strict };
    let mut records = decode_records(rdr, &fhdr, policy)?;
    if args.debug {
        records = records.with_inspector(|s| match s {
            Structure::RecordHeader(h) => println!("{h}"),
            Structure::RecordBody(b) => println!("{b}"),
        });
    }

    let (mut history, mut learn) = (0usize, 0usize);
    for record in records {
        let record = record?;
        report.write_record(&record)?;
        if interleave {
            report.flush()?;
        }
        if record.is_learn() {
            learn += 1;
        } else {
            history += 1;
        }
    }
    report.finish()?;

    info!(history, learn, "decoded {} records from {:?}", history + learn, args.input);
    Ok(())
}

use anyhow::{Context, Result};
use clap::Parser;
use jpnihds::{decode_records, read_file_header, DecodeError, TextPolicy};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::warn;

#[derive(Debug, Parser)]
#[command(about = "Summarise a JpnIHDS.dat file: header fields and history/learn record counts")]
struct Args {
    /// Input file - JpnIHDS.dat
    input: PathBuf,
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt().with_writer(std::io::stderr).with_target(false).init();

    if !args.input.exists() {
        return Err(DecodeError::InputNotFound { path: args.input }.into());
    }
    let mut rdr = BufReader::new(File::open(&args.input).with_context(|| format!("open {:?}", args.input))?);
    let fhdr = read_file_header(&mut rdr)?;
    println!("{fhdr}");

    // Text is irrelevant here; don't fail a summary on a bad code unit.
    let mut records = decode_records(rdr, &fhdr, TextPolicy::Lenient)?;
    let (mut history, mut learn) = (0u32, 0u32);
    for record in records.by_ref() {
        if record?.is_learn() {
            learn += 1;
        } else {
            history += 1;
        }
    }

    if history != fhdr.history_num {
        warn!(header = fhdr.history_num, found = history, "history record count differs from header");
    }
    if learn != fhdr.learn_num {
        warn!(header = fhdr.learn_num, found = learn, "learn record count differs from header");
    }
    println!("History records: {history}");
    println!("Learn records: {learn}");
    println!("Records end at offset {:#x}", records.cursor());
    Ok(())
}

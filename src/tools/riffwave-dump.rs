// Reads a WAVE file, prints its format to stderr and dumps the decoded samples to stdout

use std::{
    io::{self, BufWriter, Write},
    path::PathBuf,
};

use clap::{Parser, ValueEnum};
use riffwave::{Decoder, DecoderOptions, WaveAudio};
use tracing_subscriber::EnvFilter;

#[derive(Debug, Parser)]
#[command(name = "riffwave-dump", version, about = "Decode a PCM WAVE file and dump its samples")]
struct Args {
    /// WAVE file to decode
    file: PathBuf,

    /// Sample format to write to stdout (the summary always goes to stderr)
    #[arg(short, long, value_enum, default_value_t = Output::Summary)]
    output: Output,

    /// Scale all samples so the loudest one reaches 1.0
    #[arg(long)]
    normalize: bool,

    /// Skip the pad byte after odd-sized chunks
    #[arg(long)]
    word_aligned: bool,

    /// Reject files whose block align or byte rate disagree with the format, or whose data is truncated
    #[arg(long)]
    strict: bool,

    /// Log chunk details to stderr (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, ValueEnum)]
enum Output {
    /// Nothing beyond the summary
    Summary,
    /// Interleaved little-endian 32-bit floats
    Raw,
    /// One comma-separated row per channel
    Csv,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let level = match args.verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)))
        .with_writer(io::stderr)
        .init();

    let options = DecoderOptions::new()
        .normalize(args.normalize)
        .word_aligned(args.word_aligned)
        .strict(args.strict);
    let audio = Decoder::open(&args.file)?.with_options(options).decode()?;

    eprintln!("{}", audio);

    let mut stdout = BufWriter::new(io::stdout().lock());
    match args.output {
        Output::Summary => {}
        Output::Raw => write_raw(&audio, &mut stdout)?,
        Output::Csv => write_csv(&audio, &mut stdout)?,
    }
    stdout.flush()?;

    if args.output == Output::Raw {
        eprintln!("{} sample(s) written.", audio.interleaved().len());
    }
    Ok(())
}

fn write_raw<W: Write>(audio: &WaveAudio, out: &mut W) -> io::Result<()> {
    for sample in audio.interleaved() {
        out.write_all(&sample.to_le_bytes())?;
    }
    Ok(())
}

fn write_csv<W: Write>(audio: &WaveAudio, out: &mut W) -> io::Result<()> {
    for channel in audio.channels() {
        let mut samples = channel.iter();
        if let Some(first) = samples.next() {
            write!(out, "{}", first)?;
        }
        for sample in samples {
            write!(out, ",{}", sample)?;
        }
        writeln!(out)?;
    }
    Ok(())
}

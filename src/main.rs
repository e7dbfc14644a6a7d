//! Small demonstration of typed file streams: a binary round trip and a formatted text round trip
//! inside a scratch directory.

use std::error::Error;
use std::path::PathBuf;

use clap::Parser;
use file_stream::fs::{FileStream, Mode};
use tracing::{Level, info};
use tracing_subscriber::FmtSubscriber;

/// Writes a few values through file streams and reads them back.
#[derive(Parser, Debug)]
#[command(name = "file-stream")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Directory for the scratch files (defaults to the system temporary directory)
    #[arg(value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let dir = cli.dir.unwrap_or_else(std::env::temp_dir);

    // Binary
    let path = dir.join("file-stream-demo.bin");
    let mut stream = FileStream::<u8>::options()
        .mode(Mode::ReadWriteCreate)
        .binary(true)
        .open(&path)?;
    stream.write_variable(5_u32)?;
    stream.write_variable(3_u32)?;
    stream.reset()?;
    let (a, b) = (stream.read_variable::<u32>()?, stream.read_variable::<u32>()?);
    info!(path = %path.display(), a, b, size = stream.size()?, "binary round trip");
    stream.close();

    // Text
    let path = dir.join("file-stream-demo.txt");
    stream.open(&path, Mode::Write, false)?;
    stream.write_by_format(format_args!("{}:{}\n", a, b))?;
    stream.write_line(b"done", 0)?;
    stream.reopen(Mode::Read, false)?;
    let (mut x, mut y) = (0_u32, 0_u32);
    let fields = stream.get_by_format("%u:%u ", &mut [&mut x, &mut y])?;
    let trailer = String::from_utf8_lossy(&stream.get_line()?).into_owned();
    info!(path = %path.display(), fields, x, y, %trailer, end_of_file = stream.is_end_of_file(), "text round trip");
    stream.close();

    if let Some(error) = stream.last_error() {
        Err(*error)?
    }
    Ok(())
}

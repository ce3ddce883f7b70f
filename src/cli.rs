use clap::Parser;
use std::path::PathBuf;

use crate::cache::DEFAULT_CAPACITY;

pub const HELP_KEYS: &str = "\
Key Bindings:
  Esc / q       : Quit
  Left / h      : Previous image
  Right / l     : Next image
  Space         : Next image
  Home / End    : First / last image
  z             : Cycle zoom mode (shrink-to-fit / fit / 1:1)
  , / .         : Rotate 90 CCW / CW and resave
  Delete        : Delete current file
  m             : Mark current file (write path to output)
  i             : Print file info to stdout
  r             : Rescan folder
  R             : Toggle recursive scan
  f             : Toggle fullscreen
  Drag          : Pan
";

#[derive(Parser)]
#[command(name = "piv", about = "A folder image browser", after_help = HELP_KEYS)]
pub struct Cli {
    /// Folder to browse
    #[arg(default_value = ".")]
    pub root: PathBuf,

    /// Recurse into subdirectories
    #[arg(short, long)]
    pub recursive: bool,

    /// Maximum images held in the decode cache
    #[arg(long, default_value_t = DEFAULT_CAPACITY)]
    pub cache_capacity: usize,

    /// Output file for marked images (appends path). Defaults to stdout if not set.
    #[arg(short = 'o', long, value_name = "FILE")]
    pub mark_output: Option<PathBuf>,
}

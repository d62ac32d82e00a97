use crate::strings::Language;
use clap::{Parser, ValueEnum};
use heicjpeg_core::RunMode;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "heicjpeg")]
#[command(version, about = "Convert HEIC/HEIF images to JPEG, one file or a whole folder", long_about = None)]
pub struct Cli {
    /// HEIC/HEIF file, or folder of images
    #[arg(required = true)]
    pub input: PathBuf,

    /// Treat INPUT as a single file or a folder (detected when omitted)
    #[arg(short, long, value_enum)]
    pub mode: Option<ModeArg>,

    /// Language for status messages
    #[arg(short, long, value_enum, default_value_t = Language::En)]
    pub lang: Language,

    /// Print every run event as a JSON line instead of text
    #[arg(long)]
    pub json: bool,

    /// Verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ModeArg {
    File,
    Folder,
}

impl From<ModeArg> for RunMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::File => RunMode::Single,
            ModeArg::Folder => RunMode::Batch,
        }
    }
}

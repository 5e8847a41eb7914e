use anyhow::{Context, Result};
use clap::{ArgAction, Parser, ValueHint};
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "mediaconv",
    version,
    about = "Interactive ffmpeg front-end: remux, GIF, frame grab, slideshow, size-targeted compression"
)]
pub struct Cli {
    /// Directory for output files (default: next to each input)
    #[arg(short = 'd', long, value_hint = ValueHint::DirPath)]
    pub output_dir: Option<PathBuf>,

    /// Show raw ffmpeg logs (useful for debugging)
    #[arg(long, action = ArgAction::SetTrue)]
    pub verbose: bool,

    /// Path to ffmpeg binary (overrides PATH lookup)
    #[arg(long, value_hint = ValueHint::ExecutablePath)]
    pub ffmpeg: Option<PathBuf>,

    /// Path to ffprobe binary (overrides PATH lookup)
    #[arg(long, value_hint = ValueHint::ExecutablePath)]
    pub ffprobe: Option<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub output_dir: Option<PathBuf>,
    pub verbose: bool,
    pub ffmpeg: Option<PathBuf>,
    pub ffprobe: Option<PathBuf>,
}

impl Cli {
    pub fn into_config(self) -> Result<AppConfig> {
        if let Some(dir) = &self.output_dir {
            if !dir.is_dir() {
                fs::create_dir_all(dir).with_context(|| {
                    format!("could not create output directory {}", dir.display())
                })?;
            }
        }
        Ok(AppConfig {
            output_dir: self.output_dir,
            verbose: self.verbose,
            ffmpeg: self.ffmpeg,
            ffprobe: self.ffprobe,
        })
    }
}

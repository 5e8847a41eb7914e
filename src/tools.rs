use anyhow::{Context, Result, bail};
use std::path::PathBuf;
use which::which;

/// External binaries resolved once at startup and handed to the probe
/// adapter and job runner.
#[derive(Debug, Clone)]
pub struct Toolchain {
    pub ffmpeg: PathBuf,
    pub ffprobe: PathBuf,
}

pub fn resolve_toolchain(ffmpeg: Option<PathBuf>, ffprobe: Option<PathBuf>) -> Result<Toolchain> {
    Ok(Toolchain {
        ffmpeg: resolve_bin(ffmpeg, "ffmpeg")?,
        ffprobe: resolve_bin(ffprobe, "ffprobe")?,
    })
}

fn resolve_bin(explicit: Option<PathBuf>, default: &str) -> Result<PathBuf> {
    if let Some(path) = explicit {
        if path.is_file() {
            return Ok(path);
        }
        bail!("Provided binary not found: {}", path.display());
    }

    which(default)
        .or_else(|_| {
            if cfg!(windows) {
                which(format!("{default}.exe"))
            } else {
                Err(which::Error::CannotFindBinaryPath)
            }
        })
        .with_context(|| format!("`{default}` not found in PATH"))
}

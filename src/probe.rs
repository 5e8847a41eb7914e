use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to run ffprobe: {0}")]
    Spawn(#[from] std::io::Error),
    #[error("ffprobe exited with {status}: {stderr}")]
    Failed { status: ExitStatus, stderr: String },
    #[error("ffprobe output missing `{0}`")]
    MissingField(&'static str),
    #[error("cannot parse ffprobe `{field}` value `{value}`")]
    Parse { field: &'static str, value: String },
}

/// Source metadata gathered once per operation and discarded afterwards.
#[derive(Clone, Debug, PartialEq)]
pub struct MediaProbeResult {
    pub duration_secs: f64,
    pub width: u32,
    pub height: u32,
    pub has_audio: bool,
    pub format_name: String,
}

pub struct Prober {
    ffprobe: PathBuf,
}

impl Prober {
    pub fn new(ffprobe: PathBuf) -> Self {
        Self { ffprobe }
    }

    /// One short-lived ffprobe child per call; any failure is surfaced
    /// immediately, never retried.
    pub fn probe(&self, input: &Path) -> Result<MediaProbeResult, ProbeError> {
        let out = Command::new(&self.ffprobe)
            .arg("-v")
            .arg("error")
            .arg("-show_entries")
            .arg("stream=codec_type,width,height")
            .arg("-show_entries")
            .arg("format=duration,format_name")
            .arg("-of")
            .arg("default=noprint_wrappers=1")
            .arg(input)
            .output()?;
        if !out.status.success() {
            return Err(ProbeError::Failed {
                status: out.status,
                stderr: String::from_utf8_lossy(&out.stderr).trim().to_string(),
            });
        }
        parse_probe_output(&String::from_utf8_lossy(&out.stdout))
    }
}

/// Parse ffprobe's flat `key=value` output (one line per entry, streams
/// first, format section last).
pub fn parse_probe_output(text: &str) -> Result<MediaProbeResult, ProbeError> {
    let mut duration: Option<f64> = None;
    let mut width: Option<u32> = None;
    let mut height: Option<u32> = None;
    let mut format_name: Option<String> = None;
    let mut has_audio = false;

    for line in text.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        match key {
            "codec_type" if value == "audio" => has_audio = true,
            // First width/height pair belongs to the first video stream.
            "width" if width.is_none() => width = Some(parse_field("width", value)?),
            "height" if height.is_none() => height = Some(parse_field("height", value)?),
            "duration" => duration = Some(parse_field("duration", value)?),
            "format_name" => format_name = Some(value.to_string()),
            _ => {}
        }
    }

    Ok(MediaProbeResult {
        duration_secs: duration.ok_or(ProbeError::MissingField("duration"))?,
        width: width.ok_or(ProbeError::MissingField("width"))?,
        height: height.ok_or(ProbeError::MissingField("height"))?,
        has_audio,
        format_name: format_name.ok_or(ProbeError::MissingField("format_name"))?,
    })
}

fn parse_field<T: std::str::FromStr>(field: &'static str, value: &str) -> Result<T, ProbeError> {
    value.parse().map_err(|_| ProbeError::Parse {
        field,
        value: value.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = "\
codec_type=video
width=1920
height=1080
codec_type=audio
duration=12.480000
format_name=mov,mp4,m4a,3gp,3g2,mj2
";

    #[test]
    fn parses_video_with_audio() {
        let info = parse_probe_output(FIXTURE).unwrap();
        assert_eq!(info.width, 1920);
        assert_eq!(info.height, 1080);
        assert!(info.has_audio);
        assert!((info.duration_secs - 12.48).abs() < 1e-9);
        assert_eq!(info.format_name, "mov,mp4,m4a,3gp,3g2,mj2");
    }

    #[test]
    fn silent_video_has_no_audio_flag() {
        let text = "codec_type=video\nwidth=640\nheight=480\nduration=3.0\nformat_name=avi\n";
        let info = parse_probe_output(text).unwrap();
        assert!(!info.has_audio);
        assert_eq!(info.width, 640);
    }

    #[test]
    fn missing_duration_is_an_error() {
        let text = "codec_type=video\nwidth=640\nheight=480\nformat_name=avi\n";
        assert!(matches!(
            parse_probe_output(text),
            Err(ProbeError::MissingField("duration"))
        ));
    }

    #[test]
    fn unparseable_duration_is_an_error() {
        let text = "codec_type=video\nwidth=640\nheight=480\nduration=N/A\nformat_name=avi\n";
        assert!(matches!(
            parse_probe_output(text),
            Err(ProbeError::Parse { field: "duration", .. })
        ));
    }

    #[test]
    fn first_video_stream_wins() {
        let text = "\
codec_type=video
width=1280
height=720
codec_type=video
width=320
height=240
duration=9.5
format_name=matroska,webm
";
        let info = parse_probe_output(text).unwrap();
        assert_eq!((info.width, info.height), (1280, 720));
    }
}

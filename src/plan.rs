use crate::probe::MediaProbeResult;
use regex::Regex;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Audio bitrate reserved out of the size budget when the source has audio.
pub const AUDIO_RESERVE_BPS: u64 = 128_000;
/// Floor for the derived video bitrate so tiny targets or very long inputs
/// never plan a degenerate encode.
pub const MIN_VIDEO_BITRATE: u64 = 100_000;

pub const DEFAULT_CRF: u8 = 23;
pub const MAX_CRF: u8 = 51;
pub const DEFAULT_GIF_FPS: u32 = 15;
pub const DEFAULT_GIF_WIDTH: u32 = 480;
pub const DEFAULT_FRAME_TIMESTAMP: f64 = 1.0;
pub const DEFAULT_CLIP_SECS: f64 = 5.0;

#[derive(Debug, Error)]
pub enum PlanError {
    #[error("source duration must be positive, got {0}s")]
    InvalidDuration(f64),
    #[error("target size must be positive")]
    InvalidTargetSize,
    #[error("invalid resolution `{0}` (expected WIDTHxHEIGHT or a preset like 1080p)")]
    InvalidResolution(String),
    #[error("quality {0} out of range (0..=51)")]
    QualityOutOfRange(u8),
    #[error("{0} requires probing the source first")]
    MissingProbe(&'static str),
    #[error("source has no audio stream")]
    NoAudioStream,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operation {
    Remux,
    ToGif,
    ExtractAudio,
    CompressToSize,
    ImageConvert,
    ExtractFrame,
    ImagesToVideo,
}

impl Operation {
    /// Whether the source is a video file worth probing before planning.
    pub fn probes_source(self) -> bool {
        !matches!(self, Operation::ImageConvert | Operation::ImagesToVideo)
    }

    /// Suffix appended to the input stem when deriving the output name.
    /// GIF output keeps the bare stem.
    fn suffix(self) -> Option<&'static str> {
        match self {
            Operation::Remux | Operation::ImageConvert => Some("converted"),
            Operation::ToGif => None,
            Operation::ExtractAudio => Some("audio"),
            Operation::CompressToSize => Some("compressed"),
            Operation::ExtractFrame => Some("frame"),
            Operation::ImagesToVideo => Some("video"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Resolution {
    /// Named preset: fixed output height, width follows the source aspect.
    Preset(u32),
    /// Explicit WIDTHxHEIGHT, used verbatim.
    Exact { width: u32, height: u32 },
}

pub fn parse_resolution(raw: &str) -> Result<Resolution, PlanError> {
    let trimmed = raw.trim();
    let height = match trimmed.to_ascii_lowercase().as_str() {
        "2160p" => Some(2160),
        "1440p" => Some(1440),
        "1080p" => Some(1080),
        "720p" => Some(720),
        "480p" => Some(480),
        "360p" => Some(360),
        _ => None,
    };
    if let Some(h) = height {
        return Ok(Resolution::Preset(h));
    }

    let re = Regex::new(r"^(\d+)[xX](\d+)$").unwrap();
    let caps = re
        .captures(trimmed)
        .ok_or_else(|| PlanError::InvalidResolution(trimmed.into()))?;
    let width: u32 = caps[1]
        .parse()
        .map_err(|_| PlanError::InvalidResolution(trimmed.into()))?;
    let height: u32 = caps[2]
        .parse()
        .map_err(|_| PlanError::InvalidResolution(trimmed.into()))?;
    if width == 0 || height == 0 {
        return Err(PlanError::InvalidResolution(trimmed.into()));
    }
    Ok(Resolution::Exact { width, height })
}

/// x264 speed ladder, slowest end trades time for compression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SpeedPreset {
    Ultrafast,
    Superfast,
    Veryfast,
    Faster,
    Fast,
    #[default]
    Medium,
    Slow,
    Slower,
    Veryslow,
}

impl SpeedPreset {
    pub const ALL: [SpeedPreset; 9] = [
        SpeedPreset::Ultrafast,
        SpeedPreset::Superfast,
        SpeedPreset::Veryfast,
        SpeedPreset::Faster,
        SpeedPreset::Fast,
        SpeedPreset::Medium,
        SpeedPreset::Slow,
        SpeedPreset::Slower,
        SpeedPreset::Veryslow,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SpeedPreset::Ultrafast => "ultrafast",
            SpeedPreset::Superfast => "superfast",
            SpeedPreset::Veryfast => "veryfast",
            SpeedPreset::Faster => "faster",
            SpeedPreset::Fast => "fast",
            SpeedPreset::Medium => "medium",
            SpeedPreset::Slow => "slow",
            SpeedPreset::Slower => "slower",
            SpeedPreset::Veryslow => "veryslow",
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct Overrides {
    pub target_size_bytes: Option<u64>,
    pub resolution: Option<Resolution>,
    pub fps: Option<u32>,
    pub quality: Option<u8>,
    pub speed: Option<SpeedPreset>,
    /// Extract-frame: seek position in the source.
    pub timestamp_secs: Option<f64>,
    /// Images-to-video: length of the generated clip.
    pub clip_secs: Option<f64>,
}

#[derive(Clone, Debug)]
pub struct ConversionRequest {
    pub op: Operation,
    pub input: PathBuf,
    pub output: PathBuf,
    pub overrides: Overrides,
}

/// Ordered encoder argument list, input and output paths included.
/// Consumed once by the job runner.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodePlan {
    pub args: Vec<String>,
    pub output: PathBuf,
}

/// Output path convention: `<stem>_<suffix>.<ext>` next to the input
/// (or under `output_dir` when given).
pub fn default_output(
    input: &Path,
    op: Operation,
    ext: &str,
    output_dir: Option<&Path>,
) -> PathBuf {
    let stem = input.file_stem().and_then(OsStr::to_str).unwrap_or("output");
    let dir = output_dir
        .map(Path::to_path_buf)
        .unwrap_or_else(|| input.parent().unwrap_or(Path::new(".")).to_path_buf());
    let name = match op.suffix() {
        Some(suffix) => format!("{stem}_{suffix}.{ext}"),
        None => format!("{stem}.{ext}"),
    };
    dir.join(name)
}

/// Derive encoder arguments for a request. Pure function of its inputs:
/// identical request + probe always yield the identical plan.
pub fn plan(
    req: &ConversionRequest,
    probe: Option<&MediaProbeResult>,
) -> Result<EncodePlan, PlanError> {
    let ov = &req.overrides;
    if let Some(q) = ov.quality {
        if !is_image_output(&req.output) && q > MAX_CRF {
            return Err(PlanError::QualityOutOfRange(q));
        }
    }

    let mut args: Vec<String> = Vec::new();

    // Input-side flags come before -i.
    match req.op {
        Operation::ExtractFrame => {
            let ts = ov.timestamp_secs.unwrap_or(DEFAULT_FRAME_TIMESTAMP);
            push(&mut args, ["-ss", &format!("{ts}")]);
        }
        Operation::ImagesToVideo => push(&mut args, ["-loop", "1"]),
        _ => {}
    }
    push(&mut args, ["-i", &req.input.to_string_lossy()]);

    match req.op {
        Operation::Remux => plan_remux(&mut args, req, probe)?,
        Operation::ToGif => plan_gif(&mut args, ov, probe),
        Operation::ExtractAudio => {
            if let Some(p) = probe {
                if !p.has_audio {
                    return Err(PlanError::NoAudioStream);
                }
            }
            push(&mut args, ["-vn", "-c:a", "libmp3lame", "-b:a", "192k"]);
        }
        Operation::CompressToSize => plan_compress(&mut args, ov, probe)?,
        Operation::ImageConvert | Operation::ExtractFrame => {
            if req.op == Operation::ExtractFrame {
                push(&mut args, ["-vframes", "1"]);
            }
            args.extend(image_args(&req.output, ov, probe));
        }
        Operation::ImagesToVideo => {
            let secs = ov.clip_secs.unwrap_or(DEFAULT_CLIP_SECS);
            push(&mut args, ["-t", &format!("{secs}")]);
            push(&mut args, ["-c:v", "libx264", "-pix_fmt", "yuv420p"]);
            let mut vf = vec![format!("fps={}", ov.fps.unwrap_or(30))];
            if let Some(res) = ov.resolution {
                vf.insert(0, scale_filter(res, probe));
            }
            push(&mut args, ["-vf", &vf.join(",")]);
            push(&mut args, ["-crf", &ov.quality.unwrap_or(DEFAULT_CRF).to_string()]);
            push(&mut args, ["-preset", ov.speed.unwrap_or_default().as_str()]);
        }
    }

    args.push(req.output.to_string_lossy().into_owned());
    Ok(EncodePlan {
        args,
        output: req.output.clone(),
    })
}

/// Size-targeted bitrate derivation. Returns (total, video) in bits/s:
/// total = floor(size * 8 / duration), video = total minus the audio
/// reserve, floored at MIN_VIDEO_BITRATE.
pub fn derive_bitrates(
    target_size_bytes: u64,
    duration_secs: f64,
    has_audio: bool,
) -> Result<(u64, u64), PlanError> {
    if target_size_bytes == 0 {
        return Err(PlanError::InvalidTargetSize);
    }
    if duration_secs <= 0.0 {
        return Err(PlanError::InvalidDuration(duration_secs));
    }
    let total = (target_size_bytes as f64 * 8.0 / duration_secs).floor() as u64;
    let reserve = if has_audio { AUDIO_RESERVE_BPS } else { 0 };
    let video = total.saturating_sub(reserve).max(MIN_VIDEO_BITRATE);
    Ok((total, video))
}

/// Nearest even width preserving the source aspect at the given height.
pub fn even_width_for_height(src_width: u32, src_height: u32, height: u32) -> u32 {
    let exact = src_width as f64 * height as f64 / src_height as f64;
    (((exact / 2.0).round() as u32) * 2).max(2)
}

fn plan_remux(
    args: &mut Vec<String>,
    req: &ConversionRequest,
    probe: Option<&MediaProbeResult>,
) -> Result<(), PlanError> {
    let ov = &req.overrides;
    let touches_video = ov.resolution.is_some() || ov.fps.is_some() || ov.quality.is_some();
    if !touches_video {
        push(args, ["-c", "copy"]);
        return Ok(());
    }

    let mut vf: Vec<String> = Vec::new();
    if let Some(res) = ov.resolution {
        vf.push(scale_filter(res, probe));
    }
    if let Some(fps) = ov.fps {
        vf.push(format!("fps={fps}"));
    }
    if !vf.is_empty() {
        push(args, ["-vf", &vf.join(",")]);
    }
    push(args, ["-c:v", video_codec_for(&req.output)]);
    push(args, ["-crf", &ov.quality.unwrap_or(DEFAULT_CRF).to_string()]);
    push(args, ["-preset", ov.speed.unwrap_or_default().as_str()]);
    push(args, ["-c:a", "aac", "-b:a", "192k"]);
    Ok(())
}

fn plan_gif(args: &mut Vec<String>, ov: &Overrides, probe: Option<&MediaProbeResult>) {
    let fps = ov.fps.unwrap_or(DEFAULT_GIF_FPS);
    let width = match ov.resolution {
        Some(Resolution::Exact { width, .. }) => width,
        Some(Resolution::Preset(h)) => match probe {
            Some(p) if p.width > 0 && p.height > 0 => {
                even_width_for_height(p.width, p.height, h)
            }
            _ => DEFAULT_GIF_WIDTH,
        },
        None => DEFAULT_GIF_WIDTH,
    };
    let vf = format!(
        "fps={fps},scale={width}:-1:flags=lanczos,\
         split[s0][s1];[s0]palettegen=max_colors=128[p];[s1][p]paletteuse"
    );
    push(args, ["-vf", &vf, "-loop", "0"]);
}

fn plan_compress(
    args: &mut Vec<String>,
    ov: &Overrides,
    probe: Option<&MediaProbeResult>,
) -> Result<(), PlanError> {
    let probe = probe.ok_or(PlanError::MissingProbe("compress-to-size"))?;
    let size = ov.target_size_bytes.ok_or(PlanError::InvalidTargetSize)?;
    let (_total, video) = derive_bitrates(size, probe.duration_secs, probe.has_audio)?;

    push(args, ["-c:v", "libx264"]);
    push(args, ["-b:v", &video.to_string()]);
    // Cap the rate, not just the average, so bursty content cannot blow the
    // size budget.
    push(args, ["-maxrate", &video.to_string()]);
    push(args, ["-bufsize", &(video * 2).to_string()]);
    push(args, ["-preset", ov.speed.unwrap_or(SpeedPreset::Slow).as_str()]);

    let mut vf: Vec<String> = Vec::new();
    if let Some(res) = ov.resolution {
        vf.push(scale_filter(res, Some(probe)));
    }
    if let Some(fps) = ov.fps {
        vf.push(format!("fps={fps}"));
    }
    if !vf.is_empty() {
        push(args, ["-vf", &vf.join(",")]);
    }

    if probe.has_audio {
        push(args, ["-c:a", "aac", "-b:a", "128k"]);
    } else {
        args.push("-an".into());
    }
    Ok(())
}

/// Image encode flags keyed on the output extension, quality clamped to the
/// codec's own scale.
fn image_args(output: &Path, ov: &Overrides, probe: Option<&MediaProbeResult>) -> Vec<String> {
    let mut args: Vec<String> = Vec::new();
    let mut vf: Vec<String> = Vec::new();

    if let Some(res) = ov.resolution {
        vf.push(match res {
            Resolution::Exact { width, height } => {
                format!("scale={width}:{height}:flags=lanczos")
            }
            Resolution::Preset(h) => match probe {
                Some(p) if p.width > 0 && p.height > 0 => format!(
                    "scale={}:{h}:flags=lanczos",
                    even_width_for_height(p.width, p.height, h)
                ),
                _ => format!("scale=-2:{h}:flags=lanczos"),
            },
        });
    }

    match output
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => {
            vf.push("format=yuvj420p".into());
            let q = ov.quality.unwrap_or(2).clamp(2, 31);
            push(&mut args, ["-q:v", &q.to_string()]);
        }
        Some("png") => {
            let level = (ov.quality.unwrap_or(2) / 3).min(9);
            push(&mut args, ["-compression_level", &level.to_string()]);
        }
        Some("webp") => {
            let q = ov.quality.unwrap_or(85).clamp(1, 100);
            push(&mut args, ["-q:v", &q.to_string()]);
        }
        _ => {}
    }

    if !vf.is_empty() {
        push(&mut args, ["-vf", &vf.join(",")]);
    }
    args
}

fn scale_filter(res: Resolution, probe: Option<&MediaProbeResult>) -> String {
    match res {
        Resolution::Exact { width, height } => format!("scale={width}:{height}"),
        Resolution::Preset(h) => match probe {
            Some(p) if p.width > 0 && p.height > 0 => {
                format!("scale={}:{h}", even_width_for_height(p.width, p.height, h))
            }
            // No probe dimensions: let ffmpeg pick an even width.
            _ => format!("scale=-2:{h}"),
        },
    }
}

fn video_codec_for(output: &Path) -> &'static str {
    match output
        .extension()
        .and_then(OsStr::to_str)
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("avi") => "libxvid",
        Some("webm") => "libvpx-vp9",
        Some("wmv") => "wmv2",
        _ => "libx264",
    }
}

fn is_image_output(output: &Path) -> bool {
    matches!(
        output
            .extension()
            .and_then(OsStr::to_str)
            .map(str::to_ascii_lowercase)
            .as_deref(),
        Some("jpg") | Some("jpeg") | Some("png") | Some("webp") | Some("bmp") | Some("tiff")
    )
}

fn push<const N: usize>(args: &mut Vec<String>, items: [&str; N]) {
    args.extend(items.iter().map(|s| s.to_string()));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn probe_1080p(has_audio: bool) -> MediaProbeResult {
        MediaProbeResult {
            duration_secs: 100.0,
            width: 1920,
            height: 1080,
            has_audio,
            format_name: "mov,mp4,m4a,3gp,3g2,mj2".into(),
        }
    }

    fn request(op: Operation, overrides: Overrides, out: &str) -> ConversionRequest {
        ConversionRequest {
            op,
            input: PathBuf::from("/tmp/in.mp4"),
            output: PathBuf::from(out),
            overrides,
        }
    }

    #[test]
    fn bitrate_budget_scenario() {
        // 10 MB over 100 s with audio reserved at 128 kbit/s.
        let (total, video) = derive_bitrates(10_000_000, 100.0, true).unwrap();
        assert_eq!(total, 800_000);
        assert_eq!(video, 672_000);
    }

    #[test]
    fn bitrate_total_is_floored_division() {
        let (total, _) = derive_bitrates(1_000_003, 7.0, false).unwrap();
        assert_eq!(total, (1_000_003f64 * 8.0 / 7.0).floor() as u64);
    }

    #[test]
    fn bitrate_never_below_floor() {
        // 100 kB over an hour is far below the floor.
        let (_, video) = derive_bitrates(100_000, 3600.0, true).unwrap();
        assert_eq!(video, MIN_VIDEO_BITRATE);
    }

    #[test]
    fn zero_or_negative_duration_is_rejected() {
        assert!(matches!(
            derive_bitrates(1_000_000, 0.0, false),
            Err(PlanError::InvalidDuration(_))
        ));
        assert!(matches!(
            derive_bitrates(1_000_000, -3.0, false),
            Err(PlanError::InvalidDuration(_))
        ));
    }

    #[test]
    fn zero_target_size_is_rejected() {
        assert!(matches!(
            derive_bitrates(0, 10.0, false),
            Err(PlanError::InvalidTargetSize)
        ));
    }

    #[test]
    fn compress_plan_caps_rate() {
        let mut ov = Overrides::default();
        ov.target_size_bytes = Some(10_000_000);
        let req = request(Operation::CompressToSize, ov, "/tmp/out_compressed.mp4");
        let plan = plan(&req, Some(&probe_1080p(true))).unwrap();
        let a = &plan.args;
        let bv = a.iter().position(|s| s == "-b:v").unwrap();
        assert_eq!(a[bv + 1], "672000");
        let mr = a.iter().position(|s| s == "-maxrate").unwrap();
        assert_eq!(a[mr + 1], "672000");
        let bs = a.iter().position(|s| s == "-bufsize").unwrap();
        assert_eq!(a[bs + 1], "1344000");
        assert!(a.contains(&"128k".to_string()));
    }

    #[test]
    fn compress_without_audio_drops_audio_stream() {
        let mut ov = Overrides::default();
        ov.target_size_bytes = Some(10_000_000);
        let req = request(Operation::CompressToSize, ov, "/tmp/out_compressed.mp4");
        let plan = plan(&req, Some(&probe_1080p(false))).unwrap();
        assert!(plan.args.contains(&"-an".to_string()));
        let bv = plan.args.iter().position(|s| s == "-b:v").unwrap();
        assert_eq!(plan.args[bv + 1], "800000");
    }

    #[test]
    fn compress_requires_probe() {
        let mut ov = Overrides::default();
        ov.target_size_bytes = Some(10_000_000);
        let req = request(Operation::CompressToSize, ov, "/tmp/out.mp4");
        assert!(matches!(plan(&req, None), Err(PlanError::MissingProbe(_))));
    }

    #[test]
    fn remux_without_overrides_is_stream_copy() {
        let req = request(Operation::Remux, Overrides::default(), "/tmp/out_converted.mkv");
        let plan = plan(&req, Some(&probe_1080p(true))).unwrap();
        assert_eq!(
            plan.args,
            vec!["-i", "/tmp/in.mp4", "-c", "copy", "/tmp/out_converted.mkv"]
        );
    }

    #[test]
    fn remux_with_quality_reencodes() {
        let mut ov = Overrides::default();
        ov.quality = Some(20);
        let req = request(Operation::Remux, ov, "/tmp/out_converted.webm");
        let plan = plan(&req, Some(&probe_1080p(true))).unwrap();
        assert!(plan.args.contains(&"libvpx-vp9".to_string()));
        assert!(plan.args.contains(&"-crf".to_string()));
        assert!(plan.args.contains(&"medium".to_string()));
    }

    #[test]
    fn quality_out_of_crf_range_is_rejected() {
        let mut ov = Overrides::default();
        ov.quality = Some(60);
        let req = request(Operation::Remux, ov, "/tmp/out.mp4");
        assert!(matches!(
            plan(&req, None),
            Err(PlanError::QualityOutOfRange(60))
        ));
    }

    #[test]
    fn plan_is_deterministic() {
        let mut ov = Overrides::default();
        ov.target_size_bytes = Some(10_000_000);
        ov.resolution = Some(Resolution::Preset(720));
        let req = request(Operation::CompressToSize, ov, "/tmp/out.mp4");
        let probe = probe_1080p(true);
        assert_eq!(
            plan(&req, Some(&probe)).unwrap(),
            plan(&req, Some(&probe)).unwrap()
        );
    }

    #[test]
    fn preset_widths_are_even_and_keep_aspect() {
        for (w, h) in [(1920u32, 1080u32), (1280, 720), (854, 480), (1366, 768)] {
            for target in [2160u32, 1440, 1080, 720, 480, 360] {
                let derived = even_width_for_height(w, h, target);
                assert_eq!(derived % 2, 0);
                let exact = w as f64 * target as f64 / h as f64;
                assert!(
                    (derived as f64 - exact).abs() <= 1.0,
                    "{w}x{h} @ {target}: derived {derived}, exact {exact}"
                );
            }
        }
    }

    #[test]
    fn preset_scale_uses_probed_aspect() {
        let mut ov = Overrides::default();
        ov.resolution = Some(Resolution::Preset(720));
        ov.quality = Some(23);
        let req = request(Operation::Remux, ov, "/tmp/out.mp4");
        let plan = plan(&req, Some(&probe_1080p(true))).unwrap();
        assert!(plan.args.contains(&"scale=1280:720".to_string()));
    }

    #[test]
    fn exact_resolution_is_verbatim() {
        let mut ov = Overrides::default();
        ov.resolution = Some(Resolution::Exact {
            width: 640,
            height: 360,
        });
        ov.quality = Some(23);
        let req = request(Operation::Remux, ov, "/tmp/out.mp4");
        let plan = plan(&req, None).unwrap();
        assert!(plan.args.contains(&"scale=640:360".to_string()));
    }

    #[test]
    fn parse_resolution_accepts_presets_and_exact() {
        assert_eq!(parse_resolution("1080p").unwrap(), Resolution::Preset(1080));
        assert_eq!(parse_resolution("720P").unwrap(), Resolution::Preset(720));
        assert_eq!(
            parse_resolution("1920x1080").unwrap(),
            Resolution::Exact {
                width: 1920,
                height: 1080
            }
        );
        assert!(matches!(
            parse_resolution("0x100"),
            Err(PlanError::InvalidResolution(_))
        ));
        assert!(matches!(
            parse_resolution("potato"),
            Err(PlanError::InvalidResolution(_))
        ));
    }

    #[test]
    fn gif_plan_uses_palette_pipeline() {
        let req = request(Operation::ToGif, Overrides::default(), "/tmp/in.gif");
        let plan = plan(&req, Some(&probe_1080p(true))).unwrap();
        let vf = &plan.args[plan.args.iter().position(|s| s == "-vf").unwrap() + 1];
        assert!(vf.starts_with("fps=15,scale=480:-1:flags=lanczos"));
        assert!(vf.contains("palettegen=max_colors=128"));
        assert!(vf.contains("paletteuse"));
        assert!(plan.args.contains(&"-loop".to_string()));
    }

    #[test]
    fn extract_audio_without_audio_stream_fails() {
        let req = request(Operation::ExtractAudio, Overrides::default(), "/tmp/a.mp3");
        assert!(matches!(
            plan(&req, Some(&probe_1080p(false))),
            Err(PlanError::NoAudioStream)
        ));
        let ok = plan(&req, Some(&probe_1080p(true))).unwrap();
        assert!(ok.args.contains(&"libmp3lame".to_string()));
        assert!(ok.args.contains(&"-vn".to_string()));
    }

    #[test]
    fn extract_frame_seeks_before_input() {
        let mut ov = Overrides::default();
        ov.timestamp_secs = Some(12.5);
        let req = request(Operation::ExtractFrame, ov, "/tmp/in_frame.png");
        let plan = plan(&req, Some(&probe_1080p(true))).unwrap();
        assert_eq!(&plan.args[..2], &["-ss".to_string(), "12.5".to_string()]);
        let i = plan.args.iter().position(|s| s == "-i").unwrap();
        assert!(i > 0, "-ss must precede -i");
        assert!(plan.args.contains(&"-vframes".to_string()));
    }

    #[test]
    fn images_to_video_loops_the_still() {
        let mut ov = Overrides::default();
        ov.clip_secs = Some(8.0);
        let req = request(Operation::ImagesToVideo, ov, "/tmp/in_video.mp4");
        let plan = plan(&req, None).unwrap();
        assert_eq!(&plan.args[..2], &["-loop".to_string(), "1".to_string()]);
        let t = plan.args.iter().position(|s| s == "-t").unwrap();
        assert_eq!(plan.args[t + 1], "8");
        assert!(plan.args.contains(&"yuv420p".to_string()));
    }

    #[test]
    fn jpeg_quality_is_clamped() {
        let mut ov = Overrides::default();
        ov.quality = Some(99);
        let req = request(Operation::ImageConvert, ov, "/tmp/out_converted.jpg");
        let plan = plan(&req, None).unwrap();
        let q = plan.args.iter().position(|s| s == "-q:v").unwrap();
        assert_eq!(plan.args[q + 1], "31");
        let vf = &plan.args[plan.args.iter().position(|s| s == "-vf").unwrap() + 1];
        assert!(vf.contains("format=yuvj420p"));
    }

    #[test]
    fn webp_defaults_to_q85() {
        let req = request(
            Operation::ImageConvert,
            Overrides::default(),
            "/tmp/out_converted.webp",
        );
        let plan = plan(&req, None).unwrap();
        let q = plan.args.iter().position(|s| s == "-q:v").unwrap();
        assert_eq!(plan.args[q + 1], "85");
    }

    #[test]
    fn output_naming_per_operation() {
        let input = Path::new("/videos/clip.mkv");
        assert_eq!(
            default_output(input, Operation::CompressToSize, "mp4", None),
            PathBuf::from("/videos/clip_compressed.mp4")
        );
        assert_eq!(
            default_output(input, Operation::ToGif, "gif", None),
            PathBuf::from("/videos/clip.gif")
        );
        assert_eq!(
            default_output(input, Operation::ExtractAudio, "mp3", Some(Path::new("/out"))),
            PathBuf::from("/out/clip_audio.mp3")
        );
        assert_eq!(
            default_output(input, Operation::ExtractFrame, "png", None),
            PathBuf::from("/videos/clip_frame.png")
        );
    }

    #[test]
    fn speed_preset_ladder() {
        assert_eq!(SpeedPreset::default(), SpeedPreset::Medium);
        assert_eq!(SpeedPreset::ALL.first().unwrap().as_str(), "ultrafast");
        assert_eq!(SpeedPreset::ALL.last().unwrap().as_str(), "veryslow");
        assert_eq!(SpeedPreset::ALL.len(), 9);
    }
}

use crate::cli::AppConfig;
use crate::plan::{
    ConversionRequest, DEFAULT_CLIP_SECS, DEFAULT_CRF, DEFAULT_FRAME_TIMESTAMP, DEFAULT_GIF_FPS,
    Operation, Overrides, Resolution, SpeedPreset, default_output, parse_resolution,
};
use anyhow::Result;
use dialoguer::{Input, Select, theme::ColorfulTheme};
use std::path::{Path, PathBuf};

pub enum MenuAction {
    Convert(ConversionRequest),
    Quit,
}

const MENU: &[&str] = &[
    "Convert video container (mp4/mkv/mov/...)",
    "Video -> GIF",
    "Extract audio (mp3)",
    "Compress video to a target size",
    "Convert image format",
    "Grab a single frame",
    "Image -> video clip",
    "Quit",
];

/// One pass of the menu: collect a fully-populated request (or Quit). All
/// terminal I/O stays here so planning and running remain pure.
pub fn next_request(cfg: &AppConfig) -> Result<MenuAction> {
    let theme = ColorfulTheme::default();
    let choice = Select::with_theme(&theme)
        .with_prompt("Pick an operation")
        .items(MENU)
        .default(0)
        .interact()?;

    let op = match choice {
        0 => Operation::Remux,
        1 => Operation::ToGif,
        2 => Operation::ExtractAudio,
        3 => Operation::CompressToSize,
        4 => Operation::ImageConvert,
        5 => Operation::ExtractFrame,
        6 => Operation::ImagesToVideo,
        _ => return Ok(MenuAction::Quit),
    };

    let input = prompt_existing_file(
        &theme,
        match op {
            Operation::ImageConvert | Operation::ImagesToVideo => {
                "Drop an image file here (or type its path)"
            }
            _ => "Drop a video file here (or type its path)",
        },
    )?;

    let mut overrides = Overrides::default();
    let ext: String;

    match op {
        Operation::Remux => {
            ext = prompt_format(&theme, &["mp4", "mkv", "mov", "avi", "webm", "wmv", "flv"])?;
            overrides.resolution = prompt_resolution(&theme)?;
            overrides.fps = prompt_optional_u32(&theme, "Frame rate (blank = keep source)")?;
            overrides.quality =
                prompt_optional_u8(&theme, "CRF 0-51, lower = better (blank = copy streams)")?;
            if overrides.quality.is_some() || overrides.resolution.is_some() {
                overrides.speed = prompt_speed(&theme, SpeedPreset::Medium)?;
            }
        }
        Operation::ToGif => {
            ext = "gif".into();
            overrides.resolution = prompt_resolution(&theme)?;
            overrides.fps = prompt_optional_u32(
                &theme,
                &format!("GIF frame rate (blank = {DEFAULT_GIF_FPS})"),
            )?;
        }
        Operation::ExtractAudio => {
            ext = "mp3".into();
        }
        Operation::CompressToSize => {
            ext = "mp4".into();
            let mb: u64 = Input::with_theme(&theme)
                .with_prompt("Target size in MB")
                .default(50)
                .interact_text()?;
            overrides.target_size_bytes = Some(mb * 1024 * 1024);
            overrides.resolution = prompt_resolution(&theme)?;
            overrides.speed = prompt_speed(&theme, SpeedPreset::Slow)?;
        }
        Operation::ImageConvert => {
            ext = prompt_format(&theme, &["jpg", "png", "webp", "bmp"])?;
            overrides.resolution = prompt_resolution(&theme)?;
            overrides.quality =
                prompt_optional_u8(&theme, "Image quality (blank = format default)")?;
        }
        Operation::ExtractFrame => {
            ext = prompt_format(&theme, &["jpg", "png", "webp"])?;
            overrides.timestamp_secs = Some(
                Input::with_theme(&theme)
                    .with_prompt("Timestamp in seconds")
                    .default(DEFAULT_FRAME_TIMESTAMP)
                    .interact_text()?,
            );
            overrides.resolution = prompt_resolution(&theme)?;
        }
        Operation::ImagesToVideo => {
            ext = "mp4".into();
            overrides.clip_secs = Some(
                Input::with_theme(&theme)
                    .with_prompt("Clip length in seconds")
                    .default(DEFAULT_CLIP_SECS)
                    .interact_text()?,
            );
            overrides.fps = prompt_optional_u32(&theme, "Frame rate (blank = 30)")?;
            overrides.resolution = prompt_resolution(&theme)?;
            overrides.quality =
                prompt_optional_u8(&theme, &format!("CRF 0-51 (blank = {DEFAULT_CRF})"))?;
        }
    }

    let default_out = default_output(&input, op, &ext, cfg.output_dir.as_deref());
    let output = prompt_output_path(&theme, &default_out)?;

    Ok(MenuAction::Convert(ConversionRequest {
        op,
        input,
        output,
        overrides,
    }))
}

/// Accept a dropped path: terminals wrap those in quotes, so strip them
/// along with surrounding whitespace.
fn prompt_existing_file(theme: &ColorfulTheme, prompt: &str) -> Result<PathBuf> {
    loop {
        let raw: String = Input::with_theme(theme)
            .with_prompt(prompt)
            .interact_text()?;
        let cleaned = raw.trim().trim_matches(|c| c == '"' || c == '\'');
        let path = PathBuf::from(cleaned);
        if path.is_file() {
            return Ok(path);
        }
        println!("File not found, please try again.");
    }
}

fn prompt_format(theme: &ColorfulTheme, formats: &[&str]) -> Result<String> {
    let idx = Select::with_theme(theme)
        .with_prompt("Output format")
        .items(formats)
        .default(0)
        .interact()?;
    Ok(formats[idx].to_string())
}

fn prompt_output_path(theme: &ColorfulTheme, default_out: &Path) -> Result<PathBuf> {
    let raw: String = Input::with_theme(theme)
        .with_prompt(format!("Output file [{}]", default_out.display()))
        .allow_empty(true)
        .interact_text()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        Ok(default_out.to_path_buf())
    } else {
        Ok(PathBuf::from(trimmed))
    }
}

fn prompt_resolution(theme: &ColorfulTheme) -> Result<Option<Resolution>> {
    loop {
        let raw: String = Input::with_theme(theme)
            .with_prompt("Resolution (1080p, 720p, WIDTHxHEIGHT; blank = keep source)")
            .allow_empty(true)
            .interact_text()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match parse_resolution(trimmed) {
            Ok(res) => return Ok(Some(res)),
            Err(err) => println!("{err}"),
        }
    }
}

fn prompt_speed(theme: &ColorfulTheme, default: SpeedPreset) -> Result<Option<SpeedPreset>> {
    let labels: Vec<&str> = SpeedPreset::ALL.iter().map(|p| p.as_str()).collect();
    let default_idx = SpeedPreset::ALL.iter().position(|p| *p == default).unwrap();
    let idx = Select::with_theme(theme)
        .with_prompt("Encoder speed preset")
        .items(&labels)
        .default(default_idx)
        .interact()?;
    Ok(Some(SpeedPreset::ALL[idx]))
}

fn prompt_optional_u32(theme: &ColorfulTheme, prompt: &str) -> Result<Option<u32>> {
    loop {
        let raw: String = Input::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<u32>() {
            Ok(n) if n > 0 => return Ok(Some(n)),
            _ => println!("Please enter a positive integer or leave blank."),
        }
    }
}

fn prompt_optional_u8(theme: &ColorfulTheme, prompt: &str) -> Result<Option<u8>> {
    loop {
        let raw: String = Input::with_theme(theme)
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?;
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        match trimmed.parse::<u8>() {
            Ok(n) => return Ok(Some(n)),
            Err(_) => println!("Please enter a small integer or leave blank."),
        }
    }
}

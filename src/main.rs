mod cli;
mod plan;
mod probe;
mod progress;
mod runner;
mod tools;
mod tui;

use anyhow::{Result, bail};
use clap::Parser;
use plan::{ConversionRequest, DEFAULT_CLIP_SECS, Operation};
use probe::Prober;
use runner::Runner;
use std::fs;

fn main() -> Result<()> {
    let cfg = cli::Cli::parse().into_config()?;
    let toolchain = tools::resolve_toolchain(cfg.ffmpeg.clone(), cfg.ffprobe.clone())?;
    println!(
        "mediaconv (ffmpeg: {}, ffprobe: {})\n",
        toolchain.ffmpeg.display(),
        toolchain.ffprobe.display()
    );

    let prober = Prober::new(toolchain.ffprobe);
    let runner = Runner::new(toolchain.ffmpeg, cfg.verbose);

    loop {
        match tui::next_request(&cfg)? {
            tui::MenuAction::Quit => break,
            tui::MenuAction::Convert(req) => {
                if let Err(err) = run_one(&prober, &runner, &req) {
                    println!("[!] {err:#}");
                }
                println!();
            }
        }
    }
    Ok(())
}

/// Drive one operation end to end: probe, plan, run, report.
fn run_one(prober: &Prober, runner: &Runner, req: &ConversionRequest) -> Result<()> {
    let probed = if req.op.probes_source() {
        Some(prober.probe(&req.input)?)
    } else {
        None
    };

    let plan = plan::plan(req, probed.as_ref())?;

    // Progress needs to know how long the output runs; image outputs finish
    // too fast to bother.
    let total_ms = match req.op {
        Operation::ImageConvert | Operation::ExtractFrame => None,
        Operation::ImagesToVideo => {
            let secs = req.overrides.clip_secs.unwrap_or(DEFAULT_CLIP_SECS);
            Some((secs * 1000.0).max(1.0) as u64)
        }
        _ => probed
            .as_ref()
            .map(|p| (p.duration_secs * 1000.0).max(1.0) as u64),
    };

    let result = runner.run(&plan, total_ms)?;
    if !result.success {
        if result.diagnostics.is_empty() {
            bail!("encoder failed on {}", req.input.display());
        }
        bail!(
            "encoder failed on {}:\n{}",
            req.input.display(),
            result.diagnostics
        );
    }

    match fs::metadata(&result.output) {
        Ok(meta) => println!(
            "[+] Wrote {} ({:.2} MB)",
            result.output.display(),
            meta.len() as f64 / 1024.0 / 1024.0
        ),
        Err(_) => println!("[+] Wrote {}", result.output.display()),
    }
    if !result.diagnostics.is_empty() {
        println!("[ffmpeg] {}", result.diagnostics);
    }
    Ok(())
}

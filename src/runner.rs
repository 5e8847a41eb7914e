use crate::plan::EncodePlan;
use crate::progress::{ProgressUi, pump_progress};
use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::thread;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum JobError {
    #[error("could not create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to spawn encoder: {0}")]
    Spawn(std::io::Error),
    #[error("encoder i/o error: {0}")]
    Io(#[from] std::io::Error),
}

/// Outcome of one encoder invocation. A nonzero exit is a result, not an
/// error: the shell decides what to tell the user.
#[derive(Debug)]
pub struct JobResult {
    pub success: bool,
    pub diagnostics: String,
    pub output: PathBuf,
}

pub struct Runner {
    ffmpeg: PathBuf,
    verbose: bool,
}

impl Runner {
    pub fn new(ffmpeg: PathBuf, verbose: bool) -> Self {
        Self { ffmpeg, verbose }
    }

    /// Spawn the encoder with the planned arguments and block until it
    /// exits. `total_ms` enables the progress bar when the output length is
    /// known up front. No retry, no parameter adjustment on failure.
    pub fn run(&self, plan: &EncodePlan, total_ms: Option<u64>) -> Result<JobResult, JobError> {
        if let Some(dir) = plan.output.parent() {
            if !dir.as_os_str().is_empty() && !dir.exists() {
                fs::create_dir_all(dir).map_err(|source| JobError::OutputDir {
                    path: dir.to_path_buf(),
                    source,
                })?;
            }
        }

        let mut cmd = Command::new(&self.ffmpeg);
        if !self.verbose {
            cmd.arg("-hide_banner")
                .arg("-nostats")
                .arg("-loglevel")
                .arg("error");
        }
        cmd.arg("-y").arg("-progress").arg("-");
        cmd.args(&plan.args);

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(JobError::Spawn)?;

        let mut stdout = child.stdout.take().ok_or_else(|| {
            JobError::Io(io::Error::other("failed to capture encoder stdout"))
        })?;
        let mut stderr = child.stderr.take().ok_or_else(|| {
            JobError::Io(io::Error::other("failed to capture encoder stderr"))
        })?;

        // Stdout carries the -progress stream; it must be drained either
        // way or the child can block on a full pipe.
        let pump = match total_ms {
            Some(ms) => pump_progress(stdout, ProgressUi::new(ms)),
            None => thread::spawn(move || {
                io::copy(&mut stdout, &mut io::sink())?;
                Ok(())
            }),
        };

        let mut diagnostics = String::new();
        stderr.read_to_string(&mut diagnostics)?;
        let status = child.wait()?;
        let _ = pump.join();

        Ok(JobResult {
            success: status.success(),
            diagnostics: diagnostics.trim().to_string(),
            output: plan.output.clone(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn plan_with_output(name: &str) -> EncodePlan {
        EncodePlan {
            args: vec![],
            output: std::env::temp_dir().join(name),
        }
    }

    #[test]
    fn nonzero_exit_reports_failure() {
        let runner = Runner::new(PathBuf::from("false"), false);
        let result = runner.run(&plan_with_output("mediaconv_fail.out"), None).unwrap();
        assert!(!result.success);
    }

    #[test]
    fn zero_exit_reports_success_and_echoes_output() {
        let runner = Runner::new(PathBuf::from("true"), false);
        let result = runner.run(&plan_with_output("mediaconv_ok.out"), None).unwrap();
        assert!(result.success);
        assert!(result.output.ends_with("mediaconv_ok.out"));
    }

    #[test]
    fn missing_encoder_is_a_spawn_error() {
        let runner = Runner::new(PathBuf::from("/nonexistent/ffmpeg-definitely-missing"), false);
        assert!(matches!(
            runner.run(&plan_with_output("mediaconv_missing.out"), None),
            Err(JobError::Spawn(_))
        ));
    }

    #[test]
    fn creates_missing_output_directory() {
        let dir = std::env::temp_dir()
            .join("mediaconv_runner_test")
            .join("nested");
        let _ = fs::remove_dir_all(dir.parent().unwrap());
        let plan = EncodePlan {
            args: vec![],
            output: dir.join("out.mp4"),
        };
        let runner = Runner::new(PathBuf::from("true"), false);
        runner.run(&plan, None).unwrap();
        assert!(dir.exists());
        let _ = fs::remove_dir_all(dir.parent().unwrap());
    }
}

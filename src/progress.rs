use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use std::io::{BufRead, BufReader, Read};
use std::thread;

pub struct ProgressUi {
    bar: ProgressBar,
    total_ms: u64,
}

impl ProgressUi {
    pub fn new(total_ms: u64) -> Self {
        let total_ms = total_ms.max(1);
        let bar = ProgressBar::new(total_ms);
        bar.set_style(
            ProgressStyle::with_template(
                "[{elapsed_precise}]  [{bar:50.cyan/bright-black}] {percent:>3}%  ETA:{eta_precise}  {msg}",
            )
            .unwrap()
            .progress_chars("#>-"),
        );
        bar.set_message("encoding");
        Self { bar, total_ms }
    }
}

/// Read ffmpeg's `-progress -` key=value stream off the child's stdout and
/// drive the bar until `progress=end`.
pub fn pump_progress<R: Read + Send + 'static>(
    reader: R,
    ui: ProgressUi,
) -> thread::JoinHandle<Result<()>> {
    thread::spawn(move || {
        let re_kv = Regex::new(r"^(\w+)=([\w\-\.:]+)$").unwrap();
        let reader = BufReader::new(reader);

        for line in reader.lines() {
            let line = line?;
            if let Some(caps) = re_kv.captures(&line) {
                let key = &caps[1];
                let val = &caps[2];
                match key {
                    // out_time_ms is reported in microseconds.
                    "out_time_ms" => {
                        let us: u64 = val.parse().unwrap_or(0);
                        ui.bar.set_position((us / 1000).min(ui.total_ms));
                    }
                    "progress" if val == "end" => {
                        ui.bar.finish_with_message("done");
                    }
                    _ => {}
                }
            }
        }
        Ok(())
    })
}

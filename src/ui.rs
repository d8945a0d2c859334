use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
    disable_pretty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool, disable_pretty: bool) -> Self {
        Self {
            mode,
            is_tty,
            disable_pretty,
        }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool, disable_pretty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => UiMode::Plain,
            Some("pretty") => UiMode::Pretty,
            _ => UiMode::Auto,
        };
        Self::new(mode, is_tty, disable_pretty)
    }

    /// A persistent status line showing the session's current status text.
    pub fn status_line(&self, initial: &str) -> StatusLine {
        let use_pretty = self.is_tty
            && match self.mode {
                UiMode::Pretty => true,
                UiMode::Auto => !self.disable_pretty,
                UiMode::Plain => false,
            };

        if use_pretty {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(initial.to_string());
            StatusLine::new(initial, Some(spinner))
        } else {
            eprintln!("==> {}", initial);
            StatusLine::new(initial, None)
        }
    }
}

pub struct StatusLine {
    start: Instant,
    last: String,
    spinner: Option<ProgressBar>,
}

impl StatusLine {
    fn new(initial: &str, spinner: Option<ProgressBar>) -> Self {
        Self {
            start: Instant::now(),
            last: initial.to_string(),
            spinner,
        }
    }

    /// Update the displayed text. Repeats of the current text are ignored.
    pub fn set(&mut self, text: &str) {
        if text == self.last {
            return;
        }
        self.last = text.to_string();
        match &self.spinner {
            Some(spinner) => spinner.set_message(text.to_string()),
            None => eprintln!("==> {}", text),
        }
    }

    pub fn finish(self, text: &str) {
        let elapsed = self.start.elapsed();
        let message = format!("✔ {} ({})", text, format_duration(elapsed));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}

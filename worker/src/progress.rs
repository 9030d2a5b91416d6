use indicatif::{ProgressBar, ProgressStyle};

const TEMPLATE: &str = "{msg} [{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len}";

/// The phase a message belongs to, each one with its own colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Info,
    Train,
    Eval,
}

impl Stage {
    fn tag(self) -> &'static str {
        match self {
            Stage::Info => "INFO",
            Stage::Train => "TRAIN",
            Stage::Eval => "EVAL",
        }
    }

    /// ANSI foreground colour code.
    fn color(self) -> u8 {
        match self {
            Stage::Info => 36,
            Stage::Train => 32,
            Stage::Eval => 31,
        }
    }
}

/// Tags and colours `msg` for terminal output, e.g. `[EVAL] Top-1:71.230`.
pub fn log_msg(msg: &str, stage: Stage) -> String {
    format!("\x1b[{}m[{}] {}\x1b[0m", stage.color(), stage.tag(), msg)
}

/// A terminal progress bar over a known amount of iterations.
///
/// Only the master worker should own one.
pub struct Progress {
    bar: ProgressBar,
    stage: Stage,
}

impl Progress {
    pub fn new(len: usize, stage: Stage) -> Self {
        let bar = ProgressBar::new(len as u64);
        let style = ProgressStyle::default_bar()
            .template(TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_bar());
        bar.set_style(style);

        Self { bar, stage }
    }

    /// Replaces the description and moves one iteration forward.
    pub fn advance(&self, msg: &str) {
        self.bar.set_message(log_msg(msg, self.stage));
        self.bar.inc(1);
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    pub fn finish(self) {
        self.bar.finish();
    }
}

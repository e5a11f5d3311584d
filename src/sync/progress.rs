use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::Duration;

const TICKS: &[&str] = &["⣾", "⣽", "⣻", "⢿", "⡿", "⣟", "⣯", "⣷"];

/// Start a yellow braille spinner showing `msg`.
///
/// With `quiet` the bar draws nowhere, which keeps non-interactive runs
/// (CI logs, tests) free of control sequences.
pub fn start(msg: String, quiet: bool) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if quiet {
        pb.set_draw_target(ProgressDrawTarget::hidden());
    }
    pb.set_style(
        ProgressStyle::with_template("\x1b[33m{spinner}\x1b[0m {wide_msg}")
            .unwrap()
            .tick_strings(TICKS),
    );
    pb.set_message(msg);
    pb.enable_steady_tick(Duration::from_millis(80));
    pb
}

/// Finish with a green check mark.
pub fn succeed(pb: &ProgressBar, msg: String) {
    pb.set_style(ProgressStyle::with_template("\x1b[32m✔\x1b[0m {wide_msg}").unwrap());
    pb.finish_with_message(msg);
}

/// Finish with a red cross.
pub fn fail(pb: &ProgressBar, msg: String) {
    pb.set_style(ProgressStyle::with_template("\x1b[31m✘\x1b[0m {wide_msg}").unwrap());
    pb.finish_with_message(msg);
}

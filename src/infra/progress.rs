// ============================================================
// Layer 6 — Progress Bars
// ============================================================
// One bar per training / validation phase. indicatif draws to
// stderr and stays silent when stderr is not a terminal, so
// tests and piped runs get clean output.
//
// Reference: indicatif crate documentation

use anyhow::Result;
use indicatif::{ProgressBar, ProgressStyle};

/// A bar of `len` steps labelled `label`, e.g. "epoch 3 train".
pub fn phase_bar(len: usize, label: impl Into<String>) -> Result<ProgressBar> {
    let bar = ProgressBar::new(len as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{msg:>16} [{bar:40.cyan/blue}] {pos}/{len} [{elapsed_precise}<{eta_precise}]")?
            .progress_chars("=>-"),
    );
    bar.set_message(label.into());
    Ok(bar)
}

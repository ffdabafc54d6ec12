/// Progress bars for the long per-cloud passes
use indicatif::{ProgressBar, ProgressStyle};

/// Bar with the shared template, or a hidden bar when progress is off.
pub fn progress_bar(len: usize, unit: &str, message: &'static str, visible: bool) -> ProgressBar {
    if !visible {
        return ProgressBar::hidden();
    }

    let pb = ProgressBar::new(len as u64);
    let template = format!("[{{bar:40.green/blue}}] {{pos}}/{{len}} {unit} ({{percent}}%) {{msg}}");
    let style = ProgressStyle::default_bar()
        .template(&template)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("▉▊▋▌▍▎▏ ");
    pb.set_style(style);
    pb.set_message(message);
    pb
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hidden_bar_still_counts() {
        let pb = progress_bar(10, "points", "Assigning", false);
        assert!(pb.is_hidden());
        pb.inc(3);
        assert_eq!(pb.position(), 3);
    }
}

use owo_colors::OwoColorize;

use mdflowy_core::{CollectStats, TriggerReason};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "mdflowy".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Markdown preview for outliner pages\n".dimmed());
}

/// Print a styled step message
pub fn print_step(step: usize, total: usize, message: &str) {
    eprintln!("{} {}", format!("[{}/{}]", step, total).dimmed(), message.bright_cyan());
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green(), message.bright_green());
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue(), message.bright_blue());
}

/// Print a warning message
pub fn print_warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow(), message.bright_yellow());
}

/// Print a labelled value, indented under the current step
pub fn print_field(label: &str, value: &str) {
    eprintln!("  {} {}", format!("{}:", label).dimmed(), value.bright_white());
}

/// Print what collection found on the page
pub fn print_collect_stats(stats: &CollectStats) {
    print_field("Visible nodes", &stats.visible.to_string());
    if stats.hidden > 0 {
        print_field("Hidden copies", &stats.hidden.to_string());
    }
    if stats.detached > 0 {
        print_field("Detached nodes", &stats.detached.to_string());
    }
}

/// Print the outcome of replaying one snapshot
pub fn print_replay(path: &str, records: usize, reason: Option<TriggerReason>) {
    let verdict = match reason {
        Some(TriggerReason::Structural) => "re-render (content changed)".bright_green().to_string(),
        Some(TriggerReason::Focus) => "re-render (focus moved)".bright_green().to_string(),
        None => "no re-render".dimmed().to_string(),
    };
    eprintln!("  {} {} records, {}", path.bright_white(), records, verdict);
}

/// Format file size for display
pub fn format_size(bytes: usize) -> String {
    const KB: usize = 1024;
    const MB: usize = 1024 * KB;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.0 KB");
        assert_eq!(format_size(3 * 1024 * 1024), "3.0 MB");
    }
}

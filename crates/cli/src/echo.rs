use owo_colors::OwoColorize;
use pocketshot_core::BatchStats;

use crate::VERSION;

/// Print a styled banner
pub fn print_banner() {
    eprintln!(
        "\n{} {} {}",
        "pocketshot".bold().bright_blue(),
        "v".dimmed(),
        VERSION.dimmed()
    );
    eprintln!("{}", "Saved items, with pictures\n".dimmed());
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

/// Print timing information, colored by how long the run took
pub fn print_timing(label: &str, duration: std::time::Duration) {
    let secs = duration.as_secs_f64();
    let label = format!("{}:", label);

    if secs < 10.0 {
        eprintln!("  {} {:>8.2}s ({})", label.dimmed(), secs, "fast".dimmed());
    } else if secs < 60.0 {
        eprintln!("  {} {:>8.2}s ({})", label.dimmed(), secs, "moderate".bright_yellow());
    } else {
        eprintln!("  {} {:>8.2}s ({})", label.dimmed(), secs, "slow".bright_red());
    }
}

/// Print image outcome counts for a batch
pub fn print_batch_summary(stats: &BatchStats) {
    eprintln!("\n{}", "═".repeat(60).dimmed());
    eprintln!("{}", "Images".bold().cyan());
    eprintln!("{}", "═".repeat(60).dimmed());
    eprintln!("  {} {}", "Items:".dimmed(), stats.total().to_string().bright_white());
    eprintln!("  {} {}", "Cached:".dimmed(), stats.cached.to_string().bright_white());
    eprintln!("  {} {}", "Acquired:".dimmed(), stats.acquired.to_string().bright_green());
    if stats.failed > 0 {
        eprintln!("  {} {}", "Failed:".dimmed(), stats.failed.to_string().bright_red());
    }
    if stats.skipped > 0 {
        eprintln!("  {} {}", "Skipped:".dimmed(), stats.skipped.to_string().bright_yellow());
    }
    eprintln!();
}

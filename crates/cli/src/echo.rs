use owo_colors::OwoColorize;

use paperfold_core::{ArticleRecord, HistoryEntry};

use crate::VERSION;

/// Print a styled banner for verbose mode
pub fn print_banner() {
    eprintln!("\n{} {} {}", "Paperfold".bold().bright_blue(), "v".dimmed(), VERSION.dimmed());
    eprintln!("{}", "Articles and PDFs, reflowed for e-paper\n".dimmed());
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

/// Print the fields of a normalized article
pub fn print_article_details(article: &ArticleRecord) {
    eprintln!("  {} {}", "Title:".dimmed(), article.display_title().bright_white());
    if let Some(author) = article.author_line() {
        eprintln!("  {} {}", "Author:".dimmed(), author.bright_white());
    }
    if let Some(byline) = article.byline() {
        eprintln!("  {} {}", "Source:".dimmed(), byline.bright_white());
    }
    if let Some(url) = article.feature_image_url() {
        eprintln!("  {} {}", "Image:".dimmed(), url.bright_white());
    }
    eprintln!("  {} {}\n", "Body:".dimmed(), format_size(article.body_len()).bright_white());
}

/// Print the history list to stdout, one tab-separated entry per line
pub fn print_history(entries: &[HistoryEntry]) {
    if entries.is_empty() {
        print_info("History is empty");
        return;
    }
    for entry in entries {
        println!("{}\t{}", entry.title, entry.url);
    }
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

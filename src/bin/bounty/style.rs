//! Terminal styling utilities

use bounty_escrow::{BountyState, SubmissionState};

pub fn style_cyan(s: &str) -> String {
    format!("\x1b[36m{}\x1b[0m", s)
}

pub fn style_green(s: &str) -> String {
    format!("\x1b[32m{}\x1b[0m", s)
}

pub fn style_red(s: &str) -> String {
    format!("\x1b[31m{}\x1b[0m", s)
}

pub fn style_yellow(s: &str) -> String {
    format!("\x1b[33m{}\x1b[0m", s)
}

pub fn style_dim(s: &str) -> String {
    format!("\x1b[2m{}\x1b[0m", s)
}

pub fn style_bold(s: &str) -> String {
    format!("\x1b[1m{}\x1b[0m", s)
}

pub fn print_success(msg: &str) {
    println!("{} {}", style_green("✓"), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", style_red("✗"), msg);
}

pub fn print_warning(msg: &str) {
    println!("{} {}", style_yellow("⚠"), msg);
}

pub fn print_info(msg: &str) {
    println!("{} {}", style_cyan("ℹ"), msg);
}

pub fn print_header(title: &str) {
    println!();
    println!("{}", style_bold(title));
    println!("{}", "─".repeat(title.chars().count()));
}

pub fn style_bounty_state(state: BountyState) -> String {
    let label = state.to_string();
    match state {
        BountyState::Created => style_yellow(&label),
        BountyState::Activated => style_green(&label),
        BountyState::Closed => style_dim(&label),
    }
}

pub fn style_submission_state(state: SubmissionState) -> String {
    let label = state.to_string();
    match state {
        SubmissionState::Created => style_yellow(&label),
        SubmissionState::Accepted => style_green(&label),
        SubmissionState::Rejected => style_red(&label),
    }
}

/// Shorten a long identifier or digest for display, keeping the first 8 and
/// last 4 characters. Short or non-ASCII strings are returned unchanged.
pub fn truncate_id(id: &str) -> String {
    if id.len() > 16 && id.is_ascii() {
        format!("{}...{}", &id[..8], &id[id.len() - 4..])
    } else {
        id.to_string()
    }
}

/// Cut free-form text to `max` characters for table cells.
pub fn ellipsize(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max.saturating_sub(1)).collect();
        format!("{}…", cut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_id() {
        assert_eq!(truncate_id("0xalice"), "0xalice");
        let digest = "a".repeat(64);
        assert_eq!(truncate_id(&digest), "aaaaaaaa...aaaa");
    }

    #[test]
    fn test_ellipsize() {
        assert_eq!(ellipsize("short", 10), "short");
        assert_eq!(ellipsize("a longer description", 8), "a longe…");
    }
}

//! CLI subcommands

pub mod admin;
pub mod bounty;
pub mod config;
pub mod events;
pub mod mine;
pub mod status;
pub mod submission;

use bounty_escrow::server::CommitResponse;

use crate::style::*;

/// Report a committed call.
pub fn print_committed(what: &str, resp: &CommitResponse) {
    match resp.id {
        Some(id) => print_success(&format!("{} (id {})", what, style_bold(&id.to_string()))),
        None => print_success(what),
    }
    println!(
        "  {} #{} {}",
        style_dim("event"),
        resp.record.seq,
        resp.record.event
    );
    println!(
        "  {} {}",
        style_dim("digest"),
        style_dim(&truncate_id(&resp.record.digest))
    );
}

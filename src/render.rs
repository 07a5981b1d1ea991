//! Terminal rendering of messages and progress phases

use crate::session::message::{Message, Role};
use crate::session::progress::{PhaseStatus, ProgressPhase};
use crossterm::style::Stylize;

pub fn render_message(message: &Message) {
    match message.role {
        Role::User => {}
        Role::Assistant => {
            let prefix = if message.is_error {
                "tutor!".red().bold()
            } else {
                "tutor".cyan().bold()
            };
            println!("\n{prefix} {}", message.content);
            if let Some(attachments) = &message.attachments {
                if !attachments.keywords.is_empty() {
                    println!(
                        "{}",
                        format!("  key concepts: {}", attachments.keywords.join(", ")).dim()
                    );
                }
                for source in &attachments.sources {
                    println!("{}", format!("  source: {} <{}>", source.title, source.url).dim());
                }
                if attachments.svg_flashcard.is_some() {
                    println!("{}", "  (visual flashcard attached)".dim());
                }
            }
            println!();
        }
    }
}

pub fn render_phase(phase: &ProgressPhase) {
    let glyph = match phase.status {
        PhaseStatus::Active => "…".yellow(),
        PhaseStatus::Completed => "✓".green(),
        PhaseStatus::Error => "✗".red(),
    };
    if phase.detail.is_empty() {
        println!("  {glyph} {}", phase.label);
    } else {
        println!("  {glyph} {} {}", phase.label, phase.detail.as_str().dim());
    }
}

pub fn render_banner() {
    println!("{}", "concept-tutor".bold());
    println!("Ask about any concept to get started. Ctrl-D exits.\n");
}

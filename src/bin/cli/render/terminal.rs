use cardstack_lib::flashcards::{Card, CardSet};
use cardstack_lib::review::ElaborationView;
use cardstack_lib::ReviewSession;

/// ANSI color codes
pub struct Color;

impl Color {
    pub const RESET: &str = "\x1b[0m";
    pub const BOLD: &str = "\x1b[1m";
    pub const DIM: &str = "\x1b[2m";
    pub const GREEN: &str = "\x1b[32m";
    pub const CYAN: &str = "\x1b[36m";
    pub const GRAY: &str = "\x1b[90m";
}

pub const NO_CARDS: &str = "No cards found.";
pub const NO_SETS: &str = "No card sets found.";

fn paint(text: &str, color: &str, use_color: bool) -> String {
    if use_color {
        format!("{}{}{}", color, text, Color::RESET)
    } else {
        text.to_string()
    }
}

/// One listing entry: title, owner and card count
pub fn render_set_line(set: &CardSet, use_color: bool) -> String {
    let owner = set.owner.as_deref().unwrap_or("demo");
    format!(
        "{}  {} {}\n  {}",
        paint(&set.title, Color::BOLD, use_color),
        paint(&format!("({} cards)", set.quantity), Color::DIM, use_color),
        paint(&format!("User: {}", owner), Color::GRAY, use_color),
        paint(&set.id, Color::GRAY, use_color),
    )
}

/// Front and back of a card with its number
pub fn render_card(number: usize, card: &Card, use_color: bool) -> String {
    let mut out = format!(
        "{} {}\n   {}",
        paint(&format!("{}.", number), Color::CYAN, use_color),
        card.front,
        paint(&card.back, Color::DIM, use_color),
    );
    if let Some(ai) = &card.elaboration {
        out.push_str(&format!("\n   {}", paint(ai, Color::GREEN, use_color)));
    }
    out
}

/// Side list of every card in review order with the current one marked
pub fn render_side_list(session: &ReviewSession, use_color: bool) -> String {
    if session.is_empty() {
        return NO_CARDS.to_string();
    }
    session
        .cards()
        .iter()
        .enumerate()
        .map(|(i, card)| {
            if i == session.position() {
                paint(&format!("> {}. {}", i + 1, card.front), Color::BOLD, use_color)
            } else {
                paint(&format!("  {}. {}", i + 1, card.front), Color::GRAY, use_color)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// The card face currently shown, plus the cached elaboration if any
pub fn render_review(title: &str, session: &ReviewSession, use_color: bool) -> String {
    let mut lines = vec![paint(title, Color::BOLD, use_color)];

    let Some(text) = session.visible_text() else {
        lines.push(NO_CARDS.to_string());
        return lines.join("\n");
    };

    let side = if session.face_up() { "front" } else { "back" };
    let mut status = format!("Card {} of {} ({})", session.position() + 1, session.len(), side);
    if session.is_shuffled() {
        status.push_str(" [shuffled]");
    }
    lines.push(paint(&status, Color::DIM, use_color));
    lines.push(String::new());
    lines.push(format!("  {}", text));

    if let Some(ElaborationView::Cached(ai)) = session.current_elaboration() {
        lines.push(String::new());
        lines.push(paint(&format!("  AI: {}", ai), Color::GREEN, use_color));
    }

    lines.push(String::new());
    lines.push(render_side_list(session, use_color));
    lines.join("\n")
}

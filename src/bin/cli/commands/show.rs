use anyhow::{Context, Result};
use cardstack_lib::AppContext;

use crate::render::terminal;
use crate::OutputFormat;

pub async fn run(app: &AppContext, set_id: &str, format: &OutputFormat, use_color: bool) -> Result<()> {
    let (set, session) = app
        .open_review(set_id)
        .await
        .with_context(|| format!("Failed to open set {}", set_id))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "set": set,
                "cards": session.base_order(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if use_color {
                println!("{}{}{}", terminal::Color::BOLD, set.title, terminal::Color::RESET);
            } else {
                println!("{}", set.title);
            }
            if session.is_empty() {
                println!("{}", terminal::NO_CARDS);
                return Ok(());
            }
            for (i, card) in session.base_order().iter().enumerate() {
                println!("{}", terminal::render_card(i + 1, card, use_color));
            }
        }
    }

    Ok(())
}

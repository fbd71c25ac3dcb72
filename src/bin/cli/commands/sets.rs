use anyhow::{Context, Result};
use cardstack_lib::AppContext;

use crate::render::terminal;
use crate::OutputFormat;

pub async fn run(app: &AppContext, format: &OutputFormat, use_color: bool) -> Result<()> {
    super::require_listing(app)?;
    let sets = app.list_sets().await.context("Failed to list card sets")?;

    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&sets)?);
        }
        OutputFormat::Plain => {
            if sets.is_empty() {
                println!("{}", terminal::NO_SETS);
                return Ok(());
            }
            for set in &sets {
                println!("{}", terminal::render_set_line(set, use_color));
            }
        }
    }

    Ok(())
}

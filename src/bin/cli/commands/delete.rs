use anyhow::{Context, Result};
use cardstack_lib::AppContext;

use crate::OutputFormat;

pub async fn run(app: &AppContext, set_id: &str, format: &OutputFormat) -> Result<()> {
    super::require_listing(app)?;
    let store = app.store()?;
    store
        .delete_set(set_id)
        .await
        .with_context(|| format!("Failed to delete set {}", set_id))?;

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({ "deleted": set_id });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Deleted {}", set_id),
    }

    Ok(())
}

use anyhow::{bail, Result};
use cardstack_lib::editor::SubmitError;
use cardstack_lib::flashcards::CardSide;
use cardstack_lib::{AppContext, Route, SetEditor};

use crate::OutputFormat;

/// Split "front::back"; a missing separator leaves the back blank
fn parse_card(arg: &str) -> (&str, &str) {
    arg.split_once("::").unwrap_or((arg, ""))
}

pub async fn run(app: &AppContext, title: &str, cards: &[String], format: &OutputFormat) -> Result<()> {
    let mut editor = SetEditor::new();
    editor.set_title(title);
    for (i, arg) in cards.iter().enumerate() {
        if i > 0 {
            editor.append();
        }
        let (front, back) = parse_card(arg);
        editor.edit(i, CardSide::Front, front)?;
        editor.edit(i, CardSide::Back, back)?;
    }

    let store = app.store()?;
    let user = app.user();
    let set_id = match editor.submit(store.as_ref(), user.owner_id()).await {
        Ok(id) => id,
        Err(SubmitError::Validation(e)) => bail!("{}", e),
        Err(e) => return Err(e.into()),
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "id": set_id,
                "title": title,
                "quantity": cards.len(),
                "route": Route::Listing.path(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("Created set {} ({} cards)", set_id, cards.len()),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card() {
        assert_eq!(parse_card("Q::A"), ("Q", "A"));
        assert_eq!(parse_card("a::b::c"), ("a", "b::c"));
        assert_eq!(parse_card("only front"), ("only front", ""));
    }
}

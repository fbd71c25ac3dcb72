pub mod auth;
pub mod create;
pub mod delete;
pub mod demo;
pub mod review;
pub mod sets;
pub mod show;

use anyhow::{bail, Result};
use cardstack_lib::{AppContext, Route};

/// Accept a bare set id or a review path such as `/flashcards/<id>`
pub fn set_id_arg(arg: &str) -> &str {
    match Route::parse(arg) {
        Some(Route::Review(_)) => arg.trim_end_matches('/').rsplit('/').next().unwrap_or(arg),
        _ => arg,
    }
}

/// Fail unless the listing is reachable for the current user
pub fn require_listing(app: &AppContext) -> Result<()> {
    if app.resolve(Route::Listing) != Route::Listing {
        bail!("Not signed in. Run `cardstack login <email>` or `cardstack demo enter` first.");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_id_arg() {
        assert_eq!(set_id_arg("cdst42"), "cdst42");
        assert_eq!(set_id_arg("/flashcards/cdst42"), "cdst42");
        assert_eq!(set_id_arg("/flashcards/cdst42/"), "cdst42");
        assert_eq!(set_id_arg("/dashboard"), "/dashboard");
    }
}

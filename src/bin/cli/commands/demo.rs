use anyhow::{Context, Result};
use cardstack_lib::{AppContext, Route};

use crate::OutputFormat;

fn report(route: Route, demo: bool, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "demo": demo,
                "route": route.path(),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => {
            if demo {
                println!("Demo mode on. Sets are stored on this machine only.");
            } else {
                println!("Demo mode off.");
            }
        }
    }
    Ok(())
}

pub fn run_enter(app: &mut AppContext, format: &OutputFormat) -> Result<()> {
    let route = app.enter_demo().context("Failed to enter demo mode")?;
    report(route, true, format)
}

pub fn run_exit(app: &mut AppContext, format: &OutputFormat) -> Result<()> {
    let route = app.exit_demo().context("Failed to leave demo mode")?;
    report(route, false, format)
}

use anyhow::Result;
use cardstack_lib::session::{SessionUser, SignUpOutcome, CONFIRM_EMAIL_MESSAGE};
use cardstack_lib::AppContext;

use crate::OutputFormat;

fn print_user(user: &SessionUser, format: &OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(user)?),
        OutputFormat::Plain => match user {
            SessionUser::Anonymous => println!("Not signed in."),
            SessionUser::Demo => println!("Demo mode (no account)."),
            SessionUser::Authenticated { .. } => println!("Signed in as {}.", user.label()),
        },
    }
    Ok(())
}

pub async fn run_login(app: &mut AppContext, email: &str, password: &str, format: &OutputFormat) -> Result<()> {
    let user = app.sign_in(email, password).await?;
    print_user(&user, format)
}

pub async fn run_signup(app: &mut AppContext, email: &str, password: &str, format: &OutputFormat) -> Result<()> {
    match app.sign_up(email, password).await? {
        SignUpOutcome::SignedIn(user) => print_user(&user, format),
        SignUpOutcome::ConfirmationRequired => {
            match format {
                OutputFormat::Json => {
                    let output = serde_json::json!({
                        "confirmationRequired": true,
                        "message": CONFIRM_EMAIL_MESSAGE,
                    });
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                OutputFormat::Plain => println!("{}", CONFIRM_EMAIL_MESSAGE),
            }
            Ok(())
        }
    }
}

pub fn run_logout(app: &mut AppContext, format: &OutputFormat) -> Result<()> {
    app.sign_out()?;
    print_user(&app.user(), format)
}

pub fn run_whoami(app: &AppContext, format: &OutputFormat) -> Result<()> {
    print_user(&app.user(), format)
}

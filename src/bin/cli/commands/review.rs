use anyhow::{bail, Context, Result};
use cardstack_lib::elaborate::{ElaborationOutcome, Elaborator};
use cardstack_lib::review::ElaborationView;
use cardstack_lib::{AppContext, ReviewSession, ViewScope};
use std::io::BufRead;

use tokio::sync::mpsc;

use crate::render::terminal;
use crate::OutputFormat;

const HELP: &str = "n next, p previous, f flip, s shuffle, j <number> jump, e elaborate, q quit";

#[derive(Debug, PartialEq, Eq)]
enum Key {
    Next,
    Previous,
    Flip,
    Shuffle,
    Jump(usize),
    Elaborate,
    Quit,
    Help,
}

fn parse_key(line: &str) -> Option<Key> {
    let mut parts = line.split_whitespace();
    let key = match parts.next()? {
        "n" | "next" => Key::Next,
        "p" | "prev" | "previous" => Key::Previous,
        "f" | "flip" => Key::Flip,
        "s" | "shuffle" => Key::Shuffle,
        "j" | "jump" => Key::Jump(parts.next()?.parse().ok()?),
        "e" | "elaborate" => Key::Elaborate,
        "q" | "quit" => Key::Quit,
        "h" | "help" | "?" => Key::Help,
        _ => return None,
    };
    Some(key)
}

/// Use the cached elaboration when the card has one, otherwise ask the relay
async fn elaborate(elaborator: &Elaborator, session: &mut ReviewSession) -> Option<String> {
    if let Some(ElaborationView::Cached(text)) = session.current_elaboration() {
        return Some(text.to_string());
    }
    let outcome = elaborator.elaborate_current(session).await?;
    Some(outcome.display_text().to_string())
}

/// Read stdin lines on a plain thread. A thread blocked in `read_line` is
/// simply left behind when the view closes, so Ctrl-C ends the process.
fn spawn_line_reader() -> mpsc::Receiver<std::io::Result<String>> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            if tx.blocking_send(line).is_err() {
                break;
            }
        }
    });
    rx
}

/// Interactive review loop. Ctrl-C closes the view and abandons any pending request.
pub async fn run(app: &AppContext, set_id: &str, use_color: bool) -> Result<()> {
    let scope = ViewScope::new("review");
    let token = scope.token();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            token.cancel();
        }
    });

    let (set, mut session) = scope
        .run(app.open_review(set_id))
        .await?
        .with_context(|| format!("Failed to open set {}", set_id))?;
    let elaborator = app.elaborator().context("Failed to set up elaborations")?;

    println!("{}", terminal::render_review(&set.title, &session, use_color));
    println!("{}", HELP);

    let mut lines = spawn_line_reader();
    loop {
        let Ok(line) = scope.run(lines.recv()).await else {
            break;
        };
        let Some(line) = line.transpose()? else {
            break;
        };
        let Some(key) = parse_key(&line) else {
            if !line.trim().is_empty() {
                println!("{}", HELP);
            }
            continue;
        };

        match key {
            Key::Next => {
                session.next();
            }
            Key::Previous => {
                session.previous();
            }
            Key::Flip => session.flip(),
            Key::Shuffle => session.toggle_shuffle(),
            Key::Jump(number) => {
                if number == 0 || !session.jump_to(number - 1) {
                    println!("No card {}", number);
                    continue;
                }
            }
            Key::Elaborate => {
                if session.is_empty() {
                    println!("{}", terminal::NO_CARDS);
                    continue;
                }
                println!("Elaborating...");
                match scope.run(elaborate(&elaborator, &mut session)).await {
                    Ok(Some(text)) => println!("AI: {}", text),
                    Ok(None) => {}
                    Err(_) => break,
                }
                continue;
            }
            Key::Help => {
                println!("{}", HELP);
                continue;
            }
            Key::Quit => break,
        }

        println!("{}", terminal::render_review(&set.title, &session, use_color));
    }

    if scope.is_cancelled() {
        println!();
        log::debug!("Review of {} interrupted", set_id);
    }
    Ok(())
}

/// Elaborate on card `number` (1-based) of a set and print the result
pub async fn run_elaborate(app: &AppContext, set_id: &str, number: usize, format: &OutputFormat) -> Result<()> {
    let (_set, mut session) = app
        .open_review(set_id)
        .await
        .with_context(|| format!("Failed to open set {}", set_id))?;
    if number == 0 || !session.jump_to(number - 1) {
        bail!("Set {} has no card {}", set_id, number);
    }
    let card_id = session.current().map(|c| c.id.clone()).unwrap_or_default();

    let elaborator = app.elaborator().context("Failed to set up elaborations")?;
    let cached_text = match session.current_elaboration() {
        Some(ElaborationView::Cached(text)) => Some(text.to_string()),
        _ => None,
    };
    let (text, cached, saved) = match cached_text {
        Some(text) => (text, true, true),
        None => match elaborator.elaborate_current(&mut session).await {
            Some(ElaborationOutcome::Elaborated { text, saved }) => (text, false, saved),
            Some(failed) => (failed.display_text().to_string(), false, false),
            None => bail!("Set {} has no cards", set_id),
        },
    };

    match format {
        OutputFormat::Json => {
            let output = serde_json::json!({
                "cardId": card_id,
                "elaboration": text,
                "cached": cached,
                "saved": saved,
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Plain => println!("{}", text),
    }

    Ok(())
}

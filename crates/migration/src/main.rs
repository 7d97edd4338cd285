//! Schema tool for the rental database.
//!
//! `migration [up [STEPS] | down [STEPS] | fresh | reset | status]`, against
//! `DATABASE_URL` (default `sqlite:./carrental.db?mode=rwc`).

use sea_orm::Database;
use sea_orm_migration::prelude::*;

const USAGE: &str = "Usage: cargo run -p migration -- [up [STEPS]|down [STEPS]|fresh|reset|status]";

#[derive(Debug, PartialEq, Eq)]
enum Action {
    Up(Option<u32>),
    /// Without a step count only the last migration is rolled back.
    Down(Option<u32>),
    Fresh,
    Reset,
    Status,
}

fn parse_action(mut args: impl Iterator<Item = String>) -> Result<Action, String> {
    let cmd = args.next().unwrap_or_else(|| "up".to_string());
    let steps = match args.next() {
        Some(raw) => Some(
            raw.parse::<u32>()
                .map_err(|_| format!("invalid step count: {raw}"))?,
        ),
        None => None,
    };

    match (cmd.as_str(), steps) {
        ("up", steps) => Ok(Action::Up(steps)),
        ("down", steps) => Ok(Action::Down(Some(steps.unwrap_or(1)))),
        ("fresh", None) => Ok(Action::Fresh),
        ("reset", None) => Ok(Action::Reset),
        ("status", None) => Ok(Action::Status),
        (other, _) => Err(format!("unknown command: {other}")),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let action = match parse_action(std::env::args().skip(1)) {
        Ok(action) => action,
        Err(err) => {
            eprintln!("{err}\n{USAGE}");
            std::process::exit(2);
        }
    };

    let db_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite:./carrental.db?mode=rwc".to_string());
    let db = Database::connect(&db_url).await?;

    match action {
        Action::Up(steps) => migration::Migrator::up(&db, steps).await?,
        Action::Down(steps) => migration::Migrator::down(&db, steps).await?,
        Action::Fresh => migration::Migrator::fresh(&db).await?,
        Action::Reset => migration::Migrator::reset(&db).await?,
        Action::Status => migration::Migrator::status(&db).await?,
    }

    Ok(())
}

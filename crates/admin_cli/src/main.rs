use std::{
    error::Error,
    io::{Stderr, Write},
};

use chrono::{NaiveDate, Utc};
use clap::{ArgGroup, Args, Parser, Subcommand};
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyModifiers},
    execute,
    style::Print,
    terminal,
    terminal::ClearType,
};
use engine::{
    CarCategory, Discount, Engine, FuelType, MIN_PASSWORD_LEN, Money, NewCar, NewOffer,
    Transmission, User,
};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "carrental_admin")]
#[command(about = "Admin utilities for the car rental backend (bootstrap admins, fleet, offers)")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./carrental.db?mode=rwc"
    )]
    database_url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Admin(Admin),
    Car(Car),
    Offer(Offer),
}

#[derive(Args, Debug)]
struct Admin {
    #[command(subcommand)]
    command: AdminCommand,
}

#[derive(Subcommand, Debug)]
enum AdminCommand {
    Create(AdminCreateArgs),
}

#[derive(Args, Debug)]
struct AdminCreateArgs {
    #[arg(long)]
    username: String,
    #[arg(long)]
    email: String,
}

#[derive(Args, Debug)]
struct Car {
    #[command(subcommand)]
    command: CarCommand,
}

#[derive(Subcommand, Debug)]
enum CarCommand {
    Add(CarAddArgs),
}

#[derive(Args, Debug)]
struct CarAddArgs {
    /// Admin account performing the change; its password is prompted.
    #[arg(long)]
    admin: String,
    #[arg(long)]
    make: String,
    #[arg(long)]
    model: String,
    #[arg(long)]
    year: i32,
    #[arg(long, value_parser = parse_category)]
    category: CarCategory,
    #[arg(long, default_value_t = 5)]
    seats: u8,
    #[arg(long, value_parser = parse_transmission, default_value = "manual")]
    transmission: Transmission,
    #[arg(long, value_parser = parse_fuel, default_value = "petrol")]
    fuel: FuelType,
    /// Daily rate as a decimal amount, e.g. `45.50`.
    #[arg(long, value_parser = parse_money)]
    daily_rate: Money,
    #[arg(long)]
    location: String,
    #[arg(long)]
    plate: String,
}

#[derive(Args, Debug)]
struct Offer {
    #[command(subcommand)]
    command: OfferCommand,
}

#[derive(Subcommand, Debug)]
enum OfferCommand {
    Create(OfferCreateArgs),
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("discount").required(true).args(["percent", "flat"])))]
struct OfferCreateArgs {
    #[arg(long)]
    admin: String,
    #[arg(long)]
    code: String,
    #[arg(long)]
    title: String,
    #[arg(long)]
    description: Option<String>,
    /// Percentage off the subtotal, e.g. `12.5`.
    #[arg(long, value_parser = parse_money)]
    percent: Option<Money>,
    /// Fixed amount off the subtotal, e.g. `20`.
    #[arg(long, value_parser = parse_money)]
    flat: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    max_discount: Option<Money>,
    #[arg(long, value_parser = parse_money)]
    min_subtotal: Option<Money>,
    #[arg(long)]
    valid_from: NaiveDate,
    #[arg(long)]
    valid_until: NaiveDate,
    #[arg(long)]
    usage_limit: Option<u32>,
    #[arg(long)]
    per_user_limit: Option<u32>,
    #[arg(long, value_parser = parse_category)]
    category: Option<CarCategory>,
    #[arg(long)]
    first_booking_only: bool,
    /// Push an offer notification to every user.
    #[arg(long)]
    notify: bool,
}

type CliResult<T> = Result<T, Box<dyn Error + Send + Sync>>;

fn parse_money(raw: &str) -> Result<Money, String> {
    raw.parse::<Money>().map_err(|err| err.to_string())
}

fn parse_category(raw: &str) -> Result<CarCategory, String> {
    CarCategory::try_from(raw).map_err(|err| err.to_string())
}

fn parse_transmission(raw: &str) -> Result<Transmission, String> {
    Transmission::try_from(raw).map_err(|err| err.to_string())
}

fn parse_fuel(raw: &str) -> Result<FuelType, String> {
    FuelType::try_from(raw).map_err(|err| err.to_string())
}

/// Percent values are parsed as two-decimal amounts, so their minor units
/// are basis points.
fn discount(args: &OfferCreateArgs) -> CliResult<Discount> {
    match (args.percent, args.flat) {
        (Some(percent), None) => Ok(Discount::Percentage {
            bps: u32::try_from(percent.minor())?,
        }),
        (None, Some(flat)) => Ok(Discount::Flat {
            amount_minor: flat.minor(),
        }),
        _ => Err("exactly one of --percent or --flat is required".into()),
    }
}

const PASSWORD_ATTEMPTS: usize = 3;

/// Stderr in raw mode for the lifetime of a prompt; restored on drop.
struct MaskedTerminal {
    out: Stderr,
}

impl MaskedTerminal {
    fn enter() -> CliResult<Self> {
        terminal::enable_raw_mode()?;
        Ok(Self {
            out: std::io::stderr(),
        })
    }

    /// Replace the current line with `text`.
    fn show(&mut self, text: &str) -> CliResult<()> {
        execute!(
            self.out,
            cursor::MoveToColumn(0),
            terminal::Clear(ClearType::CurrentLine),
            Print(text)
        )?;
        self.out.flush()?;
        Ok(())
    }

    /// Read one line, echoing `*` per character. Ctrl-C and Esc abort.
    fn read_secret(&mut self, prompt: &str) -> CliResult<String> {
        self.show(prompt)?;

        let mut secret = String::new();
        loop {
            let Event::Key(KeyEvent {
                code, modifiers, ..
            }) = event::read()?
            else {
                continue;
            };

            match code {
                KeyCode::Enter => break,
                KeyCode::Esc => {
                    self.show("\r\n")?;
                    return Err("aborted".into());
                }
                KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                    self.show("\r\n")?;
                    return Err("interrupted".into());
                }
                KeyCode::Backspace if secret.pop().is_some() => {
                    execute!(self.out, cursor::MoveLeft(1), Print(" "), cursor::MoveLeft(1))?;
                }
                KeyCode::Char(ch) if !modifiers.contains(KeyModifiers::CONTROL) => {
                    secret.push(ch);
                    execute!(self.out, Print("*"))?;
                }
                _ => continue,
            }
            self.out.flush()?;
        }

        execute!(self.out, Print("\r\n"))?;
        self.out.flush()?;
        Ok(secret)
    }
}

impl Drop for MaskedTerminal {
    fn drop(&mut self) {
        let _ = terminal::disable_raw_mode();
    }
}

/// Why the engine would refuse `password` for a new account, if it would.
fn password_problem(password: &str) -> Option<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Some(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters."
        ));
    }
    None
}

fn prompt_password(prompt: &str) -> CliResult<String> {
    MaskedTerminal::enter()?.read_secret(prompt)
}

/// Ask for a new password until it is acceptable and confirmed.
fn prompt_new_password() -> CliResult<String> {
    let mut term = MaskedTerminal::enter()?;
    for _ in 0..PASSWORD_ATTEMPTS {
        let password = term.read_secret("New password: ")?;
        if let Some(problem) = password_problem(&password) {
            term.show(&format!("{problem}\r\n"))?;
            continue;
        }

        if term.read_secret("Confirm password: ")? == password {
            return Ok(password);
        }
        term.show("Passwords do not match. Try again.\r\n")?;
    }

    Err("too many attempts".into())
}

async fn connect_db(database_url: &str) -> CliResult<DatabaseConnection> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    Ok(db)
}

async fn login_admin(engine: &Engine, username: &str) -> CliResult<User> {
    let password = prompt_password(&format!("Password for {username}: "))?;
    let user = engine.authenticate(username, &password).await?;
    if !user.is_admin() {
        return Err(format!("{username} is not an admin").into());
    }
    Ok(user)
}

#[tokio::main]
async fn main() -> CliResult<()> {
    let cli = Cli::parse();

    let db = connect_db(&cli.database_url).await?;
    let engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Admin(Admin {
            command: AdminCommand::Create(args),
        }) => {
            let password = prompt_new_password()?;
            let admin = engine
                .create_admin(&args.username, &args.email, &password, Utc::now())
                .await?;
            println!("created admin: {} ({})", admin.username, admin.id);
        }
        Command::Car(Car {
            command: CarCommand::Add(args),
        }) => {
            let admin = login_admin(&engine, &args.admin).await?;
            let car = engine
                .add_car(
                    admin.id,
                    NewCar {
                        make: args.make,
                        model: args.model,
                        year: args.year,
                        category: args.category,
                        seats: args.seats,
                        transmission: args.transmission,
                        fuel: args.fuel,
                        daily_rate_minor: args.daily_rate.minor(),
                        location: args.location,
                        plate_number: args.plate,
                    },
                    Utc::now(),
                )
                .await?;
            println!(
                "added car: {} {} [{}] ({})",
                car.make, car.model, car.plate_number, car.id
            );
        }
        Command::Offer(Offer {
            command: OfferCommand::Create(args),
        }) => {
            let admin = login_admin(&engine, &args.admin).await?;
            let discount = discount(&args)?;
            let offer = engine
                .create_offer(
                    admin.id,
                    NewOffer {
                        code: args.code,
                        title: args.title,
                        description: args.description,
                        discount,
                        max_discount_minor: args.max_discount.map(Money::minor),
                        min_subtotal_minor: args.min_subtotal.map(Money::minor),
                        valid_from: args.valid_from,
                        valid_until: args.valid_until,
                        usage_limit: args.usage_limit,
                        per_user_limit: args.per_user_limit,
                        car_category: args.category,
                        first_booking_only: args.first_booking_only,
                    },
                    args.notify,
                    Utc::now(),
                )
                .await?;
            println!("created offer: {} ({})", offer.code, offer.id);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_offer_discount_flags() {
        let cli = Cli::try_parse_from([
            "carrental_admin",
            "offer",
            "create",
            "--admin",
            "root",
            "--code",
            "SPRING",
            "--title",
            "Spring",
            "--percent",
            "12.5",
            "--valid-from",
            "2026-05-01",
            "--valid-until",
            "2026-05-31",
        ])
        .unwrap();
        let Command::Offer(Offer {
            command: OfferCommand::Create(args),
        }) = cli.command
        else {
            panic!("expected offer create");
        };
        assert_eq!(discount(&args).unwrap(), Discount::Percentage { bps: 1_250 });
    }

    #[test]
    fn short_passwords_are_refused_before_confirmation() {
        assert!(password_problem("hunter2").is_some());
        assert!(password_problem("hunter22").is_none());
        assert!(password_problem("").is_some());
    }

    #[test]
    fn rejects_both_discount_kinds() {
        let res = Cli::try_parse_from([
            "carrental_admin",
            "offer",
            "create",
            "--admin",
            "root",
            "--code",
            "X",
            "--title",
            "X",
            "--percent",
            "10",
            "--flat",
            "5",
            "--valid-from",
            "2026-05-01",
            "--valid-until",
            "2026-05-31",
        ]);
        assert!(res.is_err());
    }

    #[test]
    fn parses_car_rate_as_money() {
        let cli = Cli::try_parse_from([
            "carrental_admin",
            "car",
            "add",
            "--admin",
            "root",
            "--make",
            "Fiat",
            "--model",
            "Panda",
            "--year",
            "2022",
            "--category",
            "economy",
            "--daily-rate",
            "45,50",
            "--location",
            "Milano",
            "--plate",
            "AA000AA",
        ])
        .unwrap();
        let Command::Car(Car {
            command: CarCommand::Add(args),
        }) = cli.command
        else {
            panic!("expected car add");
        };
        assert_eq!(args.daily_rate.minor(), 4_550);
        assert_eq!(args.transmission, Transmission::Manual);
    }
}

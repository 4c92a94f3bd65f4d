pub mod commands;

use clap::{Parser, Subcommand};
use rust_decimal::Decimal;
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "paverly",
    about = "Paverly operator CLI",
    long_about = "Operate Paverly migrations, seed data, config inspection, and offline quote estimates.",
    after_help = "Examples:\n  paverly migrate\n  paverly seed\n  paverly estimate --width 20 --length 25 --labor"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the shipped catalog, delivery zones, and pricing defaults")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Compute a material (and optionally labor) quote offline")]
    Estimate {
        #[arg(long, help = "Area width in feet")]
        width: Decimal,
        #[arg(long, help = "Area length in feet")]
        length: Decimal,
        #[arg(long, help = "Waste percentage applied to the area (default 10)")]
        waste: Option<Decimal>,
        #[arg(long, help = "Pallet price override (default 285)")]
        price_per_pallet: Option<Decimal>,
        #[arg(long, help = "Pallet coverage override in sqft (default 100)")]
        sqft_per_pallet: Option<Decimal>,
        #[arg(long, help = "Flat delivery fee (default 0)")]
        delivery_fee: Option<Decimal>,
        #[arg(long, help = "Include the labor quote (default rate 8.00/sqft)")]
        labor: bool,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Estimate {
            width,
            length,
            waste,
            price_per_pallet,
            sqft_per_pallet,
            delivery_fee,
            labor,
        } => commands::estimate::run(commands::estimate::EstimateArgs {
            width,
            length,
            waste,
            price_per_pallet,
            sqft_per_pallet,
            delivery_fee,
            labor,
        }),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

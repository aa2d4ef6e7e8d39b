mod commands;
mod input;
mod logging;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::investment::{InvestArgs, ScheduleArgs};
use commands::sale::{CompareArgs, SaleArgs};
use commands::scenarios::{ScenarioArgs, SensitivityArgs};

/// Real-estate investment cash flow, ROI and hold-then-sell analysis
#[derive(Parser)]
#[command(
    name = "propinv",
    version,
    about = "Real-estate investment cash flow, ROI and hold-then-sell analysis",
    long_about = "A CLI for evaluating leveraged rental property purchases with decimal \
                  precision. Runs the monthly cash-flow pipeline, sale projections over a \
                  holding period, holding-period comparisons, economic scenarios and \
                  two-way sensitivity grids. Inputs are JSON or YAML files, or JSON on stdin."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,

    /// Engine configuration file overriding defaults, thresholds and sale limits
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log engine diagnostics to stderr at debug level
    #[arg(long, short, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the cash-flow pipeline, optionally with a sale analysis
    Invest(InvestArgs),
    /// Project a sale at the end of a holding period
    Sale(SaleArgs),
    /// Compare several holding periods
    Compare(CompareArgs),
    /// Apply an economic scenario (or a probability-weighted set)
    Scenario(ScenarioArgs),
    /// Two-way sensitivity grid over investment fields
    Sensitivity(SensitivityArgs),
    /// Month-by-month amortization schedule of the loan
    Schedule(ScheduleArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let engine = match commands::load_engine_config(cli.config.as_deref()) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    };

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Invest(args) => commands::investment::run_invest(args, &engine),
        Commands::Sale(args) => commands::sale::run_sale(args, &engine),
        Commands::Compare(args) => commands::sale::run_compare(args, &engine),
        Commands::Scenario(args) => commands::scenarios::run_scenario(args, &engine),
        Commands::Sensitivity(args) => commands::scenarios::run_sensitivity(args, &engine),
        Commands::Schedule(args) => commands::investment::run_schedule(args, &engine),
        Commands::Version => {
            println!("propinv {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}

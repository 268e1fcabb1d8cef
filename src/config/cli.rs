use crate::core::{CalculationRequest, ContractType};
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Parser)]
#[command(name = "portage-sim")]
#[command(about = "Portage salarial payroll simulator")]
pub struct Cli {
    /// Path to a TOML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Simulate one month of pay and print the result as JSON
    Simulate(SimulateArgs),

    /// Simulate every row of a CSV file of requests
    Batch {
        #[arg(short, long)]
        input: String,

        #[arg(short, long)]
        output: String,
    },

    /// Check a commune code against the reference dataset
    CheckCommune { code: String },

    /// Show the configuration and the reference dataset status
    Info,
}

#[derive(Debug, Clone, clap::Args)]
pub struct SimulateArgs {
    /// Daily rate (TJM)
    #[arg(long)]
    pub tjm: Decimal,

    #[arg(long)]
    pub days: u32,

    /// CDI or CDD
    #[arg(long, default_value = "CDI")]
    pub contract: ContractType,

    /// Operating expenses, in percent
    #[arg(long)]
    pub operating_expense_rate: Option<Decimal>,

    /// Management fee, in percent
    #[arg(long)]
    pub management_fee_rate: Option<Decimal>,

    /// Negotiated provision, in percent (CDI only)
    #[arg(long)]
    pub provision_rate: Option<Decimal>,

    #[arg(long)]
    pub meal_vouchers: bool,

    #[arg(long)]
    pub insurance: bool,

    /// INSEE commune code
    #[arg(long)]
    pub commune: Option<String>,
}

impl From<SimulateArgs> for CalculationRequest {
    fn from(args: SimulateArgs) -> Self {
        CalculationRequest {
            daily_rate: args.tjm,
            days_worked: args.days,
            contract_type: args.contract,
            operating_expense_rate: args.operating_expense_rate,
            management_fee_rate: args.management_fee_rate,
            negotiated_provision_rate: args.provision_rate,
            meal_voucher_enabled: args.meal_vouchers,
            supplemental_insurance_enabled: args.insurance,
            commune_code: args.commune,
        }
    }
}

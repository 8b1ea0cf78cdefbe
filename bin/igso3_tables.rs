use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use igso3::{Igso3Table, TableConfig, init_logger_with_level};
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "igso3_tables")]
#[command(about = "Precompute IGSO(3) CDF and score-norm tables and print a per-sigma summary")]
struct Args {
    /// Number of noise scales in the log-uniform schedule
    #[arg(long, default_value = "500")]
    num_sigma: usize,

    /// Number of rotation angles discretizing (0, π]
    #[arg(long, default_value = "1000")]
    num_omega: usize,

    /// Lower end of the sigma range (excluded from the grid)
    #[arg(long, default_value = "0.02")]
    min_sigma: f64,

    /// Upper end of the sigma range
    #[arg(long, default_value = "1.5")]
    max_sigma: f64,

    /// Series truncation level
    #[arg(short = 'l', long, default_value = "2000")]
    truncation: usize,

    /// Print every sigma row instead of a sparse selection
    #[arg(short, long)]
    verbose: bool,
}

fn print_summary(table: &Igso3Table, verbose: bool) {
    let rows = table.num_sigma();
    let stride = if verbose { 1 } else { (rows / 10).max(1) };

    println!("\n{}", "=".repeat(56));
    println!("{:>6} {:>14} {:>14} {:>18}", "row", "sigma", "cdf(π)", "E|score|");
    println!("{}", "-".repeat(56));
    for i in (0..rows).step_by(stride).chain(std::iter::once(rows - 1)) {
        let last = table.num_omega() - 1;
        println!(
            "{:>6} {:>14.6} {:>14.6} {:>18.6}",
            i,
            table.discrete_sigma[i],
            table.cdf[(i, last)],
            table.exp_score_norms[i]
        );
        if i == rows - 1 {
            break;
        }
    }
    println!("{}", "=".repeat(56));
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logger_with_level(if args.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    });

    let config = TableConfig::new(
        args.num_sigma,
        args.num_omega,
        args.min_sigma,
        args.max_sigma,
    )
    .with_truncation(args.truncation);

    let start = Instant::now();
    match Igso3Table::build(&config) {
        Ok(table) => {
            info!(
                "Built {}x{} table in {:.2?}",
                table.num_sigma(),
                table.num_omega(),
                start.elapsed()
            );
            print_summary(&table, args.verbose);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Failed to build table: {e}");
            ExitCode::FAILURE
        }
    }
}

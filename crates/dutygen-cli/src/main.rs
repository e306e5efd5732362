mod logging;

use clap::{Parser, Subcommand};
use dutygen_core::{DriverMode, GraphBuilder, Schedule, SolverConfig, TripTable};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "dutygen")]
#[command(about = "Driver duty scheduling by column generation", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(short, long, global = true)]
    verbose: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build duties for a trip file
    Solve {
        /// The trip CSV
        trips: PathBuf,
        /// Where to write the duty of every trip row
        #[arg(short, long, default_value = "duties.csv")]
        output: PathBuf,
        /// JSON solver configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Allow one vehicle change per duty
        #[arg(long)]
        relay: bool,
        /// Pricing rounds before giving up on convergence
        #[arg(long)]
        max_iterations: Option<usize>,
        /// Seconds allowed for the integer solve
        #[arg(long)]
        time_limit: Option<u64>,
        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// Check a duty file against a trip file
    Verify {
        /// The trip CSV
        trips: PathBuf,
        /// One duty id per trip row
        duties: PathBuf,
        /// JSON solver configuration
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Parse a trip file and report its transfer graph
    Check {
        /// The trip CSV
        trips: PathBuf,
        /// Build the two-level relay graph
        #[arg(long)]
        relay: bool,
    },
}

fn main() {
    let cli = Cli::parse();
    logging::init(cli.verbose);

    match cli.command {
        Commands::Solve {
            trips,
            output,
            config,
            relay,
            max_iterations,
            time_limit,
            json,
        } => {
            let mut config = load_config(config.as_deref());
            if relay {
                config.mode = DriverMode::Relay;
            }
            if let Some(max) = max_iterations {
                config.max_iterations = max;
            }
            if let Some(secs) = time_limit {
                config.integer_time_limit_secs = secs;
            }
            let table = load_trips(&trips);

            let outcome = match dutygen_core::solve(&table, &config) {
                Ok(o) => o,
                Err(e) => {
                    eprintln!("Solve error: {}", e);
                    std::process::exit(1);
                }
            };

            let schedule = Schedule::from_assignment(&outcome.assignment);
            if let Err(e) = schedule.write_csv_path(&output) {
                eprintln!("Error writing schedule: {}", e);
                std::process::exit(1);
            }

            let report = match dutygen_core::verify(&table, &schedule, &config) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Verify error: {}", e);
                    std::process::exit(1);
                }
            };

            if json {
                let summary = serde_json::json!({
                    "outcome": outcome,
                    "verification": report,
                    "verifier_objective": report.objective(),
                });
                match serde_json::to_string_pretty(&summary) {
                    Ok(s) => println!("{}", s),
                    Err(e) => {
                        eprintln!("Error encoding summary: {}", e);
                        std::process::exit(1);
                    }
                }
            } else {
                println!("Trips: {}", table.len());
                println!("Duties: {}", outcome.duties.len());
                println!("Objective: {:.0}", outcome.objective);
                println!("LP bound: {:.4}", outcome.lp_bound);
                println!("Gap: {:.2}%", outcome.gap() * 100.0);
                println!(
                    "Iterations: {} ({} columns added, {:?})",
                    outcome.iterations, outcome.columns_added, outcome.stop
                );
                println!("Total time and penalties: {} minutes", report.objective());
                for exhausted in &outcome.exhausted {
                    println!(
                        "Warning: {:?} exhausted at objective {:.0}, bound {:.4}",
                        exhausted.resource, exhausted.objective, exhausted.lp_bound
                    );
                }
                println!("Schedule written to {}", output.display());
            }

            if !report.is_acceptable() {
                for v in &report.violations {
                    eprintln!("  - {}", v);
                }
                std::process::exit(1);
            }
        }
        Commands::Verify { trips, duties, config } => {
            let config = load_config(config.as_deref());
            let table = load_trips(&trips);

            let schedule = match Schedule::read_csv_path(&duties, table.len()) {
                Ok(s) => s,
                Err(e) => {
                    eprintln!("Error reading schedule: {}", e);
                    std::process::exit(1);
                }
            };
            let report = match dutygen_core::verify(&table, &schedule, &config) {
                Ok(r) => r,
                Err(e) => {
                    eprintln!("Verify error: {}", e);
                    std::process::exit(1);
                }
            };

            println!("Duties: {}", report.duty_count);
            println!("Total time and penalties: {} minutes", report.objective());
            if report.is_acceptable() {
                println!("No errors found, the schedule is acceptable");
            } else {
                println!("{} errors found:", report.violations.len());
                for v in &report.violations {
                    println!("  - {}", v);
                }
                std::process::exit(1);
            }
        }
        Commands::Check { trips, relay } => {
            let table = load_trips(&trips);
            let mode = if relay { DriverMode::Relay } else { DriverMode::Single };
            let config = SolverConfig::default();

            match GraphBuilder::new(mode, config.rules).build(&table) {
                Ok(graph) => {
                    let stats = graph.stats();
                    println!("✓ {} is valid", trips.display());
                    println!("  Trips: {}", table.len());
                    println!("  Vehicles: {}", table.vehicle_count());
                    println!("  Graph nodes: {}", stats.trip_nodes);
                    println!("  Transfer edges: {}", stats.transfer_edges);
                    if graph.mode() == DriverMode::Relay {
                        println!("  Handover edges: {}", stats.handover_edges);
                    }
                }
                Err(e) => {
                    eprintln!("✗ {} has errors:", trips.display());
                    eprintln!("  {}", e);
                    std::process::exit(1);
                }
            }
        }
    }
}

fn load_config(path: Option<&Path>) -> SolverConfig {
    let Some(path) = path else {
        return SolverConfig::default();
    };
    match SolverConfig::from_json_path(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Config error: {}", e);
            std::process::exit(1);
        }
    }
}

fn load_trips(path: &Path) -> TripTable {
    match dutygen_core::read_trips_path(path) {
        Ok(t) => t,
        Err(e) => {
            eprintln!("Error reading trips: {}", e);
            std::process::exit(1);
        }
    }
}

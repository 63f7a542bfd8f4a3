use clap::{Parser, Subcommand, ValueEnum};

use lumen::ir::Stmt;
use lumen::poly::report::model_report;
use lumen::{auto_parallelize, optimize, pipelines, runtime, Feature, Polytope, Target};

#[derive(Parser)]
#[command(
    name = "lumen",
    version,
    about = "Lumen mid-end — polyhedral dependence analysis and auto-parallelization"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the polytope model of a demo pipeline
    Model {
        demo: Demo,
        /// Pipeline extent along each axis
        #[arg(long, default_value_t = 100)]
        size: i64,
        /// Emit the machine-readable report instead of text
        #[arg(long)]
        json: bool,
    },
    /// Print a demo pipeline before and after auto-parallelization
    Parallelize {
        demo: Demo,
        #[arg(long, default_value_t = 100)]
        size: i64,
        /// Leave the ApplyPolyhedralModel feature off
        #[arg(long)]
        no_poly: bool,
    },
    /// Execute a demo pipeline through the reference interpreter
    Run {
        demo: Demo,
        #[arg(long, default_value_t = 100)]
        size: i64,
        /// Auto-parallelize before running
        #[arg(long)]
        parallel: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Demo {
    Vadd,
    Vadd2d,
    Matmul,
    Fibonacci,
    Nonlinear,
}

impl Demo {
    fn lower(self, size: i64) -> Stmt {
        match self {
            Demo::Vadd => pipelines::vadd(size),
            Demo::Vadd2d => pipelines::vadd2d(size),
            Demo::Matmul => pipelines::matmul(size),
            Demo::Fibonacci => pipelines::fibonacci(size),
            Demo::Nonlinear => pipelines::nonlinear(size),
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(message) = run(cli) {
        eprintln!("error: {}", message);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), String> {
    match cli.command {
        Command::Model { demo, size, json } => {
            let stmt = demo.lower(size);
            let polytope = Polytope::analyze(&stmt).map_err(|e| e.to_string())?;
            if json {
                let report = model_report(&stmt, &polytope).map_err(|e| e.to_string())?;
                let text = serde_json::to_string_pretty(&report).map_err(|e| e.to_string())?;
                println!("{}", text);
            } else {
                print!("{}", polytope);
            }
        }

        Command::Parallelize { demo, size, no_poly } => {
            let stmt = demo.lower(size);
            println!("before:");
            print!("{}", stmt);

            let mut target = Target::host();
            if !no_poly {
                target.set_feature(Feature::ApplyPolyhedralModel);
            }
            let optimized = optimize(&stmt, &target).map_err(|e| e.to_string())?;
            println!("\nafter:");
            print!("{}", optimized);
        }

        Command::Run { demo, size, parallel } => {
            let stmt = demo.lower(size);
            let stmt = if parallel {
                let polytope = Polytope::analyze(&stmt).map_err(|e| e.to_string())?;
                auto_parallelize(&stmt, &polytope).map_err(|e| e.to_string())?
            } else {
                stmt
            };

            let store = runtime::execute(&stmt).map_err(|e| e.to_string())?;
            for (name, buffer) in &store.buffers {
                let head: Vec<i64> = buffer.data.iter().take(8).copied().collect();
                println!("{}: {} elements, head {:?}", name, buffer.data.len(), head);
            }
        }
    }
    Ok(())
}

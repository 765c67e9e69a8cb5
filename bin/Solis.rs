use clap::{Parser, Subcommand};
use solis::{parse_ltlf, synthesize, Context, Partition, SynthesisError};
use std::process;

#[derive(Parser, Debug)]
#[command(name = "Solis")]
#[command(about = "SDD-based forward LTLf synthesis (Solis)", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decide realizability of an LTLf formula against a variable partition
    Synthesize {
        /// Path to the LTLf formula file
        formula_path: String,
        /// Path to the `.inputs:`/`.outputs:` partition file
        partition_path: String,
    },
}

fn main() {
    env_logger::init();

    let args = Args::parse();
    let Command::Synthesize {
        formula_path,
        partition_path,
    } = args.command;

    let formula_text = match std::fs::read_to_string(&formula_path) {
        Ok(text) => text,
        Err(e) => {
            eprintln!("Error reading formula file: {}", e);
            process::exit(2);
        }
    };

    let partition = match Partition::parse_file(&partition_path) {
        Ok(partition) => partition,
        Err(e) => {
            eprintln!("Error parsing partition file: {}", e);
            process::exit(2);
        }
    };

    let mut ctx = Context::new();
    let formula = match parse_ltlf(&mut ctx, formula_text.trim()) {
        Ok(formula) => formula,
        Err(e) => {
            eprintln!("Error parsing formula: {}", e);
            process::exit(2);
        }
    };

    match synthesize(&mut ctx, formula, &partition) {
        Ok(true) => println!("REALIZABLE"),
        Ok(false) => {
            println!("UNREALIZABLE");
            process::exit(1);
        }
        Err(e @ (SynthesisError::Parse(_) | SynthesisError::InvalidArgument(_))) => {
            eprintln!("Error: {}", e);
            process::exit(2);
        }
        Err(SynthesisError::Cancelled) => {
            eprintln!("Error: synthesis was cancelled");
            process::exit(4);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(3);
        }
    }
}

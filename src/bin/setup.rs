//! Opsdesk setup check
//!
//! Operator-facing preflight: verifies the two required backend settings
//! are present and prints remediation guidance for anything missing.

use clap::Parser;

use opsdesk::config::AppConfig;

#[derive(Parser)]
#[command(name = "opsdesk-setup")]
#[command(about = "Check required Opsdesk configuration")]
#[command(version)]
struct Cli {
    /// Only set the exit code; print nothing
    #[arg(short, long)]
    quiet: bool,
}

fn main() {
    let cli = Cli::parse();

    let checks = AppConfig::diagnose();
    let missing: Vec<_> = checks.iter().filter(|c| !c.present).collect();

    if !cli.quiet {
        println!("Opsdesk setup check");
        println!();
        for check in &checks {
            let status = if check.present { "ok" } else { "MISSING" };
            println!("  [{}] {}", status, check.var);
        }
        if missing.is_empty() {
            println!();
            println!("All required settings present. You're ready to go.");
        } else {
            println!();
            println!("To fix:");
            for check in &missing {
                println!("  {}: {}", check.var, check.hint);
            }
            println!();
            println!("Add the exports to your shell profile or deployment environment,");
            println!("then run this check again.");
        }
    }

    if !missing.is_empty() {
        std::process::exit(1);
    }
}

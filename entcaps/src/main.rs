mod cli;
mod commands;
mod observability;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<()> {
    observability::init_tracing();
    let cli = Cli::parse();

    let output = match cli.command {
        Commands::Hash {
            profile,
            algorithms,
        } => commands::hash::run(&profile, &algorithms, cli.json)?,
        Commands::Verify { profile, caps } => {
            let report = commands::verify::run(&profile, &caps)?;
            let text = report.render(cli.json)?;
            if !report.verified() {
                println!("{}", text);
                anyhow::bail!("capability hashes do not match the profile");
            }
            text
        }
        Commands::Cache { dir, action } => commands::cache::run(dir, action, cli.json)?,
    };

    println!("{}", output);
    Ok(())
}

use anyhow::Context;
use clap::Parser;
use seating_solver::config::{Args, Command};
use seating_solver::data::SeatingInput;
use seating_solver::{server, solver};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&args.log_level))
        .init();

    match args.command() {
        Command::Serve => server::run_server(args.bind)
            .await
            .with_context(|| format!("server on {} stopped", args.bind))?,
        Command::Solve { input, compact } => {
            let raw = std::fs::read_to_string(&input)
                .with_context(|| format!("reading {}", input.display()))?;
            let input: SeatingInput = serde_json::from_str(&raw).context("parsing seating input")?;
            let output = solver::solve(&input)?;
            let rendered = if compact {
                serde_json::to_string(&output)?
            } else {
                serde_json::to_string_pretty(&output)?
            };
            println!("{}", rendered);
        }
    }
    Ok(())
}

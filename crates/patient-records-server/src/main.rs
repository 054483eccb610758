use anyhow::{bail, Context};
use clap::Parser;
use patient_records_server::cli::{Cli, Commands, ServeArgs};
use patient_records_server::{open_store, serve, telemetry, Config};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    let command = cli.command.unwrap_or(Commands::Serve(ServeArgs::default()));
    match &command {
        Commands::Serve(args) => args.apply(&mut config),
        Commands::Init(args) => args.apply(&mut config),
        Commands::Check(args) => args.apply(&mut config),
        Commands::Config => {}
    }
    config.validate()?;

    telemetry::init(&config.logging)?;

    match command {
        Commands::Serve(_) => serve(&config).await?,
        Commands::Init(_) => {
            let store = open_store(&config)?;
            let path = config.storage.path.display();
            if store.init()? {
                println!("Created empty patient document at {}", path);
            } else {
                println!("Patient document already exists at {}", path);
            }
        }
        Commands::Check(_) => {
            let store = open_store(&config)?;
            let total = store.load()?.len();
            let findings = store.audit()?;
            for finding in &findings {
                println!("{}: {}", finding.id, finding.error);
            }
            if !findings.is_empty() {
                bail!(
                    "{} of {} stored patients failed validation",
                    findings.len(),
                    total
                );
            }
            println!("All {} stored patients are valid", total);
        }
        Commands::Config => print!("{}", config.export_toml()?),
    }

    Ok(())
}

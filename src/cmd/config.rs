//! Configuration view and validation commands — `automerge config`.

use anyhow::{Context, Result};
use automerge_ai::config::{AutomergeToml, CONFIG_FILE_NAME, Config};

use super::super::{Cli, ConfigCommands};

pub fn cmd_config(cli: &Cli, command: Option<ConfigCommands>) -> Result<()> {
    let config = Config::load(cli.data_dir.clone(), cli.api_url.clone())
        .context("Failed to load configuration")?;
    let config_path = config.config_file();

    match command {
        None | Some(ConfigCommands::Show) => {
            println!();
            println!("AutoMerge AI Configuration");
            println!("==========================");
            println!();

            if config_path.exists() {
                println!("Config file: {}", config_path.display());
            } else {
                println!("No {} found at {}", CONFIG_FILE_NAME, config_path.display());
                println!("Using default configuration.");
            }
            println!();

            println!("[api]");
            println!("  base_url = \"{}\"", config.toml.api.base_url);
            println!("  timeout_secs = {}", config.toml.api.timeout_secs);
            println!();
            println!("[session]");
            println!("  store_file = \"{}\"", config.toml.session.store_file);
            println!();

            println!("Effective values (with env/CLI overrides):");
            println!("  data_dir = \"{}\"", config.data_dir.display());
            println!("  api_base_url = \"{}\"", config.api_base_url());
            println!("  session_file = \"{}\"", config.session_file().display());
            println!();
        }
        Some(ConfigCommands::Validate) => {
            println!();
            println!("Validating configuration...");
            println!();

            if !config_path.exists() {
                println!("No {} found. Checking defaults.", CONFIG_FILE_NAME);
            }

            let warnings = config.validate();
            if warnings.is_empty() {
                println!("Configuration is valid.");
            } else {
                println!("Configuration warnings:");
                for warning in warnings {
                    println!("  - {}", warning);
                }
            }
            println!();
        }
        Some(ConfigCommands::Init) => {
            if config_path.exists() {
                println!(
                    "{} already exists at {}",
                    CONFIG_FILE_NAME,
                    config_path.display()
                );
                println!("Delete it first if you want to recreate it.");
                return Ok(());
            }

            if !config.data_dir.exists() {
                std::fs::create_dir_all(&config.data_dir).with_context(|| {
                    format!("Failed to create {}", config.data_dir.display())
                })?;
            }

            AutomergeToml::default().save(&config_path)?;

            println!("Created {} at {}", CONFIG_FILE_NAME, config_path.display());
            println!();
            println!("You can now customize:");
            println!("  - [api] base_url, timeout_secs");
            println!("  - [session] store_file");
            println!();
        }
    }

    Ok(())
}

//! Config subcommand handlers.

use std::io::IsTerminal;
use std::path::PathBuf;

use dialoguer::Input;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, OutputFormat};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Use the flag when given; otherwise ask, or leave unset off a terminal.
fn path_value(
    flag: Option<PathBuf>,
    prompt: &str,
    interactive: bool,
) -> Result<Option<PathBuf>, CliError> {
    if flag.is_some() || !interactive {
        return Ok(flag);
    }
    let raw: String = Input::new()
        .with_prompt(prompt)
        .allow_empty(true)
        .interact_text()
        .map_err(prompt_err)?;
    let raw = raw.trim();
    Ok((!raw.is_empty()).then(|| PathBuf::from(raw)))
}

fn render_config(cfg: &Config, format: OutputFormat) -> Result<String, CliError> {
    output::render_single(
        format,
        cfg,
        |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("<unrenderable config: {e}>")),
        |c| {
            c.inventory
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default()
        },
    )
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init {
            set_inventory,
            set_collections_dir,
            force,
        } => {
            let path = config::config_path();
            if path.exists() && !force {
                return Err(CliError::Conflict {
                    resource_type: "config file".into(),
                    identifier: path.display().to_string(),
                });
            }

            let interactive = !global.yes && std::io::stdin().is_terminal();
            if interactive {
                eprintln!("thingctl configuration");
                eprintln!("   Config path: {}\n", path.display());
            }

            let cfg = Config {
                inventory: path_value(set_inventory, "Inventory file (JSON)", interactive)?,
                collections_dir: path_value(
                    set_collections_dir,
                    "Collections directory (empty for default)",
                    interactive,
                )?,
                ..Config::default()
            };
            cfg.validate()?;

            let written = config::save_config(&cfg)?;
            output::print_status(
                &format!("Config written to {}", written.display()),
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Show => {
            let cfg = config::load_config()?;
            let format = global.output.unwrap_or(OutputFormat::Table);
            let out = render_config(&cfg, format)?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), global.quiet);
            Ok(())
        }
    }
}

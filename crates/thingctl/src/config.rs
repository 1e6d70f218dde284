//! CLI configuration: thin wrapper around `thingctl_config`.
//!
//! Merges the loaded config file with `GlobalOpts` flags into the
//! `Settings` every command handler receives. Flags win over config.

use std::path::PathBuf;

use clap::ValueEnum;

use thingctl_core::{CollectionManager, FileStore, InventoryFile};

use crate::cli::{ColorMode, GlobalOpts, OutputFormat};
use crate::error::CliError;
use crate::output;

// ── Re-exports from shared crate ────────────────────────────────────

pub use thingctl_config::{Config, config_path, load_config, save_config};

/// Resolved per-invocation settings.
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone)]
pub struct Settings {
    pub output: OutputFormat,
    pub color: bool,
    pub quiet: bool,
    pub yes: bool,
    /// Prompt before batch runs (from config).
    pub confirm: bool,
    pub collections_dir: PathBuf,
    inventory: Option<PathBuf>,
}

impl Settings {
    pub fn resolve(global: &GlobalOpts, cfg: &Config) -> Result<Self, CliError> {
        let output = match global.output {
            Some(format) => format,
            None => parse_value::<OutputFormat>("defaults.output", &cfg.defaults.output)?,
        };
        let color = match global.color {
            Some(mode) => mode,
            None => parse_value::<ColorMode>("defaults.color", &cfg.defaults.color)?,
        };
        let inventory = thingctl_config::resolve_inventory(cfg, global.inventory.as_deref()).ok();
        Ok(Self {
            output,
            color: output::should_color(color),
            quiet: global.quiet,
            yes: global.yes,
            confirm: cfg.defaults.confirm,
            collections_dir: thingctl_config::resolve_collections_dir(
                cfg,
                global.collections_dir.as_deref(),
            ),
            inventory,
        })
    }

    /// The configured inventory, or `NoInventory`.
    pub fn inventory(&self) -> Result<InventoryFile, CliError> {
        self.inventory
            .as_ref()
            .map(InventoryFile::new)
            .ok_or(CliError::NoInventory)
    }

    pub fn collections(&self) -> CollectionManager<FileStore> {
        CollectionManager::new(FileStore::new(&self.collections_dir))
    }

    pub fn painter(&self) -> output::Painter {
        output::Painter::new(self.color)
    }
}

fn parse_value<T: ValueEnum>(field: &str, raw: &str) -> Result<T, CliError> {
    T::from_str(raw, true).map_err(|reason| CliError::Validation {
        field: field.into(),
        reason,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::path::Path;

    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["thingctl"];
        argv.extend_from_slice(args);
        argv.extend_from_slice(&["devices", "list"]);
        Cli::try_parse_from(argv).unwrap().global
    }

    #[test]
    fn flags_override_config_defaults() {
        let mut cfg = Config::default();
        cfg.defaults.output = "yaml".into();
        cfg.inventory = Some(PathBuf::from("cfg.json"));

        let from_cfg = Settings::resolve(&global(&[]), &cfg).unwrap();
        assert_eq!(from_cfg.output, OutputFormat::Yaml);
        assert_eq!(from_cfg.inventory().unwrap().path(), Path::new("cfg.json"));

        let flagged = Settings::resolve(&global(&["-o", "json", "--inventory", "flag.json"]), &cfg).unwrap();
        assert_eq!(flagged.output, OutputFormat::Json);
        assert_eq!(flagged.inventory().unwrap().path(), Path::new("flag.json"));
    }

    #[test]
    fn missing_inventory_is_reported_lazily() {
        let settings = Settings::resolve(&global(&["--color", "never"]), &Config::default()).unwrap();
        assert!(!settings.color);
        assert!(matches!(settings.inventory(), Err(CliError::NoInventory)));
    }
}

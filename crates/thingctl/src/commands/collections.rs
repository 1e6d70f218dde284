//! Collection command handlers.

use serde::Serialize;
use tabled::Tabled;
use thingctl_core::{Collection, DeviceId, DeviceSnapshot, query_ids};

use crate::cli::{CollectionsArgs, CollectionsCommand};
use crate::config::Settings;
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct CollectionRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Devices")]
    devices: usize,
    #[tabled(rename = "Updated")]
    updated: String,
}

impl From<&Collection> for CollectionRow {
    fn from(c: &Collection) -> Self {
        Self {
            name: c.name().into(),
            devices: c.len(),
            updated: c.updated_at().format("%Y-%m-%d %H:%M").to_string(),
        }
    }
}

fn detail(c: &Collection) -> String {
    let mut lines = vec![
        format!("Name:     {}", c.name()),
        format!("Devices:  {}", c.len()),
        format!("Created:  {}", c.created_at().to_rfc3339()),
        format!("Updated:  {}", c.updated_at().to_rfc3339()),
    ];
    if !c.is_empty() {
        lines.push(String::new());
        lines.extend(c.ids().map(|id| format!("  {id}")));
    }
    lines.join("\n")
}

/// A collection mapped onto the current inventory.
#[derive(Serialize)]
struct ResolvedView<'a> {
    name: &'a str,
    devices: Vec<&'a DeviceSnapshot>,
    missing: Vec<DeviceId>,
}

fn resolved_detail(v: &ResolvedView<'_>) -> String {
    let mut lines = vec![
        format!("Name:     {}", v.name),
        format!("Resolved: {}", v.devices.len()),
        format!("Missing:  {}", v.missing.len()),
    ];
    if !v.devices.is_empty() {
        lines.push(String::new());
        lines.extend(v.devices.iter().map(|d| {
            let room = d.room.as_deref().unwrap_or("-");
            format!("  {:<16} {:<24} {room}", d.id, d.label)
        }));
    }
    if !v.missing.is_empty() {
        lines.push(String::new());
        lines.push("No longer in the inventory:".into());
        lines.extend(v.missing.iter().map(|id| format!("  {id}")));
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: CollectionsArgs, settings: &Settings) -> Result<(), CliError> {
    let manager = settings.collections();

    match args.command {
        CollectionsCommand::List => {
            let collections = manager
                .list()?
                .iter()
                .map(|name| manager.load(name))
                .collect::<Result<Vec<_>, _>>()?;
            let out = output::render_list(
                settings.output,
                &collections,
                |c| CollectionRow::from(c),
                |c| c.name().into(),
            )?;
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        CollectionsCommand::Show {
            name,
            resolve: false,
        } => {
            let collection = manager.load(&name)?;
            print_collection(&collection, settings)
        }

        CollectionsCommand::Show {
            name,
            resolve: true,
        } => {
            let collection = manager.load(&name)?;
            let (_, devices) = util::load_devices(settings)?;
            let resolution = manager.resolve(&collection, &devices);
            let view = ResolvedView {
                name: collection.name(),
                devices: resolution.devices,
                missing: resolution.missing,
            };
            let out = output::render_single(settings.output, &view, resolved_detail, |v| {
                v.devices
                    .iter()
                    .map(|d| d.id.to_string())
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            output::print_output(&out, settings.quiet);
            Ok(())
        }

        CollectionsCommand::Create { name, ids } => {
            let ids = util::parse_ids(&ids)?;
            let collection = manager.create(&name, ids)?;
            output::print_status(
                &format!("Created collection '{}' ({} devices)", collection.name(), collection.len()),
                settings.quiet,
            );
            Ok(())
        }

        CollectionsCommand::Save { collection, filter } => {
            let (_, devices) = util::load_devices(settings)?;
            let filter = util::build_filter(&filter)?;
            let ids = query_ids(&devices, &filter);
            let saved = manager.save(&collection, ids)?;
            output::print_status(
                &format!("Saved collection '{}' ({} devices)", saved.name(), saved.len()),
                settings.quiet,
            );
            Ok(())
        }

        CollectionsCommand::Add { name, ids } => {
            let ids = util::parse_ids(&ids)?;
            let collection = manager.add(&name, ids)?;
            print_collection(&collection, settings)
        }

        CollectionsCommand::Remove { name, ids } => {
            let ids = util::parse_ids(&ids)?;
            let collection = manager.remove(&name, &ids)?;
            print_collection(&collection, settings)
        }

        CollectionsCommand::Merge { target, source } => {
            let collection = manager.merge(&target, &source)?;
            print_collection(&collection, settings)
        }

        CollectionsCommand::Delete { name } => {
            // Surface NotFound before prompting.
            manager.load(&name)?;
            if !util::confirm(
                &format!("Delete collection '{name}'?"),
                "collections delete",
                settings.yes,
            )? {
                return Ok(());
            }
            manager.delete(&name)?;
            output::print_status(&format!("Deleted collection '{name}'"), settings.quiet);
            Ok(())
        }
    }
}

fn print_collection(collection: &Collection, settings: &Settings) -> Result<(), CliError> {
    let out = output::render_single(settings.output, collection, detail, |c| {
        c.ids().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    })?;
    output::print_output(&out, settings.quiet);
    Ok(())
}

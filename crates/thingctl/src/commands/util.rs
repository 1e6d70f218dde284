//! Shared helpers for command handlers.

use std::io::IsTerminal;
use std::path::Path;

use thingctl_core::{
    Comparison, DeviceId, DeviceSnapshot, DeviceSource, Filter, FilterSpec, InventoryFile,
};

use crate::cli::FilterArgs;
use crate::config::Settings;
use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so the caller must opt in
/// with `--yes`.
pub fn confirm(message: &str, action: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    let confirmed = dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(|e| CliError::Io(std::io::Error::other(e)))?;
    Ok(confirmed)
}

/// Snapshot the configured inventory.
pub fn load_devices(settings: &Settings) -> Result<(InventoryFile, Vec<DeviceSnapshot>), CliError> {
    let inventory = settings.inventory()?;
    let devices = inventory.list_devices()?;
    Ok((inventory, devices))
}

/// Validate raw id arguments.
pub fn parse_ids(raw: &[String]) -> Result<Vec<DeviceId>, CliError> {
    thingctl_core::model::parse_ids(raw.iter().map(String::as_str)).map_err(|e| {
        CliError::Validation {
            field: "device id".into(),
            reason: e.to_string(),
        }
    })
}

// ── Filter flags ────────────────────────────────────────────────────

/// Translate the filter flags into one declarative tree.
///
/// Returns `None` when no selection flag was given.
pub fn filter_spec(args: &FilterArgs) -> Result<Option<FilterSpec>, CliError> {
    let mut parts = Vec::new();

    if let Some(ref pattern) = args.name {
        parts.push(FilterSpec::Name {
            pattern: pattern.clone(),
            mode: args.name_mode,
            case_sensitive: args.case_sensitive,
        });
    }
    if let Some(ref room) = args.room {
        parts.push(FilterSpec::Room {
            name: room.clone(),
            case_sensitive: args.case_sensitive,
        });
    }
    if args.online {
        parts.push(FilterSpec::Online(true));
    }
    if args.offline {
        parts.push(FilterSpec::Online(false));
    }
    if let Some(level) = args.battery_below {
        parts.push(FilterSpec::Battery {
            op: Comparison::Lt,
            value: level,
        });
    }
    if let Some(level) = args.battery_above {
        parts.push(FilterSpec::Battery {
            op: Comparison::Gt,
            value: level,
        });
    }
    parts.extend(args.capabilities.iter().cloned().map(FilterSpec::Capability));
    if let Some(ref kind) = args.device_type {
        parts.push(FilterSpec::Type {
            name: kind.clone(),
            case_sensitive: args.case_sensitive,
        });
    }
    if let Some(ref raw) = args.where_expr {
        parts.push(parse_expression(raw, "where")?);
    }
    if let Some(ref path) = args.filter_file {
        parts.push(read_filter_file(path)?);
    }

    let spec = match parts.len() {
        0 => None,
        1 => parts.pop(),
        _ if args.any => Some(FilterSpec::Any(parts)),
        _ => Some(FilterSpec::All(parts)),
    };
    Ok(spec)
}

/// Build the live filter; no flags means every device matches.
pub fn build_filter(args: &FilterArgs) -> Result<Box<dyn Filter>, CliError> {
    let spec = filter_spec(args)?.unwrap_or_else(|| FilterSpec::All(Vec::new()));
    Ok(spec.build()?)
}

fn parse_expression(raw: &str, field: &str) -> Result<FilterSpec, CliError> {
    FilterSpec::from_json(raw).map_err(|e| CliError::Validation {
        field: field.into(),
        reason: e.to_string(),
    })
}

fn read_filter_file(path: &Path) -> Result<FilterSpec, CliError> {
    let contents = std::fs::read_to_string(path)?;
    parse_expression(&contents, "filter-file")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use thingctl_core::NameMode;

    fn lamp(online: bool) -> DeviceSnapshot {
        DeviceSnapshot::new(DeviceId::new("d1").unwrap(), "Kitchen Lamp")
            .with_room("Kitchen")
            .with_online(online)
            .with_attribute("battery", "battery", 20)
    }

    #[test]
    fn no_flags_means_no_spec() {
        assert_eq!(filter_spec(&FilterArgs::default()).unwrap(), None);
        assert!(build_filter(&FilterArgs::default()).unwrap().matches(&lamp(false)));
    }

    #[test]
    fn single_flag_is_not_wrapped() {
        let args = FilterArgs {
            room: Some("Kitchen".into()),
            ..FilterArgs::default()
        };
        assert!(matches!(
            filter_spec(&args).unwrap(),
            Some(FilterSpec::Room { .. })
        ));
    }

    #[test]
    fn flags_combine_with_and_unless_any() {
        let mut args = FilterArgs {
            room: Some("kitchen".into()),
            online: true,
            battery_below: Some(30.0),
            ..FilterArgs::default()
        };
        let all = build_filter(&args).unwrap();
        assert!(all.matches(&lamp(true)));
        assert!(!all.matches(&lamp(false)));

        args.any = true;
        let any = build_filter(&args).unwrap();
        assert!(any.matches(&lamp(false)));
    }

    #[test]
    fn where_expression_joins_the_flags() {
        let args = FilterArgs {
            name: Some("lamp".into()),
            name_mode: NameMode::Contains,
            where_expr: Some(r#"{"not": [{"online": true}]}"#.into()),
            ..FilterArgs::default()
        };
        let filter = build_filter(&args).unwrap();
        assert!(filter.matches(&lamp(false)));
        assert!(!filter.matches(&lamp(true)));
    }

    #[test]
    fn malformed_where_is_validation_error() {
        let args = FilterArgs {
            where_expr: Some("{nope".into()),
            ..FilterArgs::default()
        };
        assert!(matches!(
            filter_spec(&args),
            Err(CliError::Validation { ref field, .. }) if field == "where"
        ));
    }

    #[test]
    fn empty_id_is_rejected() {
        assert!(parse_ids(&["d1".into(), String::new()]).is_err());
        assert_eq!(parse_ids(&["d1".into()]).unwrap()[0], "d1");
    }
}

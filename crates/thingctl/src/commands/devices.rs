//! Device inventory command handlers.

use serde::Serialize;
use tabled::Tabled;
use thingctl_core::{DeviceSnapshot, InventorySummary, explain, query, summarize};

use crate::cli::{DevicesArgs, DevicesCommand, FilterArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Room")]
    room: String,
    #[tabled(rename = "Type")]
    device_type: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Battery")]
    battery: String,
}

impl DeviceRow {
    fn new(d: &DeviceSnapshot, painter: Painter) -> Self {
        Self {
            id: d.id.to_string(),
            label: d.label.clone(),
            room: d.room.clone().unwrap_or_default(),
            device_type: d.device_type.clone().unwrap_or_default(),
            status: painter.online(d.online),
            battery: d
                .battery_level()
                .map(|level| format!("{level}%"))
                .unwrap_or_default(),
        }
    }
}

/// Serializable form of one `--explain` verdict.
#[derive(Serialize)]
struct ExplainRecord {
    device_id: String,
    label: String,
    matched: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    reason: Option<String>,
}

#[derive(Tabled)]
struct ExplainRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Label")]
    label: String,
    #[tabled(rename = "Match")]
    matched: String,
    #[tabled(rename = "Reason")]
    reason: String,
}

impl From<&ExplainRecord> for ExplainRow {
    fn from(r: &ExplainRecord) -> Self {
        Self {
            id: r.device_id.clone(),
            label: r.label.clone(),
            matched: if r.matched { "yes" } else { "no" }.into(),
            reason: r.reason.clone().unwrap_or_default(),
        }
    }
}

fn summary_detail(s: &InventorySummary) -> String {
    let mut lines = vec![
        format!("Devices:  {}", s.total),
        format!("Online:   {} ({:.1}%)", s.online, s.online_percent),
        format!("Offline:  {} ({:.1}%)", s.offline, s.offline_percent),
    ];
    if !s.by_type.is_empty() {
        lines.push(String::new());
        lines.push("By type:".into());
        lines.extend(s.by_type.iter().map(|(kind, n)| format!("  {kind:<20} {n}")));
    }
    if !s.by_room.is_empty() {
        lines.push(String::new());
        lines.push("By room:".into());
        lines.extend(s.by_room.iter().map(|(room, n)| format!("  {room:<20} {n}")));
    }
    if !s.battery_levels.is_empty() {
        lines.push(String::new());
        lines.push("Battery (lowest first):".into());
        lines.extend(
            s.battery_levels
                .iter()
                .map(|b| format!("  {:<20} {:>5}%  {}", b.label, b.level, b.device_id)),
        );
    }
    lines.join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: DevicesArgs, settings: &Settings) -> Result<(), CliError> {
    match args.command {
        DevicesCommand::List => list(&FilterArgs::default(), settings),

        DevicesCommand::Query {
            filter,
            explain: true,
        } => explain_query(&filter, settings),

        DevicesCommand::Query {
            filter,
            explain: false,
        } => list(&filter, settings),

        DevicesCommand::Summary { filter } => {
            let (_, devices) = util::load_devices(settings)?;
            let filter = util::build_filter(&filter)?;
            let summary = summarize(query(&devices, &filter));
            let out = output::render_single(settings.output, &summary, summary_detail, |s| {
                s.total.to_string()
            })?;
            output::print_output(&out, settings.quiet);
            Ok(())
        }
    }
}

fn list(filter: &FilterArgs, settings: &Settings) -> Result<(), CliError> {
    let (_, devices) = util::load_devices(settings)?;
    let filter = util::build_filter(filter)?;
    let matched: Vec<&DeviceSnapshot> = query(&devices, &filter);
    let painter = settings.painter();
    let out = output::render_list(
        settings.output,
        &matched,
        |d| DeviceRow::new(d, painter),
        |d| d.id.to_string(),
    )?;
    output::print_output(&out, settings.quiet);
    Ok(())
}

fn explain_query(filter: &FilterArgs, settings: &Settings) -> Result<(), CliError> {
    let (_, devices) = util::load_devices(settings)?;
    let filter = util::build_filter(filter)?;
    let records: Vec<ExplainRecord> = explain(&devices, &filter)
        .into_iter()
        .map(|e| ExplainRecord {
            device_id: e.device.id.to_string(),
            label: e.device.label.clone(),
            matched: e.evaluation.matched,
            reason: e.evaluation.reason,
        })
        .collect();
    let out = output::render_list(settings.output, &records, |r| ExplainRow::from(r), |r| {
        format!("{}\t{}", r.device_id, if r.matched { "match" } else { "no-match" })
    })?;
    output::print_output(&out, settings.quiet);
    Ok(())
}

//! Batch command handlers.
//!
//! Targets come from a saved collection (ids are applied as stored, so
//! ids that vanished from the inventory fail with `NotFoundError`) or
//! from filter flags (devices lacking the action's capability are
//! skipped).

use std::collections::HashSet;
use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use tabled::Tabled;
use thingctl_core::{
    Action, ActionOutcome, ActionSink, BatchCounts, BatchReport, BatchRunner, BatchStatus, Delete,
    DeviceCommand, DeviceId, DeviceSnapshot, Refresh, SetLevel, SinkError, SwitchOff, SwitchOn,
    query,
};
use tracing::info;

use crate::cli::{BatchArgs, BatchCommand, OutputFormat, TargetArgs};
use crate::config::Settings;
use crate::error::CliError;
use crate::output::{self, Painter};

use super::util;

// ── Dry-run sink ────────────────────────────────────────────────────

/// Logs each command instead of applying it. Ids absent from the
/// inventory still fail, so a dry run predicts `NotFoundError`s.
struct DryRunSink<'a> {
    known: HashSet<&'a DeviceId>,
}

impl<'a> DryRunSink<'a> {
    fn new(devices: &'a [DeviceSnapshot]) -> Self {
        Self {
            known: devices.iter().map(|d| &d.id).collect(),
        }
    }
}

impl ActionSink for DryRunSink<'_> {
    fn apply(&self, device: &DeviceId, command: &DeviceCommand) -> Result<(), SinkError> {
        if !self.known.contains(device) {
            return Err(SinkError::NotFound(device.to_string()));
        }
        info!(device = %device, command = ?command, "dry run: command not sent");
        Ok(())
    }
}

// ── Report rendering ────────────────────────────────────────────────

#[derive(Serialize)]
struct ReportView<'a> {
    status: BatchStatus,
    counts: BatchCounts,
    success_rate: f64,
    dry_run: bool,
    #[serde(flatten)]
    report: &'a BatchReport,
}

#[derive(Tabled)]
struct OutcomeRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Error")]
    error: String,
    #[tabled(rename = "Detail")]
    detail: String,
}

impl OutcomeRow {
    fn new(o: &ActionOutcome, painter: Painter) -> Self {
        Self {
            device: o.device_id.to_string(),
            status: painter.outcome(o.status),
            error: o.error.as_ref().map(ToString::to_string).unwrap_or_default(),
            detail: o.detail.clone().unwrap_or_default(),
        }
    }
}

fn report_detail(view: &ReportView<'_>, painter: Painter) -> String {
    let c = view.counts;
    let mut header = format!(
        "{} {}: {} ({} ok, {} failed, {} skipped of {}, {:.1}% success)",
        if view.dry_run { "[dry run]" } else { "Batch" },
        view.report.action,
        painter.batch(view.status),
        c.succeeded,
        c.failed,
        c.skipped,
        c.total,
        view.success_rate,
    );
    if view.report.outcomes.is_empty() {
        header.push_str("\nNo devices selected.");
        return header;
    }
    let rows: Vec<OutcomeRow> = view
        .report
        .outcomes
        .iter()
        .map(|o| OutcomeRow::new(o, painter))
        .collect();
    format!("{header}\n{}", output::render_table(&rows))
}

fn plain_lines(view: &ReportView<'_>) -> String {
    view.report
        .outcomes
        .iter()
        .map(|o| match o.error {
            Some(kind) => format!("{}\t{}\t{kind}", o.device_id, o.status),
            None => format!("{}\t{}", o.device_id, o.status),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: BatchArgs, settings: &Settings) -> Result<(), CliError> {
    match args.command {
        BatchCommand::On(target) => execute(&SwitchOn, &target, settings),
        BatchCommand::Off(target) => execute(&SwitchOff, &target, settings),
        BatchCommand::Level { percent, target } => {
            // Reject once up front instead of failing every device.
            let action = SetLevel::checked(percent).map_err(|e| CliError::Validation {
                field: "percent".into(),
                reason: e.to_string(),
            })?;
            execute(&action, &target, settings)
        }
        BatchCommand::Refresh(target) => execute(&Refresh, &target, settings),
        BatchCommand::Delete(target) => execute(&Delete, &target, settings),
    }
}

/// Resolved batch targets.
enum Targets<'a> {
    Ids(Vec<DeviceId>),
    Devices(Vec<&'a DeviceSnapshot>),
}

impl Targets<'_> {
    fn len(&self) -> usize {
        match self {
            Self::Ids(ids) => ids.len(),
            Self::Devices(devices) => devices.len(),
        }
    }
}

fn select<'a>(
    target: &TargetArgs,
    devices: &'a [DeviceSnapshot],
    settings: &Settings,
) -> Result<Targets<'a>, CliError> {
    let filter = util::filter_spec(&target.filter)?;
    match (&target.collection, filter) {
        (Some(_), Some(_)) => Err(CliError::Validation {
            field: "targets".into(),
            reason: "use either --collection or filter flags, not both".into(),
        }),
        (Some(name), None) => {
            let collection = settings.collections().load(name)?;
            Ok(Targets::Ids(collection.to_ids()))
        }
        (None, Some(spec)) => {
            let filter = spec.build()?;
            Ok(Targets::Devices(query(devices, &filter)))
        }
        (None, None) => Err(CliError::Validation {
            field: "targets".into(),
            reason: "select devices with --collection or filter flags".into(),
        }),
    }
}

fn progress_bar(len: usize, settings: &Settings) -> ProgressBar {
    let visible = !settings.quiet
        && settings.output == OutputFormat::Table
        && std::io::stderr().is_terminal();
    if !visible {
        return ProgressBar::hidden();
    }
    let pb = ProgressBar::new(u64::try_from(len).unwrap_or(u64::MAX));
    if let Ok(style) = ProgressStyle::with_template("{bar:30.cyan/blue} {pos}/{len} {msg}") {
        pb.set_style(style);
    }
    pb
}

fn execute<A: Action>(action: &A, target: &TargetArgs, settings: &Settings) -> Result<(), CliError> {
    let (inventory, devices) = util::load_devices(settings)?;
    let targets = select(target, &devices, settings)?;
    let total = targets.len();

    if total > 0 && settings.confirm && !target.dry_run {
        let prompt = format!("Apply {} to {total} device(s)?", action.describe());
        if !util::confirm(&prompt, "batch", settings.yes)? {
            output::print_status("Aborted.", settings.quiet);
            return Ok(());
        }
    }

    let dry_run_sink;
    let sink: &dyn ActionSink = if target.dry_run {
        dry_run_sink = DryRunSink::new(&devices);
        &dry_run_sink
    } else {
        &inventory
    };

    let pb = progress_bar(total, settings);
    let mut runner = BatchRunner::new().with_observer(|outcome| {
        pb.set_message(outcome.device_id.to_string());
        pb.inc(1);
    });
    let report = match targets {
        Targets::Ids(ids) => runner.run(&ids, action, sink),
        Targets::Devices(selected) => runner.run_on_devices(&selected, action, sink),
    };
    pb.finish_and_clear();

    let counts = report.counts();
    let status = report.status();
    let view = ReportView {
        status,
        counts,
        success_rate: report.success_rate(),
        dry_run: target.dry_run,
        report: &report,
    };
    let painter = settings.painter();
    let out = output::render_single(
        settings.output,
        &view,
        |v| report_detail(v, painter),
        plain_lines,
    )?;
    output::print_output(&out, settings.quiet);

    match status {
        BatchStatus::Completed => Ok(()),
        BatchStatus::CompletedWithErrors => Err(CliError::BatchWithErrors {
            failed: counts.failed,
            total: counts.total,
        }),
        BatchStatus::Failed => Err(CliError::BatchFailed {
            failed: counts.failed,
        }),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use thingctl_core::FailureKind;

    fn snap(id: &str) -> DeviceSnapshot {
        DeviceSnapshot::new(DeviceId::new(id).unwrap(), id).with_capability("switch")
    }

    #[test]
    fn dry_run_reports_unknown_ids_as_not_found() {
        let devices = vec![snap("d1")];
        let sink = DryRunSink::new(&devices);
        let ids = vec![DeviceId::new("d1").unwrap(), DeviceId::new("ghost").unwrap()];
        let report = thingctl_core::batch::run(&ids, &SwitchOn, &sink);

        assert_eq!(report.status(), BatchStatus::CompletedWithErrors);
        assert_eq!(report.outcomes[1].error, Some(FailureKind::NotFound));
    }

    #[test]
    fn plain_output_is_tab_separated() {
        let devices = vec![snap("d1")];
        let sink = DryRunSink::new(&devices);
        let ids = vec![DeviceId::new("d1").unwrap(), DeviceId::new("ghost").unwrap()];
        let report = thingctl_core::batch::run(&ids, &SwitchOff, &sink);
        let view = ReportView {
            status: report.status(),
            counts: report.counts(),
            success_rate: report.success_rate(),
            dry_run: true,
            report: &report,
        };
        assert_eq!(plain_lines(&view), "d1\tsuccess\nghost\tfailed\tNotFoundError");
    }

    #[test]
    fn json_view_flattens_the_report() {
        let report = thingctl_core::batch::run(&[], &Refresh, &DryRunSink::new(&[]));
        let view = ReportView {
            status: report.status(),
            counts: report.counts(),
            success_rate: report.success_rate(),
            dry_run: false,
            report: &report,
        };
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["status"], "completed");
        assert_eq!(json["action"], "refresh");
        assert_eq!(json["counts"]["total"], 0);
    }
}

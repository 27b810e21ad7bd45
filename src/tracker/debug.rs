/*!
 * Tracker Diagnostics
 * Serializable snapshot of the tracker's queues and an aligned text dump
 */

use super::applet_tracker::AppletTracker;
use crate::core::types::{Address, Pid, ProcessId, ResultCode};
use crate::process::{AppletProcess, LaunchOrigin, ProcessState};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessSummary {
    pub id: ProcessId,
    pub state: ProcessState,
    pub origin: LaunchOrigin,
    pub pid: Option<Pid>,
    pub result: ResultCode,
    pub target_entry: Address,
    pub cancelled: bool,
}

impl ProcessSummary {
    fn new(id: ProcessId, process: &AppletProcess) -> Self {
        Self {
            id,
            state: process.state(),
            origin: process.origin(),
            pid: process.pid(),
            result: process.result(),
            target_entry: process.target_entry(),
            cancelled: process.is_cancelled(),
        }
    }
}

/// Point-in-time view of the tracker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackerSnapshot {
    pub has_control_process: bool,
    pub ready_to_launch: bool,
    pub event_signaled: bool,
    pub monitored: Option<ProcessSummary>,
    pub hbmenu: Option<ProcessSummary>,
    pub queued: Vec<ProcessSummary>,
    pub created: Vec<ProcessSummary>,
}

impl TrackerSnapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }

    /// One row per process slot, columns padded to the widest cell
    pub fn render_table(&self) -> String {
        let mut rows: Vec<[String; 6]> = vec![[
            "Slot".into(),
            "Process".into(),
            "State".into(),
            "PID".into(),
            "Result".into(),
            "Target Entry".into(),
        ]];

        let mut push = |slot: &str, summary: &ProcessSummary| {
            let state = if summary.cancelled {
                format!("{:?} (cancelled)", summary.state)
            } else {
                format!("{:?}", summary.state)
            };
            rows.push([
                slot.to_string(),
                summary.id.to_string(),
                state,
                summary
                    .pid
                    .map_or_else(|| "-".to_string(), |pid| format!("{:#x}", pid)),
                format!("{:#x}", summary.result.code()),
                format!("{:#x}", summary.target_entry),
            ]);
        };

        if let Some(summary) = &self.monitored {
            push("monitored", summary);
        }
        if let Some(summary) = &self.hbmenu {
            push("hbmenu", summary);
        }
        for summary in &self.created {
            push("created", summary);
        }
        for summary in &self.queued {
            push("queued", summary);
        }

        render_rows(&rows)
    }
}

fn render_rows<const N: usize>(rows: &[[String; N]]) -> String {
    let mut widths = [0usize; N];
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.len());
        }
    }

    let mut out = String::new();
    for row in rows {
        let line = row
            .iter()
            .zip(widths)
            .map(|(cell, width)| format!("{:<width$}", cell, width = width))
            .collect::<Vec<_>>()
            .join(" | ");
        out.push_str(line.trim_end());
        out.push('\n');
    }
    out
}

impl AppletTracker {
    pub fn debug_info(&self) -> TrackerSnapshot {
        let summarize = |id: ProcessId| {
            self.process(id)
                .map(|process| ProcessSummary::new(id, process))
        };

        TrackerSnapshot {
            has_control_process: self.has_control_process(),
            ready_to_launch: self.ready_to_launch(),
            event_signaled: self.process_queued_event().is_signaled(),
            monitored: self.monitored_process().and_then(summarize),
            hbmenu: self.hbmenu().and_then(summarize),
            queued: self.queued().filter_map(summarize).collect(),
            created: self.created().filter_map(summarize).collect(),
        }
    }

    pub fn print_debug_info(&self) {
        let snapshot = self.debug_info();
        info!(
            has_control_process = snapshot.has_control_process,
            ready_to_launch = snapshot.ready_to_launch,
            queued = snapshot.queued.len(),
            created = snapshot.created.len(),
            "applet tracker state\n{}",
            snapshot.render_table()
        );
        match snapshot.to_json() {
            Ok(json) => debug!(snapshot = %json, "applet tracker snapshot"),
            Err(e) => debug!(error = %e, "failed to encode tracker snapshot"),
        }
    }
}

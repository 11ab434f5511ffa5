//! Terminal rendering of gates and dialogs.
use std::fmt::Write as _;

use runtime::{DialogRenderer, GateEvent};
use sanctuary_core::{Dialog, GateSnapshot, GateState};

/// Prints dialogs to stdout as numbered menus.
#[derive(Debug, Clone, Copy, Default)]
pub struct TerminalDialogRenderer;

impl DialogRenderer for TerminalDialogRenderer {
    fn show(&self, dialog: &Dialog) {
        println!("{}", render_dialog(dialog));
    }

    fn hide(&self, _dialog_id: &str) {
        println!("~~~");
    }
}

pub fn render_dialog(dialog: &Dialog) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n~~~ {} ~~~", dialog.title);
    if !dialog.body.is_empty() {
        let _ = writeln!(out, "{}", dialog.body);
    }
    for (index, choice) in dialog.choices.iter().enumerate() {
        let _ = writeln!(out, "  {}) {}", index + 1, choice.label);
    }
    out.push_str("  x) Close");
    out
}

/// One status line per gate event.
pub fn render_gate_event(event: &GateEvent) -> String {
    match event {
        GateEvent::Requesting { name } => format!("[{}] requesting...", name),
        GateEvent::Passed {
            name,
            kind,
            message,
        } => format!("[{}] passed ({}): {}", name, kind, message),
        GateEvent::Failed { name, message } => format!("[{}] failed: {}", name, message),
        GateEvent::Reset { name } => format!("[{}] reset", name),
        GateEvent::AllPassed => String::from("All gates passed. The sanctuary awakens."),
    }
}

pub fn render_gate_snapshot(gate: &GateSnapshot) -> String {
    let state = match gate.state {
        GateState::Pending => String::from("pending"),
        GateState::Requesting => String::from("requesting"),
        GateState::Failed => String::from("failed"),
        GateState::Passed(kind) => format!("passed/{}", kind),
    };
    let required = if gate.required { "" } else { " (optional)" };
    format!(
        "{}{}: {} - {}",
        gate.name, required, state, gate.status_message
    )
}

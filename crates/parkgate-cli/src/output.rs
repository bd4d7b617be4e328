//! Rendering of signals and state for the terminal.

use serde_json::json;

use parkgate_monitor::{HistoryRow, MonitorSignal, MonitorView};

/// Output mode selected on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Text,
    Json,
}

impl Format {
    pub fn from_flag(json: bool) -> Self {
        if json { Format::Json } else { Format::Text }
    }

    /// One line describing a signal.
    pub fn signal(self, signal: &MonitorSignal) -> anyhow::Result<String> {
        let line = match (self, signal) {
            (Format::Text, MonitorSignal::Event(event)) => HistoryRow::from(event).to_string(),
            (Format::Json, MonitorSignal::Event(event)) => {
                serde_json::to_string(&json!({ "type": "event", "event": event }))?
            }
            (Format::Text, MonitorSignal::AccessDenied { credential_id }) => {
                format!("ACCESS DENIED: card {credential_id} is not authorized")
            }
            (Format::Json, MonitorSignal::AccessDenied { credential_id }) => {
                serde_json::to_string(&json!({
                    "type": "access_denied",
                    "credential_id": credential_id,
                }))?
            }
            (Format::Text, MonitorSignal::ProtocolError { error, raw_line }) => {
                format!("rejected line ({error}): {raw_line:?}")
            }
            (Format::Json, MonitorSignal::ProtocolError { error, raw_line }) => {
                serde_json::to_string(&json!({
                    "type": "protocol_error",
                    "error": error.to_string(),
                    "raw_line": raw_line,
                }))?
            }
            (Format::Text, MonitorSignal::ConnectionError(error)) => {
                format!("connection error: {error}")
            }
            (Format::Json, MonitorSignal::ConnectionError(error)) => {
                serde_json::to_string(&json!({
                    "type": "connection_error",
                    "port": error.port(),
                    "error": error.to_string(),
                }))?
            }
        };
        Ok(line)
    }

    /// Final session and history report.
    pub fn summary(self, view: &MonitorView) -> anyhow::Result<String> {
        let session = view.session();
        let rows = view.history_rows();

        match self {
            Format::Json => Ok(serde_json::to_string_pretty(&json!({
                "session": session,
                "history": rows,
            }))?),
            Format::Text => {
                let mut out = format!(
                    "Available places: {}\nLast card: {}\nLast person: {}\nLast action: {}\n\n{}\n",
                    session.available_places(),
                    session.last_credential_id(),
                    session.last_person(),
                    session.last_action(),
                    HistoryRow::header(),
                );
                for row in &rows {
                    out.push_str(&row.to_string());
                    out.push('\n');
                }
                Ok(out)
            }
        }
    }
}

use std::io::{BufRead, Write};
use std::sync::Arc;

use anyhow::{Context, Result};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::model::NamesDataset;
use crate::dispatch::QueryRequest;

// ---------------------------------------------------------------------------
// Wire messages
// ---------------------------------------------------------------------------

/// A query call from the dashboard: `{"id": 1, "fn": "name_count", "args": [...]}`.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerMessage {
    pub id: Value,
    #[serde(rename = "fn")]
    pub function: String,
    #[serde(default)]
    pub args: Value,
}

/// Reply to one message; exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkerResponse {
    pub id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WorkerResponse {
    fn failed(id: Value, error: impl ToString) -> Self {
        Self {
            id,
            result: None,
            error: Some(error.to_string()),
        }
    }
}

// ---------------------------------------------------------------------------
// Worker loop
// ---------------------------------------------------------------------------

/// Answers query messages against one shared, already loaded dataset.
pub struct Worker {
    dataset: Arc<NamesDataset>,
}

impl Worker {
    pub fn new(dataset: Arc<NamesDataset>) -> Self {
        Self { dataset }
    }

    /// Handle one decoded message. Bad calls become error responses.
    pub fn handle(&self, message: WorkerMessage) -> WorkerResponse {
        debug!("worker received message {} {} {}", message.id, message.function, message.args);

        let request = match QueryRequest::from_value(&message.function, &message.args) {
            Ok(request) => request,
            Err(err) => {
                warn!("rejected message {}: {err}", message.id);
                return WorkerResponse::failed(message.id, err);
            }
        };

        debug!("message {} runs {}", message.id, request.function_name());
        match serde_json::to_value(request.execute(&self.dataset)) {
            Ok(result) => WorkerResponse {
                id: message.id,
                result: Some(result),
                error: None,
            },
            Err(err) => WorkerResponse::failed(message.id, err),
        }
    }

    /// Handle one raw input line.
    pub fn handle_line(&self, line: &str) -> WorkerResponse {
        match serde_json::from_str::<WorkerMessage>(line) {
            Ok(message) => self.handle(message),
            Err(err) => {
                warn!("unreadable message: {err}");
                WorkerResponse::failed(Value::Null, format!("malformed message: {err}"))
            }
        }
    }

    /// Serve newline-delimited messages until `input` is exhausted.
    /// Blank lines are skipped.
    pub fn run<R: BufRead, W: Write>(&self, input: R, mut output: W) -> Result<()> {
        for line in input.lines() {
            let line = line.context("reading message")?;
            if line.trim().is_empty() {
                continue;
            }
            let response = self.handle_line(&line);
            serde_json::to_writer(&mut output, &response).context("writing response")?;
            output.write_all(b"\n").context("writing response")?;
            output.flush().context("flushing response")?;
        }
        Ok(())
    }
}

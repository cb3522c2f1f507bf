//! In-process SQL client for tests: records every statement and replays scripted results.

use crate::sql::SqlParam;
use crate::store::{QueryResult, SqlClient};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;

#[derive(Clone, Debug)]
pub struct RecordedCall {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

enum Scripted {
    Rows(Vec<Value>),
    Error(String),
}

/// Replays queued results in order. With an empty queue every statement returns no rows.
#[derive(Default)]
pub struct ScriptedClient {
    queue: Mutex<VecDeque<Scripted>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl ScriptedClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_rows(&self, rows: Vec<Value>) {
        self.lock_queue().push_back(Scripted::Rows(rows));
    }

    /// Next statement fails with a driver error carrying `message`.
    pub fn push_error(&self, message: impl Into<String>) {
        self.lock_queue().push_back(Scripted::Error(message.into()));
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    fn lock_queue(&self) -> std::sync::MutexGuard<'_, VecDeque<Scripted>> {
        self.queue.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl SqlClient for ScriptedClient {
    async fn query(&self, sql: &str, params: &[SqlParam]) -> Result<QueryResult, sqlx::Error> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RecordedCall {
                sql: sql.to_string(),
                params: params.to_vec(),
            });
        match self.lock_queue().pop_front() {
            Some(Scripted::Rows(rows)) => Ok(QueryResult::from_rows(rows)),
            Some(Scripted::Error(message)) => Err(sqlx::Error::Protocol(message)),
            None => Ok(QueryResult::default()),
        }
    }
}

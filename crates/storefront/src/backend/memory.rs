//! In-memory [`Backend`] for tests.
//!
//! Rows live as JSON objects per table. Every call is recorded so tests can
//! assert that a rejected operation never reached the backend, or that
//! concurrent reads were collapsed into one request.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{Map, Value};
use uuid::Uuid;

use haneul_core::Email;

use super::{AuthSession, Backend, BackendError, Condition, Filter};
use crate::models::{Row, User};

/// Kind of recorded backend call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Select,
    Insert,
    Update,
    Delete,
    SignIn,
    SessionUser,
    SignOut,
}

impl Op {
    const fn is_write(self) -> bool {
        matches!(self, Self::Insert | Self::Update | Self::Delete)
    }
}

/// One recorded call. `table` is `None` for auth calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub op: Op,
    pub table: Option<&'static str>,
}

#[derive(Default)]
struct State {
    tables: HashMap<String, Vec<Value>>,
    unique: HashMap<String, Vec<&'static str>>,
    accounts: HashMap<String, (String, User)>,
    sessions: HashMap<String, User>,
    calls: Vec<Call>,
    writes_seen: usize,
    failing_writes: HashSet<usize>,
    read_delay: Option<Duration>,
}

/// In-memory backend. Clones share state.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    state: Arc<Mutex<State>>,
}

impl MemoryBackend {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add rows to `T`'s table as-is.
    pub fn seed<T: Row + Serialize>(&self, rows: &[T]) {
        let values: Vec<Value> = rows
            .iter()
            .filter_map(|row| serde_json::to_value(row).ok())
            .collect();
        self.lock()
            .tables
            .entry(T::TABLE.to_string())
            .or_default()
            .extend(values);
    }

    /// Reject inserts into `table` that duplicate `columns` of an existing row
    /// with a 409, like a unique index.
    pub fn unique(&self, table: &str, columns: &[&'static str]) {
        self.lock()
            .unique
            .insert(table.to_string(), columns.to_vec());
    }

    /// Register an account that [`Backend::sign_in`] accepts.
    pub fn add_account(&self, email: &str, password: &str, user: User) {
        self.lock()
            .accounts
            .insert(email.to_string(), (password.to_string(), user));
    }

    /// Make every `select` sleep before reading.
    pub fn set_read_delay(&self, delay: Duration) {
        self.lock().read_delay = Some(delay);
    }

    /// Fail the next insert/update/delete with a 500.
    pub fn fail_next_write(&self) {
        self.fail_nth_write(1);
    }

    /// Fail the `n`th insert/update/delete from now (1 is the next one) with
    /// a 500. Calls add up, so several writes of one sequence can fail.
    pub fn fail_nth_write(&self, n: usize) {
        let mut state = self.lock();
        let at = state.writes_seen + n;
        state.failing_writes.insert(at);
    }

    /// Current rows of `T`'s table.
    #[must_use]
    pub fn rows<T: Row>(&self) -> Vec<T> {
        self.lock()
            .tables
            .get(T::TABLE)
            .map(|rows| {
                rows.iter()
                    .filter_map(|row| serde_json::from_value(row.clone()).ok())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.lock().calls.clone()
    }

    /// Number of `select` calls against `table`.
    #[must_use]
    pub fn reads(&self, table: &str) -> usize {
        self.count(|call| call.op == Op::Select && call.table == Some(table))
    }

    /// Number of writes against `table`.
    #[must_use]
    pub fn writes(&self, table: &str) -> usize {
        self.count(|call| call.op.is_write() && call.table == Some(table))
    }

    /// Number of writes against any table.
    #[must_use]
    pub fn total_writes(&self) -> usize {
        self.count(|call| call.op.is_write())
    }

    /// Forget recorded calls, keeping rows.
    pub fn clear_calls(&self) {
        self.lock().calls.clear();
    }

    fn count(&self, predicate: impl Fn(&Call) -> bool) -> usize {
        self.lock().calls.iter().filter(|call| predicate(call)).count()
    }

    fn record(&self, op: Op, table: Option<&'static str>) {
        self.lock().calls.push(Call { op, table });
    }

    /// Record a write and consume an injected failure, if any.
    fn begin_write(&self, op: Op, table: &'static str) -> Result<(), BackendError> {
        let mut state = self.lock();
        state.calls.push(Call {
            op,
            table: Some(table),
        });
        state.writes_seen += 1;
        let seen = state.writes_seen;
        if state.failing_writes.remove(&seen) {
            return Err(BackendError::Status {
                status: 500,
                message: "injected failure".to_string(),
            });
        }
        Ok(())
    }
}

fn column_text(row: &Value, column: &str) -> String {
    match row.get(column) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Null) | None => "null".to_string(),
        Some(other) => other.to_string(),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    filter.conditions.iter().all(|condition| match condition {
        Condition::Eq(column, value) => column_text(row, column) == *value,
        Condition::In(column, values) => values.contains(&column_text(row, column)),
    })
}

/// Timestamps compare as instants, everything else as text.
fn compare_columns(a: &str, b: &str) -> Ordering {
    match (DateTime::parse_from_rfc3339(a), DateTime::parse_from_rfc3339(b)) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        _ => a.cmp(b),
    }
}

fn select_rows(rows: &[Value], filter: &Filter) -> Vec<Value> {
    let mut selected: Vec<Value> = rows.iter().filter(|row| matches(row, filter)).cloned().collect();
    if let Some((column, descending)) = &filter.order {
        selected.sort_by(|a, b| compare_columns(&column_text(a, column), &column_text(b, column)));
        if *descending {
            selected.reverse();
        }
    }
    if let Some(limit) = filter.limit {
        selected.truncate(limit);
    }
    selected
}

/// Fill the columns the backend would default.
fn with_defaults(value: Value) -> Value {
    let mut object = match value {
        Value::Object(object) => object,
        _ => Map::new(),
    };
    object
        .entry("id")
        .or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
    object
        .entry("created_at")
        .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
    Value::Object(object)
}

fn decode<T: Row>(values: Vec<Value>) -> Result<Vec<T>, BackendError> {
    values
        .into_iter()
        .map(|value| serde_json::from_value(value).map_err(BackendError::from))
        .collect()
}

impl MemoryBackend {
    fn insert_values<T: Row>(&self, values: Vec<Value>) -> Result<Vec<Value>, BackendError> {
        let mut state = self.lock();
        let unique = state.unique.get(T::TABLE).cloned();
        let table = state.tables.entry(T::TABLE.to_string()).or_default();
        let mut stored = Vec::with_capacity(values.len());
        for value in values {
            let row = with_defaults(value);
            if let Some(columns) = &unique {
                let duplicate = table.iter().any(|existing| {
                    columns
                        .iter()
                        .all(|column| column_text(existing, column) == column_text(&row, column))
                });
                if duplicate {
                    return Err(BackendError::Status {
                        status: 409,
                        message: format!("duplicate key value violates unique constraint on {}", T::TABLE),
                    });
                }
            }
            table.push(row.clone());
            stored.push(row);
        }
        Ok(stored)
    }
}

impl Backend for MemoryBackend {
    async fn select<T: Row>(&self, filter: &Filter) -> Result<Vec<T>, BackendError> {
        let delay = {
            let mut state = self.lock();
            state.calls.push(Call {
                op: Op::Select,
                table: Some(T::TABLE),
            });
            state.read_delay
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let rows = {
            let state = self.lock();
            state
                .tables
                .get(T::TABLE)
                .map(|rows| select_rows(rows, filter))
                .unwrap_or_default()
        };
        decode(rows)
    }

    async fn insert<T: Row, N: Serialize + Sync>(&self, row: &N) -> Result<T, BackendError> {
        self.begin_write(Op::Insert, T::TABLE)?;
        let value = serde_json::to_value(row)?;
        let stored = self.insert_values::<T>(vec![value])?;
        decode(stored)?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::NotFound(T::TABLE.to_string()))
    }

    async fn insert_many<T: Row, N: Serialize + Sync>(
        &self,
        rows: &[N],
    ) -> Result<Vec<T>, BackendError> {
        self.begin_write(Op::Insert, T::TABLE)?;
        let values = rows
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        let stored = self.insert_values::<T>(values)?;
        decode(stored)
    }

    async fn update<T: Row, P: Serialize + Sync>(
        &self,
        filter: &Filter,
        patch: &P,
    ) -> Result<Vec<T>, BackendError> {
        self.begin_write(Op::Update, T::TABLE)?;
        let Value::Object(patch) = serde_json::to_value(patch)? else {
            return Ok(Vec::new());
        };

        let updated = {
            let mut state = self.lock();
            let mut updated = Vec::new();
            if let Some(rows) = state.tables.get_mut(T::TABLE) {
                for row in rows.iter_mut().filter(|row| matches(row, filter)) {
                    if let Value::Object(object) = row {
                        for (key, value) in &patch {
                            object.insert(key.clone(), value.clone());
                        }
                    }
                    updated.push(row.clone());
                }
            }
            updated
        };
        decode(updated)
    }

    async fn delete<T: Row>(&self, filter: &Filter) -> Result<usize, BackendError> {
        self.begin_write(Op::Delete, T::TABLE)?;
        let mut state = self.lock();
        let Some(rows) = state.tables.get_mut(T::TABLE) else {
            return Ok(0);
        };
        let before = rows.len();
        rows.retain(|row| !matches(row, filter));
        Ok(before - rows.len())
    }

    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<AuthSession, BackendError> {
        self.record(Op::SignIn, None);
        let mut state = self.lock();
        let user = match state.accounts.get(email.as_str()) {
            Some((expected, user)) if expected == password.expose_secret() => user.clone(),
            _ => return Err(BackendError::InvalidCredentials),
        };
        let access_token = Uuid::new_v4().to_string();
        state.sessions.insert(access_token.clone(), user.clone());
        Ok(AuthSession { access_token, user })
    }

    async fn session_user(&self, access_token: &str) -> Result<Option<User>, BackendError> {
        self.record(Op::SessionUser, None);
        Ok(self.lock().sessions.get(access_token).cloned())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        self.record(Op::SignOut, None);
        self.lock().sessions.remove(access_token);
        Ok(())
    }
}

//! In-memory [`TableApi`] with failure injection, for exercising the hosted
//! store without a server.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::hosted::{Filter, TableApi};
use super::StoreFailure;

#[derive(Default)]
pub struct MemoryTables {
    tables: Mutex<HashMap<String, Vec<Value>>>,
    /// table -> rows written before an insert fails
    failing_inserts: Mutex<HashMap<String, usize>>,
    calls: Mutex<Vec<String>>,
}

fn cell_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn matches(row: &Value, filter: &Filter) -> bool {
    row.get(filter.column).and_then(cell_text).as_deref() == Some(filter.value.as_str())
}

fn compare_cells(a: Option<&Value>, b: Option<&Value>) -> std::cmp::Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(std::cmp::Ordering::Equal),
        (x, y) => x.and_then(cell_text).cmp(&y.and_then(cell_text)),
    }
}

impl MemoryTables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make inserts into `table` write `rows_before_failure` rows and then fail
    pub fn fail_inserts(&self, table: &str, rows_before_failure: usize) {
        self.failing_inserts
            .lock()
            .unwrap()
            .insert(table.to_string(), rows_before_failure);
    }

    pub fn rows(&self, table: &str) -> Vec<Value> {
        self.tables.lock().unwrap().get(table).cloned().unwrap_or_default()
    }

    /// Every call made so far, as `"<verb> <table>"`
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    fn record(&self, verb: &str, table: &str) {
        self.calls.lock().unwrap().push(format!("{} {}", verb, table));
    }
}

#[async_trait]
impl TableApi for MemoryTables {
    async fn insert(&self, table: &str, rows: Vec<Value>) -> Result<(), StoreFailure> {
        self.record("insert", table);
        let limit = self.failing_inserts.lock().unwrap().get(table).copied();
        let mut tables = self.tables.lock().unwrap();
        let stored = tables.entry(table.to_string()).or_default();

        match limit {
            Some(n) => {
                stored.extend(rows.into_iter().take(n));
                Err(StoreFailure::Api {
                    status: 500,
                    message: format!("insert into {} rejected", table),
                })
            }
            None => {
                stored.extend(rows);
                Ok(())
            }
        }
    }

    async fn select(&self, table: &str, filters: &[Filter], order_by: Option<&str>) -> Result<Vec<Value>, StoreFailure> {
        self.record("select", table);
        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| filters.iter().all(|f| matches(row, f)))
            .collect();
        if let Some(column) = order_by {
            rows.sort_by(|a, b| compare_cells(a.get(column), b.get(column)));
        }
        Ok(rows)
    }

    async fn update(&self, table: &str, filter: &Filter, patch: Value) -> Result<(), StoreFailure> {
        self.record("update", table);
        let mut tables = self.tables.lock().unwrap();
        if let (Some(rows), Value::Object(fields)) = (tables.get_mut(table), patch) {
            for row in rows.iter_mut().filter(|row| matches(row, filter)) {
                if let Value::Object(target) = row {
                    for (k, v) in &fields {
                        target.insert(k.clone(), v.clone());
                    }
                }
            }
        }
        Ok(())
    }

    async fn delete(&self, table: &str, filter: &Filter) -> Result<(), StoreFailure> {
        self.record("delete", table);
        if let Some(rows) = self.tables.lock().unwrap().get_mut(table) {
            rows.retain(|row| !matches(row, filter));
        }
        Ok(())
    }
}

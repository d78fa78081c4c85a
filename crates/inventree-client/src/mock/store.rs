//! In-memory record storage for the mock server

use std::collections::HashMap;

use serde_json::{Map, Value, json};

/// Query parameters that never filter records
const RESERVED_PARAMS: [&str; 5] = ["search", "offset", "limit", "ordering", "format"];

/// One collection endpoint and its records, in insertion order
#[derive(Debug, Clone)]
pub(crate) struct Collection {
    pub(crate) pk_field: String,
    pub(crate) records: Vec<Map<String, Value>>,
    pub(crate) metadata: HashMap<String, Map<String, Value>>,
    pub(crate) options: Option<Value>,
}

impl Collection {
    pub(crate) fn new(pk_field: impl Into<String>) -> Self {
        Self {
            pk_field: pk_field.into(),
            records: Vec::new(),
            metadata: HashMap::new(),
            options: None,
        }
    }

    /// Integer collections get server-assigned ids
    fn assigns_ids(&self) -> bool {
        self.pk_field == "pk"
    }

    pub(crate) fn key_of(&self, record: &Map<String, Value>) -> Option<String> {
        record.get(&self.pk_field).and_then(key_string)
    }

    pub(crate) fn find(&self, key: &str) -> Option<&Map<String, Value>> {
        self.records.iter().find(|r| self.key_of(r).as_deref() == Some(key))
    }

    pub(crate) fn find_mut(&mut self, key: &str) -> Option<&mut Map<String, Value>> {
        let pk_field = self.pk_field.clone();
        self.records
            .iter_mut()
            .find(|r| r.get(&pk_field).and_then(key_string).as_deref() == Some(key))
    }

    fn next_id(&self) -> u64 {
        self.records
            .iter()
            .filter_map(|r| r.get(&self.pk_field).and_then(Value::as_u64))
            .max()
            .unwrap_or(0)
            + 1
    }

    /// Store a record, assigning an id when needed
    ///
    /// Returns `None` for text-keyed collections when no key was supplied.
    pub(crate) fn upsert(&mut self, mut record: Map<String, Value>) -> Option<Map<String, Value>> {
        let has_key = record.get(&self.pk_field).is_some_and(|v| !v.is_null());
        if !has_key {
            if !self.assigns_ids() {
                return None;
            }
            record.insert(self.pk_field.clone(), Value::from(self.next_id()));
        }

        let key = self.key_of(&record)?;
        match self.records.iter().position(|r| self.key_of(r).as_deref() == Some(key.as_str())) {
            Some(index) => self.records[index] = record.clone(),
            None => self.records.push(record.clone()),
        }

        Some(record)
    }

    pub(crate) fn remove(&mut self, key: &str) -> bool {
        let before = self.records.len();
        let pk_field = self.pk_field.clone();
        self.records
            .retain(|r| r.get(&pk_field).and_then(key_string).as_deref() != Some(key));
        self.metadata.remove(key);
        self.records.len() != before
    }

    /// Records matching every filter whose field exists in this collection
    pub(crate) fn filter(&self, params: &[(String, String)]) -> Vec<Map<String, Value>> {
        let known: Vec<&String> = self.records.iter().flat_map(|r| r.keys()).collect();

        let filters: Vec<(&str, &str)> = params
            .iter()
            .filter(|(k, _)| !RESERVED_PARAMS.contains(&k.as_str()) && known.contains(&k))
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        let search = params
            .iter()
            .find(|(k, _)| k == "search")
            .map(|(_, v)| v.to_lowercase())
            .filter(|s| !s.is_empty());

        self.records
            .iter()
            .filter(|r| {
                filters
                    .iter()
                    .all(|(k, v)| r.get(*k).is_some_and(|value| value_matches(value, v)))
            })
            .filter(|r| match &search {
                Some(term) => r
                    .values()
                    .filter_map(Value::as_str)
                    .any(|s| s.to_lowercase().contains(term)),
                None => true,
            })
            .cloned()
            .collect()
    }

    /// OPTIONS descriptor; derived from stored fields unless one was set
    pub(crate) fn options(&self) -> Value {
        if let Some(options) = &self.options {
            return options.clone();
        }

        let mut fields = Map::new();
        for record in &self.records {
            for (name, value) in record {
                if name == &self.pk_field || fields.contains_key(name) {
                    continue;
                }
                fields.insert(name.clone(), json!({ "type": field_type(value), "required": false }));
            }
        }

        json!({ "actions": { "POST": fields } })
    }
}

/// Text form of a key value
pub(crate) fn key_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Compare a stored value against a query parameter
pub(crate) fn value_matches(value: &Value, expected: &str) -> bool {
    match value {
        Value::String(s) => s == expected,
        Value::Number(n) => n.to_string() == expected || expected.parse::<f64>().ok() == n.as_f64(),
        Value::Bool(b) => match expected.to_ascii_lowercase().as_str() {
            "true" | "1" => *b,
            "false" | "0" => !*b,
            _ => false,
        },
        Value::Null => expected.is_empty() || expected == "null",
        _ => false,
    }
}

fn field_type(value: &Value) -> &'static str {
    match value {
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "integer",
        Value::Array(_) => "list",
        Value::Object(_) => "nested object",
        _ => "string",
    }
}

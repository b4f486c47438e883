use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A stored record.
///
/// Serializes flat: `{ "id": .., "createdAt": .., "updatedAt": .., ...data }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
  pub id: String,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
  #[serde(flatten)]
  pub data: Map<String, Value>,
}

impl Record {
  /// Build a new record from caller data. Reserved keys in `data` are lifted
  /// into the record; anything missing is assigned.
  pub fn new(mut data: Map<String, Value>) -> Self {
    let now = Utc::now();
    let id = match data.remove("id") {
      Some(Value::String(id)) if !id.is_empty() => id,
      _ => uuid::Uuid::new_v4().to_string(),
    };
    let created_at = take_timestamp(&mut data, "createdAt").unwrap_or(now);
    let updated_at = take_timestamp(&mut data, "updatedAt").unwrap_or(now);
    Self {
      id,
      created_at,
      updated_at,
      data,
    }
  }

  /// Build a record with a fixed id, ignoring any `id` inside `data`.
  pub fn with_id(id: impl Into<String>, mut data: Map<String, Value>) -> Self {
    data.insert("id".to_string(), Value::String(id.into()));
    Self::new(data)
  }

  /// Shallow-merge `data` into this record and bump `updatedAt`.
  pub fn merge(&mut self, mut data: Map<String, Value>) {
    data.remove("id");
    data.remove("createdAt");
    data.remove("updatedAt");
    self.data.extend(data);
    self.updated_at = Utc::now();
  }

  /// Field value by dot-delimited path, including the reserved fields.
  pub fn field(&self, path: &str) -> Option<Value> {
    match path {
      "id" => Some(Value::String(self.id.clone())),
      "createdAt" => Some(Value::String(self.created_at.to_rfc3339())),
      "updatedAt" => Some(Value::String(self.updated_at.to_rfc3339())),
      _ => {
        let mut segments = path.split('.');
        let first = self.data.get(segments.next()?)?;
        segments
          .try_fold(first, |current, segment| match current {
            Value::Object(map) => map.get(segment),
            Value::Array(items) => segment.parse::<usize>().ok().and_then(|i| items.get(i)),
            _ => None,
          })
          .cloned()
      }
    }
  }

  /// The flat JSON form of this record.
  pub fn to_value(&self) -> Value {
    let mut map = Map::with_capacity(self.data.len() + 3);
    map.insert("id".to_string(), Value::String(self.id.clone()));
    map.insert(
      "createdAt".to_string(),
      Value::String(self.created_at.to_rfc3339()),
    );
    map.insert(
      "updatedAt".to_string(),
      Value::String(self.updated_at.to_rfc3339()),
    );
    for (key, value) in &self.data {
      map.insert(key.clone(), value.clone());
    }
    Value::Object(map)
  }
}

fn take_timestamp(data: &mut Map<String, Value>, key: &str) -> Option<DateTime<Utc>> {
  match data.remove(key)? {
    Value::String(raw) => DateTime::parse_from_rfc3339(&raw)
      .ok()
      .map(|ts| ts.with_timezone(&Utc)),
    _ => None,
  }
}

/// Comparison operator of a `where` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FilterOp {
  #[serde(rename = "==")]
  Eq,
  #[serde(rename = "!=")]
  Ne,
  #[serde(rename = ">")]
  Gt,
  #[serde(rename = "<")]
  Lt,
  #[serde(rename = ">=")]
  Gte,
  #[serde(rename = "<=")]
  Lte,
  #[serde(rename = "in")]
  In,
  #[serde(rename = "array-contains")]
  ArrayContains,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Filter {
  pub field: String,
  pub op: FilterOp,
  pub value: Value,
}

impl Filter {
  pub fn new(field: impl Into<String>, op: FilterOp, value: Value) -> Self {
    Self {
      field: field.into(),
      op,
      value,
    }
  }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
  #[default]
  Asc,
  Desc,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
  pub field: String,
  #[serde(default)]
  pub direction: SortDirection,
}

/// Replace `field` (an id or list of ids) with the records it references in
/// `collection`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Populate {
  pub field: String,
  pub collection: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListOptions {
  #[serde(rename = "where", default)]
  pub filters: Vec<Filter>,
  #[serde(default)]
  pub order_by: Vec<OrderBy>,
  #[serde(default)]
  pub limit: Option<usize>,
  #[serde(default)]
  pub populate: Vec<Populate>,
}

impl ListOptions {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn filter(mut self, field: impl Into<String>, op: FilterOp, value: Value) -> Self {
    self.filters.push(Filter::new(field, op, value));
    self
  }

  pub fn order_by(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
    self.order_by.push(OrderBy {
      field: field.into(),
      direction,
    });
    self
  }

  pub fn limit(mut self, limit: usize) -> Self {
    self.limit = Some(limit);
    self
  }

  pub fn populate(mut self, field: impl Into<String>, collection: impl Into<String>) -> Self {
    self.populate.push(Populate {
      field: field.into(),
      collection: collection.into(),
    });
    self
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  fn map(value: Value) -> Map<String, Value> {
    match value {
      Value::Object(map) => map,
      _ => panic!("expected object"),
    }
  }

  #[test]
  fn test_new_assigns_id_and_timestamps() {
    let record = Record::new(map(json!({ "name": "Jan" })));
    assert!(!record.id.is_empty());
    assert_eq!(record.created_at, record.updated_at);
    assert_eq!(record.data.get("name"), Some(&json!("Jan")));
    assert!(!record.data.contains_key("id"));
  }

  #[test]
  fn test_new_keeps_supplied_id() {
    let record = Record::new(map(json!({ "id": "r1", "createdAt": "2024-01-02T03:04:05Z" })));
    assert_eq!(record.id, "r1");
    assert_eq!(record.created_at.to_rfc3339(), "2024-01-02T03:04:05+00:00");
    assert!(record.data.is_empty());
  }

  #[test]
  fn test_merge_keeps_identity() {
    let mut record = Record::with_id("r1", map(json!({ "a": 1, "b": 1 })));
    let created = record.created_at;
    record.merge(map(json!({ "id": "other", "b": 2, "c": 3 })));

    assert_eq!(record.id, "r1");
    assert_eq!(record.created_at, created);
    assert_eq!(record.field("a"), Some(json!(1)));
    assert_eq!(record.field("b"), Some(json!(2)));
    assert_eq!(record.field("c"), Some(json!(3)));
  }

  #[test]
  fn test_field_paths() {
    let record = Record::with_id("r1", map(json!({ "settings": { "budget": 10 }, "tags": ["x"] })));
    assert_eq!(record.field("id"), Some(json!("r1")));
    assert_eq!(record.field("settings.budget"), Some(json!(10)));
    assert_eq!(record.field("tags.0"), Some(json!("x")));
    assert_eq!(record.field("settings.missing"), None);
  }

  #[test]
  fn test_serializes_flat() {
    let record = Record::with_id("r1", map(json!({ "name": "Jan" })));
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["id"], json!("r1"));
    assert_eq!(value["name"], json!("Jan"));
    assert!(value.get("createdAt").is_some());

    let back: Record = serde_json::from_value(value).unwrap();
    assert_eq!(back, record);
  }

  #[test]
  fn test_list_options_from_json() {
    let options: ListOptions = serde_json::from_value(json!({
      "where": [{ "field": "tags", "op": "array-contains", "value": "x" }],
      "orderBy": [{ "field": "order", "direction": "desc" }],
      "limit": 5,
      "populate": [{ "field": "owner", "collection": "users" }]
    }))
    .unwrap();

    assert_eq!(options.filters[0].op, FilterOp::ArrayContains);
    assert_eq!(options.order_by[0].direction, SortDirection::Desc);
    assert_eq!(options.limit, Some(5));
    assert_eq!(options.populate[0].collection, "users");
  }
}

//! Query evaluation shared by the bundled stores.

use std::cmp::Ordering;

use serde_json::Value;

use crate::error::StoreError;
use crate::types::{Filter, FilterOp, ListOptions, OrderBy, Populate, Record, SortDirection};

/// Collection names double as file names, so keep them to a single plain
/// path segment.
pub(crate) fn check_collection(name: &str) -> Result<(), StoreError> {
  let valid = !name.is_empty()
    && name != "."
    && name != ".."
    && !name.contains(['/', '\\', '\0']);
  if valid {
    Ok(())
  } else {
    Err(StoreError::InvalidCollection {
      name: name.to_string(),
    })
  }
}

/// Apply filters, ordering and limit. Population is left to the caller since
/// it needs access to other collections.
pub(crate) fn select(records: impl IntoIterator<Item = Record>, options: &ListOptions) -> Vec<Record> {
  let mut selected: Vec<Record> = records
    .into_iter()
    .filter(|record| options.filters.iter().all(|filter| matches(record, filter)))
    .collect();

  if !options.order_by.is_empty() {
    selected.sort_by(|a, b| compare_records(a, b, &options.order_by));
  }

  if let Some(limit) = options.limit {
    selected.truncate(limit);
  }

  selected
}

pub(crate) fn matches(record: &Record, filter: &Filter) -> bool {
  let field = record.field(&filter.field);
  match filter.op {
    FilterOp::Eq => field.as_ref() == Some(&filter.value),
    FilterOp::Ne => field.as_ref() != Some(&filter.value),
    FilterOp::Gt => compare_field(field.as_ref(), &filter.value) == Some(Ordering::Greater),
    FilterOp::Lt => compare_field(field.as_ref(), &filter.value) == Some(Ordering::Less),
    FilterOp::Gte => matches!(
      compare_field(field.as_ref(), &filter.value),
      Some(Ordering::Greater | Ordering::Equal)
    ),
    FilterOp::Lte => matches!(
      compare_field(field.as_ref(), &filter.value),
      Some(Ordering::Less | Ordering::Equal)
    ),
    FilterOp::In => match (&field, &filter.value) {
      (Some(value), Value::Array(candidates)) => candidates.contains(value),
      _ => false,
    },
    FilterOp::ArrayContains => match &field {
      Some(Value::Array(items)) => items.contains(&filter.value),
      _ => false,
    },
  }
}

fn compare_field(field: Option<&Value>, other: &Value) -> Option<Ordering> {
  compare_values(field?, other)
}

/// Ordering between two JSON values of the same kind. Mixed kinds do not
/// compare.
fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
  match (a, b) {
    (Value::Number(a), Value::Number(b)) => a.as_f64()?.partial_cmp(&b.as_f64()?),
    (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
    (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
    (Value::Null, Value::Null) => Some(Ordering::Equal),
    _ => None,
  }
}

fn compare_records(a: &Record, b: &Record, order_by: &[OrderBy]) -> Ordering {
  for order in order_by {
    let ordering = match (a.field(&order.field), b.field(&order.field)) {
      (None, None) => Ordering::Equal,
      // missing values sort first
      (None, Some(_)) => Ordering::Less,
      (Some(_), None) => Ordering::Greater,
      (Some(a), Some(b)) => compare_values(&a, &b).unwrap_or(Ordering::Equal),
    };
    let ordering = match order.direction {
      SortDirection::Asc => ordering,
      SortDirection::Desc => ordering.reverse(),
    };
    if ordering != Ordering::Equal {
      return ordering;
    }
  }
  Ordering::Equal
}

/// Replace populated fields using `lookup(collection, id)`. Ids with no
/// matching record are left as they are.
pub(crate) fn populate<F>(records: &mut [Record], populate: &[Populate], lookup: F)
where
  F: Fn(&str, &str) -> Option<Record>,
{
  for record in records.iter_mut() {
    for spec in populate {
      let Some(current) = record.data.get_mut(&spec.field) else {
        continue;
      };
      match current {
        Value::String(id) => {
          if let Some(found) = lookup(&spec.collection, id) {
            *current = found.to_value();
          }
        }
        Value::Array(items) => {
          for item in items.iter_mut() {
            if let Value::String(id) = item
              && let Some(found) = lookup(&spec.collection, id)
            {
              *item = found.to_value();
            }
          }
        }
        _ => {}
      }
    }
  }
}

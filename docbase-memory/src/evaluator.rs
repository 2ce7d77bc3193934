//! Filter evaluation for the in-memory store.
//!
//! This module interprets the subset of store filter notation the memory
//! backend understands: direct equality on (dotted) field paths, the
//! comparison operators `$eq`, `$ne`, `$gt`, `$gte`, `$lt` and `$lte`,
//! membership via `$in` and `$nin`, `$exists`, field-level `$not`, and the
//! `$and` / `$or` combinators. Anything else is rejected rather than
//! silently matched.

use bson::{Bson, DateTime, Document};
use std::{cmp::Ordering, collections::HashMap};

use docbase_core::error::{StoreError, StoreResult};

/// Type-erased, comparable representation of BSON values.
///
/// Wraps BSON values for filter comparisons, normalizing all numeric
/// types to f64 so that `Int32(3)`, `Int64(3)` and `Double(3.0)` compare
/// equal the way a real store treats them.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    Null,
    Bool(bool),
    Number(f64),
    DateTime(DateTime),
    String(&'a str),
    Array(Vec<Comparable<'a>>),
    Map(HashMap<&'a str, Comparable<'a>>),
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(arr) => Comparable::Array(arr.iter().map(Comparable::from).collect()),
            Bson::Document(doc) => Comparable::Map(
                doc.iter()
                    .map(|(k, v)| (k.as_str(), Comparable::from(v)))
                    .collect(),
            ),
            // Other types are not comparable
            _ => Comparable::Null,
        }
    }
}

impl PartialEq for Comparable<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            (Comparable::Array(a), Comparable::Array(b)) => a == b,
            (Comparable::Map(a), Comparable::Map(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialOrd for Comparable<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

/// Evaluates a filter against one document.
///
/// An empty filter matches everything. Top-level entries are combined
/// with AND semantics, like a real store does.
pub(crate) fn matches(doc: &Document, filter: &Document) -> StoreResult<bool> {
    for (key, condition) in filter {
        let ok = match key.as_str() {
            "$and" => combine_all(doc, condition)?,
            "$or" => combine_any(doc, condition)?,
            _ => matches_path(doc, key, condition)?,
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn combine_all(doc: &Document, clauses: &Bson) -> StoreResult<bool> {
    for clause in expect_clauses(clauses, "$and")? {
        if !matches(doc, clause)? {
            return Ok(false);
        }
    }
    Ok(true)
}

fn combine_any(doc: &Document, clauses: &Bson) -> StoreResult<bool> {
    for clause in expect_clauses(clauses, "$or")? {
        if matches(doc, clause)? {
            return Ok(true);
        }
    }
    Ok(false)
}

fn expect_clauses<'a>(clauses: &'a Bson, op: &str) -> StoreResult<Vec<&'a Document>> {
    let Bson::Array(array) = clauses else {
        return Err(StoreError::connection(format!(
            "{op} expects an array of clauses"
        )));
    };
    array
        .iter()
        .map(|clause| {
            clause.as_document().ok_or_else(|| {
                StoreError::connection(format!("{op} expects an array of clauses"))
            })
        })
        .collect()
}

fn matches_path(doc: &Document, path: &str, condition: &Bson) -> StoreResult<bool> {
    let value = lookup(doc, path);
    match condition {
        Bson::Document(ops) if is_operator_doc(ops) => matches_operators(value, ops),
        expected => Ok(compare_eq(value, expected)),
    }
}

fn is_operator_doc(doc: &Document) -> bool {
    doc.keys().next().is_some_and(|key| key.starts_with('$'))
}

fn matches_operators(value: Option<&Bson>, ops: &Document) -> StoreResult<bool> {
    for (op, operand) in ops {
        let ok = match op.as_str() {
            "$eq" => compare_eq(value, operand),
            "$ne" => !compare_eq(value, operand),
            "$gt" | "$gte" | "$lt" | "$lte" => compare_order(value, operand, op),
            "$in" => contains(operand, value, op)?,
            "$nin" => !contains(operand, value, op)?,
            "$exists" => value.is_some() == operand.as_bool().unwrap_or(true),
            "$not" => {
                let Some(inner) = operand.as_document() else {
                    return Err(StoreError::connection(
                        "$not expects an operator document",
                    ));
                };
                !matches_operators(value, inner)?
            }
            other => {
                return Err(StoreError::connection(format!(
                    "Unsupported filter operator {other}"
                )));
            }
        };
        if !ok {
            return Ok(false);
        }
    }
    Ok(true)
}

fn compare_eq(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        // A missing field only equals an explicit null, store-style.
        None => matches!(expected, Bson::Null),
        Some(actual) => {
            let actual = Comparable::from(actual);
            let expected = Comparable::from(expected);
            if actual == expected {
                return true;
            }
            // Equality against an array field also matches any element.
            if let Comparable::Array(items) = &actual {
                return items.iter().any(|item| item == &expected);
            }
            false
        }
    }
}

fn compare_order(value: Option<&Bson>, operand: &Bson, op: &str) -> bool {
    let Some(value) = value else {
        return false;
    };
    match Comparable::from(value).partial_cmp(&Comparable::from(operand)) {
        Some(ordering) => match op {
            "$gt" => ordering == Ordering::Greater,
            "$gte" => ordering != Ordering::Less,
            "$lt" => ordering == Ordering::Less,
            "$lte" => ordering != Ordering::Greater,
            _ => false,
        },
        None => false,
    }
}

fn contains(operand: &Bson, value: Option<&Bson>, op: &str) -> StoreResult<bool> {
    let Bson::Array(candidates) = operand else {
        return Err(StoreError::connection(format!("{op} expects an array")));
    };
    Ok(candidates
        .iter()
        .any(|candidate| compare_eq(value, candidate)))
}

/// Resolves a dotted field path inside a document.
pub(crate) fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = doc.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

/// Sorts documents in place by a multi-key sort specification.
///
/// Negative direction values sort descending; everything else sorts
/// ascending. The sort is stable, so ties keep insertion order.
pub(crate) fn sort_documents(docs: &mut [Document], sort: &Document) {
    let keys: Vec<(&str, bool)> = sort
        .iter()
        .map(|(field, direction)| {
            let descending = match direction {
                Bson::Int32(d) => *d < 0,
                Bson::Int64(d) => *d < 0,
                Bson::Double(d) => *d < 0.0,
                _ => false,
            };
            (field.as_str(), descending)
        })
        .collect();

    docs.sort_by(|a, b| {
        for (field, descending) in &keys {
            let left = lookup(a, field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);
            let right = lookup(b, field)
                .map(Comparable::from)
                .unwrap_or(Comparable::Null);

            let ordering = left.partial_cmp(&right).unwrap_or(Ordering::Equal);
            let ordering = if *descending {
                ordering.reverse()
            } else {
                ordering
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    });
}

/// Applies a projection to one document.
///
/// Store semantics: the first non-`_id` entry decides whether the
/// projection includes or excludes, and `_id` rides along on inclusive
/// projections unless excluded explicitly. Only top-level fields are
/// supported.
pub(crate) fn project(doc: &Document, projection: &Document) -> Document {
    if projection.is_empty() {
        return doc.clone();
    }

    let inclusive = projection
        .iter()
        .any(|(field, spec)| field != "_id" && is_truthy(spec));

    if inclusive {
        let mut out = Document::new();
        let id_excluded = projection.get("_id").is_some_and(|spec| !is_truthy(spec));
        if !id_excluded {
            if let Some(id) = doc.get("_id") {
                out.insert("_id", id.clone());
            }
        }
        for (field, spec) in projection {
            if field == "_id" || !is_truthy(spec) {
                continue;
            }
            if let Some(value) = doc.get(field) {
                out.insert(field.clone(), value.clone());
            }
        }
        out
    } else {
        let mut out = doc.clone();
        for (field, spec) in projection {
            if !is_truthy(spec) {
                out.remove(field);
            }
        }
        out
    }
}

fn is_truthy(spec: &Bson) -> bool {
    match spec {
        Bson::Boolean(value) => *value,
        Bson::Int32(value) => *value != 0,
        Bson::Int64(value) => *value != 0,
        Bson::Double(value) => *value != 0.0,
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[test]
    fn empty_filter_matches_everything() {
        let doc = doc! { "name": "a" };
        assert!(matches(&doc, &doc! {}).unwrap());
    }

    #[test]
    fn equality_normalizes_numeric_types() {
        let doc = doc! { "age": 30_i64 };
        assert!(matches(&doc, &doc! { "age": 30_i32 }).unwrap());
        assert!(matches(&doc, &doc! { "age": 30.0 }).unwrap());
        assert!(!matches(&doc, &doc! { "age": 31 }).unwrap());
    }

    #[test]
    fn equality_resolves_dotted_paths() {
        let doc = doc! { "profile": { "city": "Lyon" } };
        assert!(matches(&doc, &doc! { "profile.city": "Lyon" }).unwrap());
        assert!(!matches(&doc, &doc! { "profile.city": "Oslo" }).unwrap());
        assert!(!matches(&doc, &doc! { "profile.country": "FR" }).unwrap());
    }

    #[test]
    fn missing_field_equals_null_only() {
        let doc = doc! { "name": "a" };
        assert!(matches(&doc, &doc! { "age": Bson::Null }).unwrap());
        assert!(!matches(&doc, &doc! { "age": 1 }).unwrap());
    }

    #[test]
    fn comparison_operators() {
        let doc = doc! { "age": 30 };
        assert!(matches(&doc, &doc! { "age": { "$gt": 20 } }).unwrap());
        assert!(matches(&doc, &doc! { "age": { "$gte": 30 } }).unwrap());
        assert!(matches(&doc, &doc! { "age": { "$lte": 30 } }).unwrap());
        assert!(!matches(&doc, &doc! { "age": { "$lt": 30 } }).unwrap());
        assert!(matches(&doc, &doc! { "age": { "$gt": 20, "$lt": 40 } }).unwrap());
        assert!(matches(&doc, &doc! { "age": { "$ne": 31 } }).unwrap());
    }

    #[test]
    fn membership_operators() {
        let doc = doc! { "_id": "b" };
        assert!(matches(&doc, &doc! { "_id": { "$in": ["a", "b"] } }).unwrap());
        assert!(!matches(&doc, &doc! { "_id": { "$in": ["c"] } }).unwrap());
        assert!(matches(&doc, &doc! { "_id": { "$nin": ["c"] } }).unwrap());
        // A missing field satisfies $nin.
        assert!(matches(&doc, &doc! { "other": { "$nin": ["x"] } }).unwrap());
    }

    #[test]
    fn exists_operator() {
        let doc = doc! { "name": "a" };
        assert!(matches(&doc, &doc! { "name": { "$exists": true } }).unwrap());
        assert!(matches(&doc, &doc! { "age": { "$exists": false } }).unwrap());
        assert!(!matches(&doc, &doc! { "age": { "$exists": true } }).unwrap());
    }

    #[test]
    fn and_or_combinators() {
        let doc = doc! { "age": 30, "name": "a" };
        let and = doc! { "$and": [ { "age": { "$gte": 18 } }, { "name": "a" } ] };
        assert!(matches(&doc, &and).unwrap());

        let or = doc! { "$or": [ { "name": "b" }, { "age": 30 } ] };
        assert!(matches(&doc, &or).unwrap());

        let or_none = doc! { "$or": [ { "name": "b" }, { "age": 31 } ] };
        assert!(!matches(&doc, &or_none).unwrap());
    }

    #[test]
    fn array_field_matches_element() {
        let doc = doc! { "tags": ["red", "blue"] };
        assert!(matches(&doc, &doc! { "tags": "red" }).unwrap());
        assert!(!matches(&doc, &doc! { "tags": "green" }).unwrap());
    }

    #[test]
    fn not_negates_an_operator_expression() {
        let doc = doc! { "age": 30 };
        assert!(matches(&doc, &doc! { "age": { "$not": { "$gt": 40 } } }).unwrap());
        assert!(!matches(&doc, &doc! { "age": { "$not": { "$gte": 18 } } }).unwrap());
        // A missing field satisfies the negation, store-style.
        assert!(matches(&doc, &doc! { "name": { "$not": { "$eq": "a" } } }).unwrap());
    }

    #[test]
    fn unsupported_operator_is_rejected() {
        let doc = doc! { "name": "a" };
        let result = matches(&doc, &doc! { "name": { "$regex": "^a" } });
        assert!(result.is_err());
    }

    #[test]
    fn sorts_by_multiple_keys_with_directions() {
        let mut docs = vec![
            doc! { "group": "b", "rank": 1 },
            doc! { "group": "a", "rank": 2 },
            doc! { "group": "a", "rank": 1 },
        ];
        sort_documents(&mut docs, &doc! { "group": 1, "rank": -1 });

        let ranks: Vec<(String, i32)> = docs
            .iter()
            .map(|d| {
                (
                    d.get_str("group").unwrap().to_string(),
                    d.get_i32("rank").unwrap(),
                )
            })
            .collect();
        assert_eq!(
            ranks,
            vec![
                ("a".to_string(), 2),
                ("a".to_string(), 1),
                ("b".to_string(), 1)
            ]
        );
    }

    #[test]
    fn inclusive_projection_keeps_id() {
        let doc = doc! { "_id": "x", "name": "a", "age": 30 };
        let projected = project(&doc, &doc! { "name": 1 });
        assert_eq!(projected, doc! { "_id": "x", "name": "a" });

        let without_id = project(&doc, &doc! { "name": 1, "_id": 0 });
        assert_eq!(without_id, doc! { "name": "a" });
    }

    #[test]
    fn exclusive_projection_removes_fields() {
        let doc = doc! { "_id": "x", "name": "a", "age": 30 };
        let projected = project(&doc, &doc! { "age": 0 });
        assert_eq!(projected, doc! { "_id": "x", "name": "a" });
    }
}

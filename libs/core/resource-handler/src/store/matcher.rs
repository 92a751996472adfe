//! Evaluates the subset of MongoDB filter syntax the API produces.

use mongodb::bson::{Bson, Document};
use std::cmp::Ordering;

/// Whether `document` satisfies `filter`.
///
/// Supports implicit equality (array fields match on any element), `$and`,
/// `$or` and the field operators `$eq $ne $gt $gte $lt $lte $in $nin $exists`.
/// Unknown operators never match.
pub fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(key, condition)| match key.as_str() {
        "$and" => sub_filters(condition).all(|f| matches_filter(document, f)),
        "$or" => sub_filters(condition).any(|f| matches_filter(document, f)),
        _ => matches_field(lookup(document, key), condition),
    })
}

fn sub_filters(condition: &Bson) -> impl Iterator<Item = &Document> {
    condition
        .as_array()
        .into_iter()
        .flatten()
        .filter_map(Bson::as_document)
}

/// Resolve a dotted path such as `startLocation.type`.
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut segments = path.split('.');
    let mut current = document.get(segments.next()?)?;
    for segment in segments {
        current = current.as_document()?.get(segment)?;
    }
    Some(current)
}

fn is_operator_document(condition: &Bson) -> bool {
    condition
        .as_document()
        .is_some_and(|d| !d.is_empty() && d.keys().all(|k| k.starts_with('$')))
}

fn matches_field(value: Option<&Bson>, condition: &Bson) -> bool {
    let Some(operators) = condition.as_document().filter(|_| is_operator_document(condition)) else {
        return equals(value, condition);
    };

    operators.iter().all(|(op, operand)| match op.as_str() {
        "$eq" => equals(value, operand),
        "$ne" => !equals(value, operand),
        "$gt" => any_compares(value, operand, |o| o == Ordering::Greater),
        "$gte" => any_compares(value, operand, |o| o != Ordering::Less),
        "$lt" => any_compares(value, operand, |o| o == Ordering::Less),
        "$lte" => any_compares(value, operand, |o| o != Ordering::Greater),
        "$in" => operand
            .as_array()
            .is_some_and(|candidates| candidates.iter().any(|c| equals(value, c))),
        "$nin" => operand
            .as_array()
            .is_some_and(|candidates| !candidates.iter().any(|c| equals(value, c))),
        "$exists" => value.is_some() == operand.as_bool().unwrap_or(true),
        _ => false,
    })
}

fn equals(value: Option<&Bson>, expected: &Bson) -> bool {
    match value {
        None => matches!(expected, Bson::Null),
        Some(Bson::Array(items)) if !matches!(expected, Bson::Array(_)) => {
            items.iter().any(|item| scalar_eq(item, expected))
        }
        Some(actual) => scalar_eq(actual, expected),
    }
}

fn scalar_eq(actual: &Bson, expected: &Bson) -> bool {
    match (as_number(actual), as_number(expected)) {
        (Some(a), Some(b)) => a == b,
        _ => actual == expected,
    }
}

fn any_compares(value: Option<&Bson>, operand: &Bson, accept: impl Fn(Ordering) -> bool) -> bool {
    let check = |v: &Bson| comparable(v, operand).is_some_and(&accept);
    match value {
        Some(Bson::Array(items)) => items.iter().any(check),
        Some(v) => check(v),
        None => false,
    }
}

/// Ordering between values of the same kind: numbers with numbers, strings
/// with strings, booleans with booleans.
fn comparable(a: &Bson, b: &Bson) -> Option<Ordering> {
    match (a, b) {
        (Bson::String(x), Bson::String(y)) => Some(x.cmp(y)),
        (Bson::Boolean(x), Bson::Boolean(y)) => Some(x.cmp(y)),
        (Bson::DateTime(x), Bson::DateTime(y)) => Some(x.cmp(y)),
        _ => as_number(a)?.partial_cmp(&as_number(b)?),
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Rank used when sorting values of different kinds, following MongoDB's
/// comparison order for the types the API stores.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_) | Bson::Int64(_) | Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::Boolean(_)) => 5,
        Some(Bson::DateTime(_)) => 6,
        Some(_) => 7,
    }
}

/// Total order over optional field values for in-memory sorting.
pub fn compare_values(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let by_rank = type_rank(a).cmp(&type_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    match (a, b) {
        (Some(x), Some(y)) => comparable(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

pub(crate) fn field<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    lookup(document, path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    fn tour() -> Document {
        doc! {
            "_id": "a",
            "name": "The Forest Hiker",
            "price": 397.0,
            "duration": 5,
            "difficulty": "easy",
            "secretTour": false,
            "guides": ["g1", "g2"],
            "startLocation": { "description": "Banff, CAN" },
        }
    }

    #[test]
    fn test_equality_and_numeric_coercion() {
        assert!(matches_filter(&tour(), &doc! { "difficulty": "easy" }));
        assert!(matches_filter(&tour(), &doc! { "duration": 5.0 }));
        assert!(!matches_filter(&tour(), &doc! { "difficulty": "hard" }));
        assert!(matches_filter(&tour(), &doc! {}));
    }

    #[test]
    fn test_comparison_operators() {
        assert!(matches_filter(&tour(), &doc! { "price": { "$gte": 397, "$lt": 500 } }));
        assert!(!matches_filter(&tour(), &doc! { "price": { "$gt": 397 } }));
        assert!(!matches_filter(&tour(), &doc! { "missing": { "$lt": 10 } }));
        assert!(!matches_filter(&tour(), &doc! { "name": { "$gt": 5 } }));
    }

    #[test]
    fn test_not_equal_matches_missing_field() {
        assert!(matches_filter(&tour(), &doc! { "secretTour": { "$ne": true } }));
        assert!(matches_filter(&doc! { "_id": "b" }, &doc! { "secretTour": { "$ne": true } }));
        assert!(!matches_filter(&doc! { "secretTour": true }, &doc! { "secretTour": { "$ne": true } }));
    }

    #[test]
    fn test_array_fields_match_any_element() {
        assert!(matches_filter(&tour(), &doc! { "guides": "g2" }));
        assert!(matches_filter(&tour(), &doc! { "_id": { "$in": ["x", "a"] } }));
        assert!(!matches_filter(&tour(), &doc! { "_id": { "$nin": ["a"] } }));
    }

    #[test]
    fn test_dotted_paths_and_logical_operators() {
        assert!(matches_filter(&tour(), &doc! { "startLocation.description": "Banff, CAN" }));
        assert!(matches_filter(
            &tour(),
            &doc! { "$or": [{ "price": 1 }, { "difficulty": "easy" }] }
        ));
        assert!(!matches_filter(
            &tour(),
            &doc! { "$and": [{ "price": 397 }, { "difficulty": "hard" }] }
        ));
    }

    #[test]
    fn test_compare_values_orders_missing_first() {
        let five = Bson::Int32(5);
        let six = Bson::Double(6.0);
        let text = Bson::String("a".into());

        assert_eq!(compare_values(None, Some(&five)), Ordering::Less);
        assert_eq!(compare_values(Some(&five), Some(&six)), Ordering::Less);
        assert_eq!(compare_values(Some(&six), Some(&text)), Ordering::Less);
    }
}

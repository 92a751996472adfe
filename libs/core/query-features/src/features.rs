use crate::cast::{FieldType, field_type};
use crate::descriptor::{FilterExpr, QueryDescriptor};
use crate::query::{DEFAULT_LIMIT, DEFAULT_PAGE, FindQuery, ID_FIELD, Projection, SortKey};
use mongodb::bson::{Bson, Document};

/// Composes filter, sort, projection and pagination onto a [`FindQuery`]
/// from a [`QueryDescriptor`].
///
/// ```
/// use query_features::{FindQuery, QueryDescriptor, QueryFeatures};
///
/// let descriptor = QueryDescriptor::from_pairs([("page", "3"), ("limit", "10")]);
/// let query = QueryFeatures::new(FindQuery::all(), &descriptor)
///     .filter()
///     .sort()
///     .limit_fields()
///     .paginate()
///     .into_query();
///
/// assert_eq!(query.skip, 20);
/// assert_eq!(query.limit, Some(10));
/// ```
pub struct QueryFeatures<'a> {
    query: FindQuery,
    descriptor: &'a QueryDescriptor,
    schema: &'a [(&'a str, FieldType)],
}

impl<'a> QueryFeatures<'a> {
    pub fn new(query: FindQuery, descriptor: &'a QueryDescriptor) -> Self {
        Self {
            query,
            descriptor,
            schema: &[],
        }
    }

    /// Field types used to cast filter values; untyped fields stay strings.
    pub fn with_schema(mut self, schema: &'a [(&'a str, FieldType)]) -> Self {
        self.schema = schema;
        self
    }

    pub fn filter(mut self) -> Self {
        for (field, expr) in self.descriptor.predicates() {
            let ty = field_type(self.schema, field);
            let value = match expr {
                FilterExpr::Eq(raw) => ty.cast(raw),
                FilterExpr::Compare(ops) => {
                    let mut condition = Document::new();
                    for (op, raw) in ops {
                        condition.insert(op.mongo_operator(), ty.cast(raw));
                    }
                    Bson::Document(condition)
                }
            };
            self.query.filter.insert(field.as_str(), value);
        }
        self
    }

    pub fn sort(mut self) -> Self {
        let keys: Vec<SortKey> = self
            .descriptor
            .sort()
            .map(|raw| raw.split(',').filter_map(SortKey::parse).collect())
            .unwrap_or_default();

        self.query.sort = if keys.is_empty() {
            vec![SortKey::asc(ID_FIELD)]
        } else {
            keys
        };
        self
    }

    pub fn limit_fields(mut self) -> Self {
        let entries: Vec<&str> = self
            .descriptor
            .fields()
            .map(|raw| raw.split(',').map(str::trim).filter(|f| !f.is_empty()).collect())
            .unwrap_or_default();

        let excluded: Vec<String> = entries
            .iter()
            .filter_map(|f| f.strip_prefix('-'))
            .filter(|f| !f.is_empty())
            .map(str::to_string)
            .collect();

        self.query.projection = if entries.is_empty() {
            Projection::Default
        } else if excluded.len() == entries.len() {
            Projection::Exclude(excluded)
        } else if excluded.is_empty() && entries.iter().all(|f| !f.starts_with('-')) {
            Projection::Include(entries.iter().map(|f| f.to_string()).collect())
        } else {
            tracing::debug!(fields = ?entries, "mixed field selection, using default projection");
            Projection::Default
        };
        self
    }

    pub fn paginate(mut self) -> Self {
        let page = positive_or(self.descriptor.page(), DEFAULT_PAGE);
        let limit = positive_or(self.descriptor.limit(), DEFAULT_LIMIT).min(MAX_WINDOW);

        self.query.skip = (page - 1).saturating_mul(limit).min(MAX_WINDOW);
        self.query.limit = Some(limit);
        self
    }

    pub fn into_query(self) -> FindQuery {
        self.query
    }
}

/// Largest skip or limit the driver accepts (it sends both as `i64`).
const MAX_WINDOW: u64 = i64::MAX as u64;

fn positive_or(raw: Option<&str>, default: u64) -> u64 {
    raw.and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    const SCHEMA: &[(&str, FieldType)] = &[
        ("price", FieldType::Number),
        ("duration", FieldType::Integer),
        ("secretTour", FieldType::Boolean),
    ];

    fn build(pairs: &[(&str, &str)]) -> FindQuery {
        let descriptor = QueryDescriptor::from_pairs(pairs.iter().copied());
        QueryFeatures::new(FindQuery::all(), &descriptor)
            .with_schema(SCHEMA)
            .filter()
            .sort()
            .limit_fields()
            .paginate()
            .into_query()
    }

    #[test]
    fn test_empty_descriptor_uses_defaults() {
        let query = build(&[]);

        assert!(query.filter.is_empty());
        assert_eq!(query.sort, vec![SortKey::asc("_id")]);
        assert_eq!(query.projection, Projection::Default);
        assert_eq!(query.skip, 0);
        assert_eq!(query.limit, Some(100));
    }

    #[test]
    fn test_filter_casts_typed_fields() {
        let query = build(&[
            ("duration[gte]", "5"),
            ("price[lt]", "1500"),
            ("difficulty", "easy"),
            ("secretTour", "false"),
        ]);

        assert_eq!(
            query.filter,
            doc! {
                "difficulty": "easy",
                "duration": { "$gte": 5_i64 },
                "price": { "$lt": 1500.0 },
                "secretTour": false,
            }
        );
    }

    #[test]
    fn test_filter_keeps_existing_base_conditions() {
        let descriptor = QueryDescriptor::from_pairs([("rating", "5")]);
        let query = QueryFeatures::new(FindQuery::new(doc! { "tour": "t1" }), &descriptor)
            .filter()
            .into_query();

        assert_eq!(query.filter, doc! { "tour": "t1", "rating": "5" });
    }

    #[test]
    fn test_sort_applies_keys_in_order() {
        let query = build(&[("sort", "-ratingsAverage,price")]);
        assert_eq!(
            query.sort,
            vec![SortKey::desc("ratingsAverage"), SortKey::asc("price")]
        );
    }

    #[test]
    fn test_blank_sort_falls_back_to_id() {
        let query = build(&[("sort", " , ")]);
        assert_eq!(query.sort, vec![SortKey::asc("_id")]);
    }

    #[test]
    fn test_fields_include_and_exclude() {
        let query = build(&[("fields", "name,price")]);
        assert_eq!(
            query.projection,
            Projection::Include(vec!["name".into(), "price".into()])
        );

        let query = build(&[("fields", "-summary,-description")]);
        assert_eq!(
            query.projection,
            Projection::Exclude(vec!["summary".into(), "description".into()])
        );
    }

    #[test]
    fn test_mixed_fields_use_default_projection() {
        let query = build(&[("fields", "name,-price")]);
        assert_eq!(query.projection, Projection::Default);
    }

    #[test]
    fn test_paginate_computes_skip_from_page_and_limit() {
        let query = build(&[("page", "3"), ("limit", "10")]);
        assert_eq!(query.skip, 20);
        assert_eq!(query.limit, Some(10));
    }

    #[test]
    fn test_invalid_pagination_values_use_defaults() {
        for (page, limit) in [("0", "0"), ("-1", "-5"), ("abc", "1.5")] {
            let query = build(&[("page", page), ("limit", limit)]);
            assert_eq!(query.skip, 0);
            assert_eq!(query.limit, Some(100));
        }
    }

    #[test]
    fn test_huge_page_stays_within_driver_range() {
        let query = build(&[("page", "100000000000000000")]);
        assert!(i64::try_from(query.skip).is_ok(), "skip {}", query.skip);
        assert_eq!(query.limit, Some(100));

        let query = build(&[("page", "2"), ("limit", "18446744073709551615")]);
        assert_eq!(query.limit, Some(i64::MAX as u64));
        assert_eq!(query.skip, i64::MAX as u64);
    }
}

//! Parsed list-request parameters.

use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Control keys consumed by the builder stages instead of the filter.
pub const CONTROL_KEYS: [&str; 4] = ["page", "limit", "sort", "fields"];

/// Comparison operators accepted in `field[op]=value` keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum ComparisonOp {
    Gt,
    Gte,
    Lt,
    Lte,
}

impl ComparisonOp {
    /// The MongoDB query operator for this comparison.
    pub fn mongo_operator(self) -> &'static str {
        match self {
            ComparisonOp::Gt => "$gt",
            ComparisonOp::Gte => "$gte",
            ComparisonOp::Lt => "$lt",
            ComparisonOp::Lte => "$lte",
        }
    }
}

/// A single field predicate, values still raw strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterExpr {
    Eq(String),
    Compare(BTreeMap<ComparisonOp, String>),
}

/// Query string of a list request, split into predicates and control keys.
///
/// Built once per request and never mutated afterwards; alias routes derive
/// a new descriptor through [`QueryDescriptor::with_defaults`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryDescriptor {
    predicates: BTreeMap<String, FilterExpr>,
    page: Option<String>,
    limit: Option<String>,
    sort: Option<String>,
    fields: Option<String>,
}

impl QueryDescriptor {
    /// Build a descriptor from decoded `key=value` pairs, in request order.
    ///
    /// Keys starting with `$` or containing `.` are dropped, as are bracket
    /// keys with an operator outside `gt|gte|lt|lte`. A repeated control key
    /// keeps its last value.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut descriptor = Self::default();

        for (key, value) in pairs {
            let key = key.as_ref().trim();
            let value = value.into();

            match key {
                "page" => descriptor.page = Some(value),
                "limit" => descriptor.limit = Some(value),
                "sort" => descriptor.sort = Some(value),
                "fields" => descriptor.fields = Some(value),
                _ => descriptor.push_predicate(key, value),
            }
        }

        descriptor
    }

    fn push_predicate(&mut self, key: &str, value: String) {
        let (field, op) = match split_operator(key) {
            Some(parts) => parts,
            None => {
                tracing::debug!(key, "dropping malformed query key");
                return;
            }
        };

        if field.is_empty() || field.starts_with('$') || field.contains('.') {
            tracing::debug!(key, "dropping unsafe query key");
            return;
        }

        match op {
            None => {
                self.predicates.insert(field.to_string(), FilterExpr::Eq(value));
            }
            Some(op) => {
                let entry = self
                    .predicates
                    .entry(field.to_string())
                    .or_insert_with(|| FilterExpr::Compare(BTreeMap::new()));
                match entry {
                    FilterExpr::Compare(ops) => {
                        ops.insert(op, value);
                    }
                    FilterExpr::Eq(_) => {
                        *entry = FilterExpr::Compare(BTreeMap::from([(op, value)]));
                    }
                }
            }
        }
    }

    /// Fill in control keys the request did not set itself.
    pub fn with_defaults(mut self, defaults: &[(&str, &str)]) -> Self {
        for (key, value) in defaults {
            let slot = match *key {
                "page" => &mut self.page,
                "limit" => &mut self.limit,
                "sort" => &mut self.sort,
                "fields" => &mut self.fields,
                _ => continue,
            };
            if slot.is_none() {
                *slot = Some((*value).to_string());
            }
        }
        self
    }

    pub fn predicates(&self) -> &BTreeMap<String, FilterExpr> {
        &self.predicates
    }

    pub fn page(&self) -> Option<&str> {
        self.page.as_deref()
    }

    pub fn limit(&self) -> Option<&str> {
        self.limit.as_deref()
    }

    pub fn sort(&self) -> Option<&str> {
        self.sort.as_deref()
    }

    pub fn fields(&self) -> Option<&str> {
        self.fields.as_deref()
    }
}

/// Split `price[gte]` into `("price", Some(Gte))`; plain keys have no operator.
/// Returns `None` for a bracket key that is not a known comparison.
fn split_operator(key: &str) -> Option<(&str, Option<ComparisonOp>)> {
    match key.split_once('[') {
        None => Some((key, None)),
        Some((field, rest)) => {
            let op = rest.strip_suffix(']')?;
            let op = op.parse::<ComparisonOp>().ok()?;
            Some((field, Some(op)))
        }
    }
}

use mongodb::bson::{Bson, Document};

/// Identifier field of every stored document
pub const ID_FIELD: &str = "_id";
/// Store-managed revision counter, hidden by the default projection
pub const VERSION_FIELD: &str = "__v";

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn as_i32(self) -> i32 {
        match self {
            SortDirection::Ascending => 1,
            SortDirection::Descending => -1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortKey {
    pub field: String,
    pub direction: SortDirection,
}

impl SortKey {
    pub fn asc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Ascending,
        }
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            direction: SortDirection::Descending,
        }
    }

    /// Parse `price` or `-price`. Blank input yields `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        match raw.strip_prefix('-') {
            Some(field) if !field.trim().is_empty() => Some(Self::desc(field.trim())),
            Some(_) => None,
            None if raw.is_empty() => None,
            None => Some(Self::asc(raw)),
        }
    }
}

/// Field selection applied to returned documents.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Projection {
    /// Everything except [`VERSION_FIELD`]
    #[default]
    Default,
    /// Only these fields, plus [`ID_FIELD`]
    Include(Vec<String>),
    /// Everything except these fields
    Exclude(Vec<String>),
}

impl Projection {
    /// MongoDB projection document for this selection.
    pub fn to_document(&self) -> Document {
        match self {
            Projection::Default => {
                let mut projection = Document::new();
                projection.insert(VERSION_FIELD, 0);
                projection
            }
            Projection::Include(fields) => {
                let mut projection = Document::new();
                projection.insert(ID_FIELD, 1);
                for field in fields {
                    projection.insert(field.as_str(), 1);
                }
                projection
            }
            Projection::Exclude(fields) => {
                let mut projection = Document::new();
                for field in fields {
                    projection.insert(field.as_str(), 0);
                }
                projection
            }
        }
    }

    /// Apply the selection to an already loaded document.
    pub fn apply(&self, document: Document) -> Document {
        match self {
            Projection::Default => {
                let mut document = document;
                document.remove(VERSION_FIELD);
                document
            }
            Projection::Include(fields) => document
                .into_iter()
                .filter(|(key, _)| key == ID_FIELD || fields.iter().any(|f| f == key))
                .collect(),
            Projection::Exclude(fields) => document
                .into_iter()
                .filter(|(key, _)| !fields.iter().any(|f| f == key))
                .collect(),
        }
    }
}

/// An unexecuted read against one collection.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindQuery {
    pub filter: Document,
    pub sort: Vec<SortKey>,
    pub projection: Projection,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindQuery {
    pub fn new(filter: Document) -> Self {
        Self {
            filter,
            ..Self::default()
        }
    }

    /// Match every document.
    pub fn all() -> Self {
        Self::default()
    }

    /// AND another condition document into the filter. Keys already present
    /// are overwritten.
    pub fn and(mut self, conditions: Document) -> Self {
        for (key, value) in conditions {
            self.filter.insert(key, value);
        }
        self
    }

    pub fn sorted_by(mut self, keys: Vec<SortKey>) -> Self {
        self.sort = keys;
        self
    }

    pub fn with_projection(mut self, projection: Projection) -> Self {
        self.projection = projection;
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Sort document for the driver; empty when no keys are set.
    pub fn sort_document(&self) -> Document {
        self.sort
            .iter()
            .map(|key| (key.field.clone(), Bson::Int32(key.direction.as_i32())))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_sort_key_parse_handles_direction_and_blanks() {
        assert_eq!(SortKey::parse("price"), Some(SortKey::asc("price")));
        assert_eq!(SortKey::parse(" -price "), Some(SortKey::desc("price")));
        assert_eq!(SortKey::parse("-"), None);
        assert_eq!(SortKey::parse("  "), None);
    }

    #[test]
    fn test_include_projection_always_keeps_id() {
        let projection = Projection::Include(vec!["name".into(), "price".into()]);

        assert_eq!(
            projection.to_document(),
            doc! { "_id": 1, "name": 1, "price": 1 }
        );

        let applied = projection.apply(doc! {
            "_id": "a",
            "name": "The Forest Hiker",
            "price": 397,
            "summary": "x",
            "__v": 0,
        });
        assert_eq!(applied, doc! { "_id": "a", "name": "The Forest Hiker", "price": 397 });
    }

    #[test]
    fn test_default_projection_hides_version() {
        let applied = Projection::Default.apply(doc! { "_id": "a", "__v": 3, "name": "n" });
        assert_eq!(applied, doc! { "_id": "a", "name": "n" });
        assert_eq!(Projection::Default.to_document(), doc! { "__v": 0 });
    }

    #[test]
    fn test_exclude_projection_drops_listed_fields() {
        let projection = Projection::Exclude(vec!["summary".into()]);
        let applied = projection.apply(doc! { "_id": "a", "summary": "x", "__v": 1 });
        assert_eq!(applied, doc! { "_id": "a", "__v": 1 });
    }

    #[test]
    fn test_and_merges_conditions_into_filter() {
        let query = FindQuery::new(doc! { "active": { "$ne": false } }).and(doc! { "tour": "t1" });
        assert_eq!(query.filter, doc! { "active": { "$ne": false }, "tour": "t1" });
    }

    #[test]
    fn test_sort_document_keeps_key_order() {
        let query = FindQuery::all().sorted_by(vec![SortKey::desc("ratingsAverage"), SortKey::asc("price")]);
        assert_eq!(query.sort_document(), doc! { "ratingsAverage": -1, "price": 1 });
    }
}

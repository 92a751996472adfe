use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use mongodb::bson::Bson;

/// Declared type of a filterable field, used to cast query-string values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Integer,
    Boolean,
    /// Stored as RFC 3339 text, so casting normalises to the same format
    DateTime,
}

impl FieldType {
    /// Cast a raw query value. Anything that does not parse stays a string.
    pub fn cast(self, raw: &str) -> Bson {
        let trimmed = raw.trim();
        let cast = match self {
            FieldType::String => None,
            FieldType::Number => trimmed.parse::<f64>().ok().filter(|v| v.is_finite()).map(Bson::Double),
            FieldType::Integer => trimmed.parse::<i64>().ok().map(Bson::Int64),
            FieldType::Boolean => match trimmed {
                "true" => Some(Bson::Boolean(true)),
                "false" => Some(Bson::Boolean(false)),
                _ => None,
            },
            FieldType::DateTime => parse_datetime(trimmed).map(|dt| Bson::String(format_datetime(&dt))),
        };

        cast.unwrap_or_else(|| Bson::String(raw.to_string()))
    }
}

/// Format a timestamp the way entities serialize them.
pub fn format_datetime(value: &DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

fn parse_datetime(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

/// Look up the declared type of `field`, defaulting to [`FieldType::String`].
pub fn field_type(schema: &[(&str, FieldType)], field: &str) -> FieldType {
    schema
        .iter()
        .find(|(name, _)| *name == field)
        .map(|(_, ty)| *ty)
        .unwrap_or(FieldType::String)
}

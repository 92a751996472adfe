//! List-query building for resource endpoints.
//!
//! A request's query string is parsed once into a [`QueryDescriptor`];
//! [`QueryFeatures`] then layers filter, sort, field selection and
//! pagination onto a [`FindQuery`] that a document store executes.

mod cast;
mod descriptor;
mod features;
mod query;

pub use cast::{FieldType, format_datetime};
pub use descriptor::{CONTROL_KEYS, ComparisonOp, FilterExpr, QueryDescriptor};
pub use features::QueryFeatures;
pub use query::{
    DEFAULT_LIMIT, DEFAULT_PAGE, FindQuery, ID_FIELD, Projection, SortDirection, SortKey,
    VERSION_FIELD,
};

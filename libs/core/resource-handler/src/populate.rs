//! Resolution of references between collections.
//!
//! A [`Populate::Ref`] replaces stored ids with the referenced documents; a
//! [`Populate::Virtual`] attaches the documents of another collection that
//! point back at this one.

use crate::error::StoreResult;
use crate::store::DocumentStore;
use futures::future::BoxFuture;
use mongodb::bson::{Bson, Document, doc};
use query_features::{FindQuery, ID_FIELD, VERSION_FIELD};

/// Fields kept from a populated document.
#[derive(Debug, Clone, Copy)]
pub enum Select {
    All,
    Only(&'static [&'static str]),
    Except(&'static [&'static str]),
}

impl Select {
    pub fn apply(&self, document: Document) -> Document {
        document
            .into_iter()
            .filter(|(key, _)| key != VERSION_FIELD)
            .filter(|(key, _)| match self {
                Select::All => true,
                Select::Only(fields) => key == ID_FIELD || fields.contains(&key.as_str()),
                Select::Except(fields) => !fields.contains(&key.as_str()),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub enum Populate {
    /// `path` holds one id or an array of ids into `collection`
    Ref {
        path: &'static str,
        collection: &'static str,
        select: Select,
    },
    /// Documents of `collection` whose `foreign_field` equals this `_id`,
    /// stored under `path`
    Virtual {
        path: &'static str,
        collection: &'static str,
        foreign_field: &'static str,
        select: Select,
        nested: &'static [Populate],
    },
}

/// Resolve every relation in `specs` on `document`, in place.
///
/// Paths missing from the document (projected away) are skipped; dangling
/// ids are dropped from arrays and become `null` for single references.
pub fn resolve<'a>(
    store: &'a dyn DocumentStore,
    document: &'a mut Document,
    specs: &'a [Populate],
) -> BoxFuture<'a, StoreResult<()>> {
    Box::pin(async move {
        for populate in specs {
            match *populate {
                Populate::Ref {
                    path,
                    collection,
                    select,
                } => {
                    let Some(stored) = document.get(path).cloned() else {
                        continue;
                    };
                    let resolved = resolve_ref(store, collection, select, stored).await?;
                    document.insert(path, resolved);
                }
                Populate::Virtual {
                    path,
                    collection,
                    foreign_field,
                    select,
                    nested,
                } => {
                    let Some(id) = document.get(ID_FIELD).cloned() else {
                        continue;
                    };
                    let filter = field_equals(foreign_field, id);

                    let mut related = Vec::new();
                    for found in store.find(collection, &FindQuery::new(filter)).await? {
                        let mut child = select.apply(found);
                        resolve(store, &mut child, nested).await?;
                        related.push(Bson::Document(child));
                    }
                    document.insert(path, Bson::Array(related));
                }
            }
        }
        Ok(())
    })
}

fn field_equals(field: &str, value: impl Into<Bson>) -> Document {
    let mut filter = Document::new();
    filter.insert(field, value.into());
    filter
}

async fn resolve_ref(
    store: &dyn DocumentStore,
    collection: &str,
    select: Select,
    stored: Bson,
) -> StoreResult<Bson> {
    match stored {
        Bson::Array(ids) => {
            if ids.is_empty() {
                return Ok(Bson::Array(ids));
            }
            let query = FindQuery::new(field_equals(ID_FIELD, doc! { "$in": ids.clone() }));
            let found = store.find(collection, &query).await?;

            // Keep the stored order of ids.
            let resolved = ids
                .iter()
                .filter_map(|id| found.iter().find(|d| d.get(ID_FIELD) == Some(id)))
                .map(|d| Bson::Document(select.apply(d.clone())))
                .collect();
            Ok(Bson::Array(resolved))
        }
        Bson::Null => Ok(Bson::Null),
        id => {
            let found = store.find_one(collection, field_equals(ID_FIELD, id)).await?;
            Ok(found
                .map(|d| Bson::Document(select.apply(d)))
                .unwrap_or(Bson::Null))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryStore;

    const REVIEW_USER: &[Populate] = &[Populate::Ref {
        path: "user",
        collection: "users",
        select: Select::Only(&["name", "photo"]),
    }];

    async fn store() -> InMemoryStore {
        let store = InMemoryStore::new();
        for (id, name) in [("u1", "Lourdes Browning"), ("u2", "Sophie Louise Hart")] {
            store
                .insert_one(
                    "users",
                    doc! { "_id": id, "name": name, "photo": "user.jpg", "email": "x@example.com", "__v": 0 },
                )
                .await
                .unwrap();
        }
        store
            .insert_one("reviews", doc! { "_id": "r1", "review": "Great", "tour": "t1", "user": "u2" })
            .await
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_ref_array_keeps_order_and_selection() {
        let store = store().await;
        let mut tour = doc! { "_id": "t1", "guides": ["u2", "missing", "u1"] };

        let specs = [Populate::Ref {
            path: "guides",
            collection: "users",
            select: Select::Except(&["email"]),
        }];
        resolve(&store, &mut tour, &specs).await.unwrap();

        let guides = tour.get_array("guides").unwrap();
        assert_eq!(guides.len(), 2);
        let first = guides[0].as_document().unwrap();
        assert_eq!(first.get_str("name").unwrap(), "Sophie Louise Hart");
        assert!(!first.contains_key("email"));
        assert!(!first.contains_key("__v"));
    }

    #[tokio::test]
    async fn test_virtual_with_nested_ref() {
        let store = store().await;
        let mut tour = doc! { "_id": "t1", "name": "The Forest Hiker" };

        let specs = [Populate::Virtual {
            path: "reviews",
            collection: "reviews",
            foreign_field: "tour",
            select: Select::All,
            nested: REVIEW_USER,
        }];
        resolve(&store, &mut tour, &specs).await.unwrap();

        let reviews = tour.get_array("reviews").unwrap();
        assert_eq!(reviews.len(), 1);
        let user = reviews[0].as_document().unwrap().get_document("user").unwrap();
        assert_eq!(user, &doc! { "_id": "u2", "name": "Sophie Louise Hart", "photo": "user.jpg" });
    }

    #[tokio::test]
    async fn test_projected_away_path_is_skipped() {
        let store = store().await;
        let mut review = doc! { "_id": "r1", "review": "Great" };

        resolve(&store, &mut review, REVIEW_USER).await.unwrap();
        assert!(!review.contains_key("user"));
    }
}

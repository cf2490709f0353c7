//! Shared model fixtures for unit tests.

use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use docmap_schema::{FieldKind, Model, ModelSchema};
use docmap_types::{Direction, IndexModel};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cat {
    pub name: String,
    pub breed: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub age: Option<i64>,
}

impl Cat {
    pub fn new(name: &str, breed: &str, age: Option<i64>) -> Self {
        Self {
            name: name.to_string(),
            breed: breed.to_string(),
            age,
        }
    }
}

static CAT_SCHEMA: LazyLock<ModelSchema> = LazyLock::new(|| {
    ModelSchema::builder("Cat")
        .collection("cats")
        .field("name", FieldKind::String)
        .field("breed", FieldKind::String)
        .field("age", FieldKind::optional(FieldKind::Int))
        .hashable(["name", "breed"])
        .index(
            IndexModel::compound(vec![
                ("name".into(), Direction::Ascending),
                ("breed".into(), Direction::Ascending),
            ])
            .unique(),
        )
        .build()
        .expect("cat schema")
});

impl Model for Cat {
    fn schema() -> &'static ModelSchema {
        &CAT_SCHEMA
    }
}

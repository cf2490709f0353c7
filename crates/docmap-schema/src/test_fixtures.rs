//! Shared schema fixtures for unit tests.

use std::sync::LazyLock;

use docmap_types::{Direction, IndexModel};

use crate::kind::FieldKind;
use crate::model::ModelSchema;

static CAT: LazyLock<ModelSchema> = LazyLock::new(|| {
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

static KEEPER: LazyLock<ModelSchema> = LazyLock::new(|| {
    ModelSchema::builder("Keeper")
        .field("pet", FieldKind::Model(cat_schema()))
        .field("badge", FieldKind::Int)
        .build()
        .expect("keeper schema")
});

static OWNER: LazyLock<ModelSchema> = LazyLock::new(|| {
    ModelSchema::builder("Owner")
        .field("name", FieldKind::String)
        .field("pet", FieldKind::Model(cat_schema()))
        .field("previous_pet", FieldKind::optional(FieldKind::Model(cat_schema())))
        .field("litter", FieldKind::list(FieldKind::Model(cat_schema())))
        .field(
            "companion",
            FieldKind::Union(vec![
                FieldKind::Model(cat_schema()),
                FieldKind::Model(keeper_schema()),
            ]),
        )
        .hashable(["name", "pet.name"])
        .build()
        .expect("owner schema")
});

pub fn cat_schema() -> &'static ModelSchema {
    &CAT
}

pub fn keeper_schema() -> &'static ModelSchema {
    &KEEPER
}

pub fn owner_schema() -> &'static ModelSchema {
    &OWNER
}

//! Rich-text body entity for SeaORM. Keyed by the owning post's id; the
//! FK cascades deletes so a body never outlives its post.

use sea_orm::Set;
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "post_contents")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub post_id: Uuid,
    #[sea_orm(column_type = "Text")]
    pub body: String,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::post::Entity",
        from = "Column::PostId",
        to = "super::post::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Post,
}

impl Related<super::post::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Post.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Conversion from SeaORM Model to Domain PostContent.
impl From<Model> for quill_core::domain::PostContent {
    fn from(model: Model) -> Self {
        Self {
            post_id: model.post_id,
            body: model.body,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

/// Conversion from Domain PostContent to SeaORM ActiveModel.
impl From<quill_core::domain::PostContent> for ActiveModel {
    fn from(content: quill_core::domain::PostContent) -> Self {
        Self {
            post_id: Set(content.post_id),
            body: Set(content.body),
            created_at: Set(content.created_at.into()),
            updated_at: Set(content.updated_at.into()),
        }
    }
}

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Always stored lowercase
    #[sea_orm(unique)]
    pub email: String,

    pub name: Option<String>,

    /// Argon2id password hash, absent for accounts linked through OAuth only
    pub password_hash: Option<String>,

    pub oauth_provider: Option<String>,

    pub oauth_subject: Option<String>,

    /// Random API key (64-char hex string), issued after payment
    #[sea_orm(unique)]
    pub api_key: Option<String>,

    /// Payment reference the API key was issued against
    #[sea_orm(unique)]
    pub api_key_reference: Option<String>,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::essays::Entity")]
    Essays,
}

impl Related<super::essays::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Essays.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

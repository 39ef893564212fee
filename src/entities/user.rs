use sea_orm::entity::prelude::*;
use uuid::Uuid;

/// A directory user. Belongs to exactly one realm; rows with a non-NULL
/// `service_account_client_link` are service accounts and are excluded from
/// every search.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub realm_id: String,
    pub username: String,
    pub email: Option<String>,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email_verified: bool,
    pub enabled: bool,
    /// Creation instant as epoch milliseconds.
    pub created_timestamp: i64,
    pub service_account_client_link: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_attribute::Entity")]
    Attributes,

    #[sea_orm(has_many = "super::group_membership::Entity")]
    GroupMemberships,
}

impl Related<super::user_attribute::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Attributes.def()
    }
}

impl Related<super::group_membership::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::GroupMemberships.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

// `DeriveEntityModel` emits `Column` with `#[derive(Copy, Clone, Debug,
// EnumIter, DeriveColumn)]` and no `PartialEq`/`Eq`. Provide them so the
// fieldless enum can be compared by variant, matching derive semantics.
impl PartialEq for Column {
    fn eq(&self, other: &Self) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl Eq for Column {}

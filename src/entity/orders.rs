use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "orders")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub order_id: String,
    pub user_key: String,
    #[sea_orm(unique)]
    pub invoice_id: String,
    pub status: String,
    #[sea_orm(column_type = "JsonBinary")]
    pub shipping_address: Json,
    pub total_amount: i64,
    pub delivered_at: Option<DateTimeWithTimeZone>,
    pub return_invoice_id: Option<String>,
    pub return_reason: Option<String>,
    pub return_video_url: Option<String>,
    #[sea_orm(column_type = "JsonBinary", nullable)]
    pub return_pickup_address: Option<Json>,
    pub return_pickup_contact: Option<String>,
    pub return_requested_at: Option<DateTimeWithTimeZone>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserKey",
        to = "super::users::Column::UserKey"
    )]
    Users,
    #[sea_orm(has_many = "super::order_items::Entity")]
    OrderItems,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl Related<super::order_items::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::OrderItems.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

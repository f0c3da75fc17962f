use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "job_applications")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub application_id: String,
    pub user_key: String,
    pub job_id: String,
    pub applicant_name: String,
    pub primary_email: String,
    pub secondary_email: String,
    pub experience: String,
    pub work_type: String,
    pub qualification: String,
    pub skills: String,
    pub cover_letter: String,
    pub resume_url: String,
    pub status: String,
    pub submitted_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserKey",
        to = "super::users::Column::UserKey"
    )]
    Users,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

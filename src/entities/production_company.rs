use sea_orm::entity::prelude::*;
use serde::Serialize;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize)]
#[sea_orm(table_name = "production_companies")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub slug: String,
    pub name: String,
    pub country: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::title_company::Entity")]
    TitleCompanies,
}

impl Related<super::title_company::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::TitleCompanies.def()
    }
}

impl Related<super::title::Entity> for Entity {
    fn to() -> RelationDef {
        super::title_company::Relation::Title.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::title_company::Relation::Company.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Genres::Table)
                    .if_not_exists()
                    .col(pk_auto(Genres::Id))
                    .col(string_uniq(Genres::Slug))
                    .col(string(Genres::Name))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ProductionCompanies::Table)
                    .if_not_exists()
                    .col(pk_auto(ProductionCompanies::Id))
                    .col(string_uniq(ProductionCompanies::Slug))
                    .col(string(ProductionCompanies::Name))
                    .col(string_null(ProductionCompanies::Country))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Certifications::Table)
                    .if_not_exists()
                    .col(pk_auto(Certifications::Id))
                    .col(string(Certifications::Code))
                    .col(string(Certifications::Country))
                    .col(string_null(Certifications::Description))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_certifications_code_country")
                    .table(Certifications::Table)
                    .col(Certifications::Code)
                    .col(Certifications::Country)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Titles::Table)
                    .if_not_exists()
                    .col(pk_auto(Titles::Id))
                    .col(string_uniq(Titles::Slug))
                    .col(string(Titles::Name))
                    .col(string(Titles::Kind))
                    .col(text_null(Titles::Overview))
                    .col(integer_null(Titles::ReleaseYear))
                    .col(integer_null(Titles::RuntimeMinutes))
                    .col(string_null(Titles::PosterPath))
                    .col(integer_null(Titles::CertificationId))
                    .col(big_integer(Titles::CreatedAt))
                    .col(big_integer(Titles::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_titles_certification")
                            .from(Titles::Table, Titles::CertificationId)
                            .to(Certifications::Table, Certifications::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_titles_release_year")
                    .table(Titles::Table)
                    .col(Titles::ReleaseYear)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(People::Table)
                    .if_not_exists()
                    .col(pk_auto(People::Id))
                    .col(string_uniq(People::Slug))
                    .col(string(People::Name))
                    .col(text_null(People::Biography))
                    .col(string_null(People::BirthDate))
                    .col(string_null(People::PhotoPath))
                    .col(big_integer(People::CreatedAt))
                    .col(big_integer(People::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TitleGenres::Table)
                    .if_not_exists()
                    .col(pk_auto(TitleGenres::Id))
                    .col(integer(TitleGenres::TitleId))
                    .col(integer(TitleGenres::GenreId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_genres_title")
                            .from(TitleGenres::Table, TitleGenres::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_genres_genre")
                            .from(TitleGenres::Table, TitleGenres::GenreId)
                            .to(Genres::Table, Genres::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_genres_unique")
                    .table(TitleGenres::Table)
                    .col(TitleGenres::TitleId)
                    .col(TitleGenres::GenreId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TitleCompanies::Table)
                    .if_not_exists()
                    .col(pk_auto(TitleCompanies::Id))
                    .col(integer(TitleCompanies::TitleId))
                    .col(integer(TitleCompanies::CompanyId))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_companies_title")
                            .from(TitleCompanies::Table, TitleCompanies::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_companies_company")
                            .from(TitleCompanies::Table, TitleCompanies::CompanyId)
                            .to(ProductionCompanies::Table, ProductionCompanies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_companies_unique")
                    .table(TitleCompanies::Table)
                    .col(TitleCompanies::TitleId)
                    .col(TitleCompanies::CompanyId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CastMembers::Table)
                    .if_not_exists()
                    .col(pk_auto(CastMembers::Id))
                    .col(integer(CastMembers::TitleId))
                    .col(integer(CastMembers::PersonId))
                    .col(string(CastMembers::Character))
                    .col(integer(CastMembers::BillingOrder))
                    .col(big_integer(CastMembers::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cast_members_title")
                            .from(CastMembers::Table, CastMembers::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_cast_members_person")
                            .from(CastMembers::Table, CastMembers::PersonId)
                            .to(People::Table, People::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cast_members_title")
                    .table(CastMembers::Table)
                    .col(CastMembers::TitleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cast_members_person")
                    .table(CastMembers::Table)
                    .col(CastMembers::PersonId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(CrewMembers::Table)
                    .if_not_exists()
                    .col(pk_auto(CrewMembers::Id))
                    .col(integer(CrewMembers::TitleId))
                    .col(integer(CrewMembers::PersonId))
                    .col(string(CrewMembers::Job))
                    .col(string_null(CrewMembers::Department))
                    .col(big_integer(CrewMembers::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_crew_members_title")
                            .from(CrewMembers::Table, CrewMembers::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_crew_members_person")
                            .from(CrewMembers::Table, CrewMembers::PersonId)
                            .to(People::Table, People::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crew_members_title")
                    .table(CrewMembers::Table)
                    .col(CrewMembers::TitleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_crew_members_person")
                    .table(CrewMembers::Table)
                    .col(CrewMembers::PersonId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Awards::Table)
                    .if_not_exists()
                    .col(pk_auto(Awards::Id))
                    .col(integer(Awards::TitleId))
                    .col(integer_null(Awards::PersonId))
                    .col(string(Awards::Name))
                    .col(string(Awards::Category))
                    .col(integer(Awards::Year))
                    .col(boolean(Awards::Won))
                    .col(big_integer(Awards::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_awards_title")
                            .from(Awards::Table, Awards::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_awards_person")
                            .from(Awards::Table, Awards::PersonId)
                            .to(People::Table, People::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_awards_title")
                    .table(Awards::Table)
                    .col(Awards::TitleId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            Awards::Table.into_table_ref(),
            CrewMembers::Table.into_table_ref(),
            CastMembers::Table.into_table_ref(),
            TitleCompanies::Table.into_table_ref(),
            TitleGenres::Table.into_table_ref(),
            People::Table.into_table_ref(),
            Titles::Table.into_table_ref(),
            Certifications::Table.into_table_ref(),
            ProductionCompanies::Table.into_table_ref(),
            Genres::Table.into_table_ref(),
        ] {
            manager.drop_table(Table::drop().table(table).to_owned()).await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Genres {
    Table,
    Id,
    Slug,
    Name,
}

#[derive(DeriveIden)]
enum ProductionCompanies {
    Table,
    Id,
    Slug,
    Name,
    Country,
}

#[derive(DeriveIden)]
enum Certifications {
    Table,
    Id,
    Code,
    Country,
    Description,
}

#[derive(DeriveIden)]
enum Titles {
    Table,
    Id,
    Slug,
    Name,
    Kind,
    Overview,
    ReleaseYear,
    RuntimeMinutes,
    PosterPath,
    CertificationId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum People {
    Table,
    Id,
    Slug,
    Name,
    Biography,
    BirthDate,
    PhotoPath,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum TitleGenres {
    Table,
    Id,
    TitleId,
    GenreId,
}

#[derive(DeriveIden)]
enum TitleCompanies {
    Table,
    Id,
    TitleId,
    CompanyId,
}

#[derive(DeriveIden)]
enum CastMembers {
    Table,
    Id,
    TitleId,
    PersonId,
    Character,
    BillingOrder,
    CreatedAt,
}

#[derive(DeriveIden)]
enum CrewMembers {
    Table,
    Id,
    TitleId,
    PersonId,
    Job,
    Department,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Awards {
    Table,
    Id,
    TitleId,
    PersonId,
    Name,
    Category,
    Year,
    Won,
    CreatedAt,
}

use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Reviews::Table)
                    .if_not_exists()
                    .col(pk_auto(Reviews::Id))
                    .col(integer(Reviews::TitleId))
                    .col(integer(Reviews::UserId))
                    .col(string_null(Reviews::Headline))
                    .col(text(Reviews::Body))
                    .col(boolean(Reviews::ContainsSpoilers))
                    .col(big_integer(Reviews::CreatedAt))
                    .col(big_integer(Reviews::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_title")
                            .from(Reviews::Table, Reviews::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_reviews_user")
                            .from(Reviews::Table, Reviews::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_reviews_user_title_unique")
                    .table(Reviews::Table)
                    .col(Reviews::UserId)
                    .col(Reviews::TitleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comments::Table)
                    .if_not_exists()
                    .col(pk_auto(Comments::Id))
                    .col(integer(Comments::ReviewId))
                    .col(integer(Comments::UserId))
                    .col(text(Comments::Body))
                    .col(big_integer(Comments::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_review")
                            .from(Comments::Table, Comments::ReviewId)
                            .to(Reviews::Table, Reviews::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comments_user")
                            .from(Comments::Table, Comments::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_comments_review")
                    .table(Comments::Table)
                    .col(Comments::ReviewId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Ratings::Table)
                    .if_not_exists()
                    .col(pk_auto(Ratings::Id))
                    .col(integer(Ratings::TitleId))
                    .col(integer(Ratings::UserId))
                    .col(small_integer(Ratings::Score))
                    .col(big_integer(Ratings::CreatedAt))
                    .col(big_integer(Ratings::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_title")
                            .from(Ratings::Table, Ratings::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ratings_user")
                            .from(Ratings::Table, Ratings::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ratings_user_title_unique")
                    .table(Ratings::Table)
                    .col(Ratings::UserId)
                    .col(Ratings::TitleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Lists::Table)
                    .if_not_exists()
                    .col(pk_auto(Lists::Id))
                    .col(integer(Lists::UserId))
                    .col(string(Lists::Name))
                    .col(text_null(Lists::Description))
                    .col(boolean(Lists::IsPublic))
                    .col(big_integer(Lists::CreatedAt))
                    .col(big_integer(Lists::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_lists_user")
                            .from(Lists::Table, Lists::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(ListItems::Table)
                    .if_not_exists()
                    .col(pk_auto(ListItems::Id))
                    .col(integer(ListItems::ListId))
                    .col(integer(ListItems::TitleId))
                    .col(integer(ListItems::Position))
                    .col(big_integer(ListItems::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_list_items_list")
                            .from(ListItems::Table, ListItems::ListId)
                            .to(Lists::Table, Lists::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_list_items_title")
                            .from(ListItems::Table, ListItems::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_list_items_unique")
                    .table(ListItems::Table)
                    .col(ListItems::ListId)
                    .col(ListItems::TitleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WatchlistEntries::Table)
                    .if_not_exists()
                    .col(pk_auto(WatchlistEntries::Id))
                    .col(integer(WatchlistEntries::UserId))
                    .col(integer(WatchlistEntries::TitleId))
                    .col(big_integer(WatchlistEntries::AddedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_entries_user")
                            .from(WatchlistEntries::Table, WatchlistEntries::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watchlist_entries_title")
                            .from(WatchlistEntries::Table, WatchlistEntries::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watchlist_entries_unique")
                    .table(WatchlistEntries::Table)
                    .col(WatchlistEntries::UserId)
                    .col(WatchlistEntries::TitleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WatchHistory::Table)
                    .if_not_exists()
                    .col(pk_auto(WatchHistory::Id))
                    .col(integer(WatchHistory::UserId))
                    .col(integer(WatchHistory::TitleId))
                    .col(big_integer(WatchHistory::WatchedAt))
                    .col(big_integer(WatchHistory::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watch_history_user")
                            .from(WatchHistory::Table, WatchHistory::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_watch_history_title")
                            .from(WatchHistory::Table, WatchHistory::TitleId)
                            .to(Titles::Table, Titles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_watch_history_user_watched")
                    .table(WatchHistory::Table)
                    .col(WatchHistory::UserId)
                    .col(WatchHistory::WatchedAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FriendRequests::Table)
                    .if_not_exists()
                    .col(pk_auto(FriendRequests::Id))
                    .col(integer(FriendRequests::RequesterId))
                    .col(integer(FriendRequests::RecipientId))
                    .col(string(FriendRequests::Status))
                    .col(big_integer(FriendRequests::CreatedAt))
                    .col(big_integer_null(FriendRequests::RespondedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_requests_requester")
                            .from(FriendRequests::Table, FriendRequests::RequesterId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_friend_requests_recipient")
                            .from(FriendRequests::Table, FriendRequests::RecipientId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_friend_requests_unique")
                    .table(FriendRequests::Table)
                    .col(FriendRequests::RequesterId)
                    .col(FriendRequests::RecipientId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_friend_requests_recipient")
                    .table(FriendRequests::Table)
                    .col(FriendRequests::RecipientId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            FriendRequests::Table.into_table_ref(),
            WatchHistory::Table.into_table_ref(),
            WatchlistEntries::Table.into_table_ref(),
            ListItems::Table.into_table_ref(),
            Lists::Table.into_table_ref(),
            Ratings::Table.into_table_ref(),
            Comments::Table.into_table_ref(),
            Reviews::Table.into_table_ref(),
        ] {
            manager.drop_table(Table::drop().table(table).to_owned()).await?;
        }
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Users {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Titles {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Reviews {
    Table,
    Id,
    TitleId,
    UserId,
    Headline,
    Body,
    ContainsSpoilers,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Comments {
    Table,
    Id,
    ReviewId,
    UserId,
    Body,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Ratings {
    Table,
    Id,
    TitleId,
    UserId,
    Score,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum Lists {
    Table,
    Id,
    UserId,
    Name,
    Description,
    IsPublic,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum ListItems {
    Table,
    Id,
    ListId,
    TitleId,
    Position,
    CreatedAt,
}

#[derive(DeriveIden)]
enum WatchlistEntries {
    Table,
    Id,
    UserId,
    TitleId,
    AddedAt,
}

#[derive(DeriveIden)]
enum WatchHistory {
    Table,
    Id,
    UserId,
    TitleId,
    WatchedAt,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FriendRequests {
    Table,
    Id,
    RequesterId,
    RecipientId,
    Status,
    CreatedAt,
    RespondedAt,
}

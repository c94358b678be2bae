pub mod award;
pub mod cast_member;
pub mod certification;
pub mod comment;
pub mod crew_member;
pub mod friend_request;
pub mod genre;
pub mod list;
pub mod list_item;
pub mod person;
pub mod production_company;
pub mod rating;
pub mod review;
pub mod session;
pub mod title;
pub mod title_company;
pub mod title_genre;
pub mod user;
pub mod watch_history;
pub mod watchlist_entry;

//! The movie collection: the watchlist page, adding, viewing, editing, rating
//! and marking movies as watched.

mod create;
mod db;
mod detail;
mod domain;
mod edit;
mod list;

pub use create::{create_movie_endpoint, get_add_movie_page};
pub use db::{
    create_movie, create_movie_table, get_movie, get_movies_by_ids, set_movie_last_watched,
    set_movie_rating, update_movie,
};
pub use detail::{get_movie_page, rate_movie_endpoint, watch_movie_endpoint};
pub use domain::{Movie, MovieId, join_string_list, parse_string_list};
pub use edit::{get_edit_movie_page, update_movie_endpoint};
pub use list::get_watchlist_page;

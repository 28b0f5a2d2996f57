//! Database operations for movies.

use rusqlite::{Connection, Row, params, params_from_iter};
use time::OffsetDateTime;

use crate::{
    Error,
    movie::{Movie, MovieId},
};

/// Initialize the movie table.
///
/// The list-valued fields (cast, series, tags) are stored as JSON arrays.
pub fn create_movie_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS movie (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            director TEXT NOT NULL,
            year INTEGER NOT NULL,
            \"cast\" TEXT NOT NULL DEFAULT '[]',
            series TEXT NOT NULL DEFAULT '[]',
            tags TEXT NOT NULL DEFAULT '[]',
            description TEXT NOT NULL DEFAULT '',
            video_link TEXT NOT NULL DEFAULT '',
            rating INTEGER,
            last_watched TEXT
        )",
        (),
    )?;

    Ok(())
}

/// Insert a movie into the shared movie collection.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn create_movie(movie: &Movie, connection: &Connection) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO movie (id, title, director, year, \"cast\", series, tags, description, \
         video_link, rating, last_watched) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            movie.id.as_str(),
            movie.title,
            movie.director,
            movie.year,
            encode_string_list(&movie.cast)?,
            encode_string_list(&movie.series)?,
            encode_string_list(&movie.tags)?,
            movie.description,
            movie.video_link,
            movie.rating,
            movie.last_watched,
        ],
    )?;

    Ok(())
}

/// Retrieve a single movie by ID.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub fn get_movie(movie_id: &MovieId, connection: &Connection) -> Result<Movie, Error> {
    connection
        .prepare(
            "SELECT id, title, director, year, \"cast\", series, tags, description, video_link, \
             rating, last_watched FROM movie WHERE id = :id",
        )?
        .query_row(&[(":id", movie_id.as_str())], map_movie_row)
        .map_err(|error| error.into())
}

/// Retrieve every movie whose ID is a member of `movie_ids`.
///
/// This is a membership lookup: the result order follows the store, not
/// `movie_ids`, and IDs with no matching movie are silently skipped (a
/// watchlist may hold dangling IDs).
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_movies_by_ids(
    movie_ids: &[MovieId],
    connection: &Connection,
) -> Result<Vec<Movie>, Error> {
    if movie_ids.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = vec!["?"; movie_ids.len()].join(", ");
    let query = format!(
        "SELECT id, title, director, year, \"cast\", series, tags, description, video_link, \
         rating, last_watched FROM movie WHERE id IN ({placeholders})"
    );

    connection
        .prepare(&query)?
        .query_map(
            params_from_iter(movie_ids.iter().map(|id| id.as_str())),
            map_movie_row,
        )?
        .map(|maybe_movie| maybe_movie.map_err(|error| error.into()))
        .collect()
}

/// Replace the stored movie's entire field set with `movie`'s fields, keyed by
/// the movie's own ID.
///
/// This is a full overwrite, not a partial patch: every column including
/// `rating` and `last_watched` is written from the in-memory object, so the
/// caller should load the current row first and mutate only the fields it
/// means to change.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub fn update_movie(movie: &Movie, connection: &Connection) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE movie SET title = ?2, director = ?3, year = ?4, \"cast\" = ?5, series = ?6, \
         tags = ?7, description = ?8, video_link = ?9, rating = ?10, last_watched = ?11 \
         WHERE id = ?1",
        params![
            movie.id.as_str(),
            movie.title,
            movie.director,
            movie.year,
            encode_string_list(&movie.cast)?,
            encode_string_list(&movie.series)?,
            encode_string_list(&movie.tags)?,
            movie.description,
            movie.video_link,
            movie.rating,
            movie.last_watched,
        ],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Set a movie's rating via a partial update, leaving all other fields untouched.
///
/// No rating range is enforced.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub fn set_movie_rating(
    movie_id: &MovieId,
    rating: i64,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE movie SET rating = ?2 WHERE id = ?1",
        params![movie_id.as_str(), rating],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

/// Set when a movie was last watched via a partial update, leaving all other
/// fields untouched.
///
/// # Errors
///
/// Returns [Error::NotFound] if no movie has the given ID.
pub fn set_movie_last_watched(
    movie_id: &MovieId,
    last_watched: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE movie SET last_watched = ?2 WHERE id = ?1",
        params![movie_id.as_str(), last_watched],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn encode_string_list(items: &[String]) -> Result<String, Error> {
    serde_json::to_string(items).map_err(|error| Error::JSONSerializationError(error.to_string()))
}

fn decode_string_list(raw: &str) -> Vec<String> {
    serde_json::from_str(raw).unwrap_or_default()
}

fn map_movie_row(row: &Row) -> Result<Movie, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let raw_cast: String = row.get(4)?;
    let raw_series: String = row.get(5)?;
    let raw_tags: String = row.get(6)?;

    Ok(Movie {
        id: MovieId::new(&raw_id),
        title: row.get(1)?,
        director: row.get(2)?,
        year: row.get(3)?,
        cast: decode_string_list(&raw_cast),
        series: decode_string_list(&raw_series),
        tags: decode_string_list(&raw_tags),
        description: row.get(7)?,
        video_link: row.get(8)?,
        rating: row.get(9)?,
        last_watched: row.get(10)?,
    })
}

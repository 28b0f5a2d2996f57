//! Code for creating the user and watchlist tables and fetching users from
//! the database.
//!
//! A user's watchlist is the ordered, append-only list of movie IDs stored in
//! the `watchlist` table. Movies are shared records: two users may both have
//! the same movie ID in their watchlists.

use std::fmt::Display;

use email_address::EmailAddress;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, movie::MovieId, password::PasswordHash};

/// A newtype wrapper for user IDs.
///
/// User IDs are opaque 128-bit hex tokens generated at registration. The
/// newtype helps disambiguate user IDs from other string IDs such as
/// [MovieId], leading to better compile time errors.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Generate a new, random user ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing ID string.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// View the user ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A user of the application.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserId,
    /// The user's email address, used to log in.
    pub email: EmailAddress,
    /// The user's password hash.
    pub password_hash: PasswordHash,
}

/// Create the user table.
///
/// Email is deliberately not UNIQUE: registration performs no duplicate-email
/// check, and log-in takes the first matching row.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id TEXT PRIMARY KEY,
                email TEXT NOT NULL,
                password TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Create the watchlist table.
///
/// The integer primary key preserves insertion order, which gives the
/// append-only push semantics of a user's movie list.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_watchlist_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS watchlist (
            id INTEGER PRIMARY KEY,
            user_id TEXT NOT NULL,
            movie_id TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_watchlist_user_id ON watchlist(user_id);",
    )?;

    Ok(())
}

/// Create and insert a new user with an empty watchlist into the database.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn create_user(
    email: EmailAddress,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<User, Error> {
    let id = UserId::generate();

    connection.execute(
        "INSERT INTO user (id, email, password) VALUES (?1, ?2, ?3)",
        (id.as_str(), email.as_str(), password_hash.as_ref()),
    )?;

    Ok(User {
        id,
        email,
        password_hash,
    })
}

/// Get the first user from the database whose email equals `email`.
///
/// # Errors
///
/// This function will return an error if:
/// - `email` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_email(email: &str, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE email = :email LIMIT 1")?
        .query_row(&[(":email", email)], map_user_row)
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user.
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: &UserId, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare("SELECT id, email, password FROM user WHERE id = :id")?
        .query_row(&[(":id", user_id.as_str())], map_user_row)
        .map_err(|error| error.into())
}

fn map_user_row(row: &rusqlite::Row) -> Result<User, rusqlite::Error> {
    let raw_id: String = row.get(0)?;
    let raw_email: String = row.get(1)?;
    let raw_password_hash: String = row.get(2)?;

    Ok(User {
        id: UserId::new(&raw_id),
        email: EmailAddress::new_unchecked(raw_email),
        password_hash: PasswordHash::new_unchecked(&raw_password_hash),
    })
}

/// Append a movie ID to the end of a user's watchlist.
///
/// The insert is not checked against the movie table, so a dangling movie ID
/// is possible. It is also a separate write from the movie insert it usually
/// follows, with no transaction around the pair.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn append_movie_to_watchlist(
    user_id: &UserId,
    movie_id: &MovieId,
    connection: &Connection,
) -> Result<(), Error> {
    connection.execute(
        "INSERT INTO watchlist (user_id, movie_id) VALUES (?1, ?2)",
        (user_id.as_str(), movie_id.as_str()),
    )?;

    Ok(())
}

/// Get the movie IDs in a user's watchlist, in insertion order.
///
/// # Errors
///
/// Returns a [Error::SqlError] if an SQL related error occurred.
pub fn get_watchlist_ids(user_id: &UserId, connection: &Connection) -> Result<Vec<MovieId>, Error> {
    connection
        .prepare("SELECT movie_id FROM watchlist WHERE user_id = :user_id ORDER BY id ASC")?
        .query_map(&[(":user_id", user_id.as_str())], |row| {
            let raw_id: String = row.get(0)?;

            Ok(MovieId::new(&raw_id))
        })?
        .map(|maybe_id| maybe_id.map_err(|error| error.into()))
        .collect()
}

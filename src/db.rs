//! Functions for initializing the application database.

use rusqlite::Connection;

use crate::{
    Error,
    movie::create_movie_table,
    user::{create_user_table, create_watchlist_table},
};

/// Create the tables for the application's domain models.
///
/// This function is idempotent: tables that already exist are left as-is.
///
/// # Errors
///
/// Returns an [Error::SqlError] if an SQL related error occurred.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    create_user_table(connection)?;
    create_watchlist_table(connection)?;
    create_movie_table(connection)?;

    Ok(())
}

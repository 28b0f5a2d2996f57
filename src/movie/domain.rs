//! Core movie domain types.

use std::fmt::Display;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::Error;

/// The year of the first recorded film, and so the earliest valid release year.
pub const MIN_RELEASE_YEAR: i64 = 1878;

/// A newtype wrapper for movie IDs.
///
/// Movie IDs are opaque 128-bit hex tokens generated when a movie is added.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovieId(String);

impl MovieId {
    /// Generate a new, random movie ID.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Wrap an existing ID string.
    pub fn new(id: &str) -> Self {
        Self(id.to_string())
    }

    /// View the movie ID as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for MovieId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// A movie in the shared movie collection.
///
/// Movies are not owned by a single user: any number of users may hold the
/// same movie ID in their watchlists, and any logged-in user may edit any
/// movie. The extended fields (`cast`, `series`, `tags`, `description`,
/// `video_link`) start out empty and are only populated through the edit page.
#[derive(Debug, Clone, PartialEq)]
pub struct Movie {
    /// The movie's ID in the application database.
    pub id: MovieId,
    /// The movie's title.
    pub title: String,
    /// The movie's director.
    pub director: String,
    /// The release year, no earlier than [MIN_RELEASE_YEAR].
    pub year: i64,
    /// The names of cast members.
    pub cast: Vec<String>,
    /// The series the movie belongs to (e.g., sequels, trilogies).
    pub series: Vec<String>,
    /// Free-form tags.
    pub tags: Vec<String>,
    /// A free text description.
    pub description: String,
    /// A link to a video, e.g. a trailer.
    pub video_link: String,
    /// The user-assigned rating. No range is enforced.
    pub rating: Option<i64>,
    /// When the movie was last watched.
    pub last_watched: Option<OffsetDateTime>,
}

impl Movie {
    /// Create a new movie with a fresh ID and the basic fields populated.
    ///
    /// # Errors
    ///
    /// Returns:
    /// - [Error::EmptyMovieTitle] if `title` is empty or whitespace.
    /// - [Error::EmptyDirectorName] if `director` is empty or whitespace.
    /// - [Error::InvalidReleaseYear] if `year` is before [MIN_RELEASE_YEAR].
    pub fn new(title: &str, director: &str, year: i64) -> Result<Self, Error> {
        let title = title.trim();
        let director = director.trim();

        if title.is_empty() {
            return Err(Error::EmptyMovieTitle);
        }

        if director.is_empty() {
            return Err(Error::EmptyDirectorName);
        }

        if year < MIN_RELEASE_YEAR {
            return Err(Error::InvalidReleaseYear(year));
        }

        Ok(Self {
            id: MovieId::generate(),
            title: title.to_string(),
            director: director.to_string(),
            year,
            cast: Vec::new(),
            series: Vec::new(),
            tags: Vec::new(),
            description: String::new(),
            video_link: String::new(),
            rating: None,
            last_watched: None,
        })
    }
}

/// Split a multi-line text input into one trimmed element per line.
///
/// An input that is empty (or only whitespace) yields an empty list.
pub fn parse_string_list(text: &str) -> Vec<String> {
    if text.trim().is_empty() {
        return Vec::new();
    }

    text.lines().map(|line| line.trim().to_string()).collect()
}

/// Join a string list back into the multi-line form it was entered as.
pub fn join_string_list(items: &[String]) -> String {
    items.join("\n")
}

/// Form data for adding a movie with the basic fields.
///
/// The year is taken as a string so that a non-numeric value can be reported
/// as a field error instead of a form deserialization failure.
#[derive(Debug, Serialize, Deserialize)]
pub struct MovieFormData {
    /// The movie's title.
    pub title: String,
    /// The movie's director.
    pub director: String,
    /// The release year as entered.
    pub year: String,
}

/// Form data for the extended edit-movie form.
#[derive(Debug, Serialize, Deserialize)]
pub struct ExtendedMovieFormData {
    /// The movie's title.
    pub title: String,
    /// The movie's director.
    pub director: String,
    /// The release year as entered.
    pub year: String,
    /// Cast members, one per line.
    pub cast: String,
    /// Series entries, one per line.
    pub series: String,
    /// Tags, one per line.
    pub tags: String,
    /// A free text description.
    pub description: String,
    /// A link to a video, e.g. a trailer.
    pub video_link: String,
}

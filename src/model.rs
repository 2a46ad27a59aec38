use crate::storage::schema;
use chrono::{Datelike, NaiveDateTime, Timelike};
use diesel::prelude::*;

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::songs)]
pub struct SongRecord {
    pub song_id: String,
    pub title: String,
    pub artist_id: String,
    pub year: i32,
    pub duration: f64,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::artists)]
pub struct ArtistRecord {
    pub artist_id: String,
    pub name: String,
    pub location: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Insertable)]
#[diesel(table_name = schema::time)]
pub struct TimeRecord {
    pub start_time: NaiveDateTime,
    pub hour: i32,
    pub day: i32,
    pub week: i32,
    pub month: i32,
    pub year: i32,
    pub weekday: i32,
}

impl TimeRecord {
    /// Break an instant into its calendar components. `week` is the ISO week number
    /// and `weekday` counts from Monday = 0.
    pub fn from_start_time(start_time: NaiveDateTime) -> TimeRecord {
        TimeRecord {
            start_time,
            hour: start_time.hour() as i32,
            day: start_time.day() as i32,
            week: start_time.iso_week().week() as i32,
            month: start_time.month() as i32,
            year: start_time.year(),
            weekday: start_time.weekday().num_days_from_monday() as i32,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Insertable)]
#[diesel(table_name = schema::users)]
pub struct UserRecord {
    pub user_id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub gender: Option<String>,
    pub level: String,
}

#[derive(Debug, Clone, PartialEq, Insertable)]
#[diesel(table_name = schema::songplays)]
pub struct SongplayRecord {
    pub start_time: NaiveDateTime,
    pub user_id: String,
    pub level: String,
    pub song_id: Option<String>,
    pub artist_id: Option<String>,
    pub session_id: i32,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

/// Case-folded key used to resolve a play against the song and artist dimensions.
#[derive(Debug, Clone, PartialEq)]
pub struct SongKey {
    pub title: String,
    pub artist_name: String,
    pub duration: f64,
}

impl SongKey {
    pub fn new(title: &str, artist_name: &str, duration: f64) -> SongKey {
        SongKey {
            title: title.to_lowercase(),
            artist_name: artist_name.to_lowercase(),
            duration,
        }
    }
}

/// Dimension ids found for a [`SongKey`].
#[derive(Debug, Clone, PartialEq, Eq, Queryable)]
pub struct SongMatch {
    pub song_id: String,
    pub artist_id: String,
}

/// Row counts written for one file or accumulated over a batch.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RowCounts {
    pub songs: usize,
    pub artists: usize,
    pub times: usize,
    pub users: usize,
    pub songplays: usize,
    /// Songplays whose song and artist ids were resolved.
    pub matched_songplays: usize,
}

impl RowCounts {
    pub fn total(&self) -> usize {
        self.songs + self.artists + self.times + self.users + self.songplays
    }
}

impl std::ops::AddAssign for RowCounts {
    fn add_assign(&mut self, other: RowCounts) {
        self.songs += other.songs;
        self.artists += other.artists;
        self.times += other.times;
        self.users += other.users;
        self.songplays += other.songplays;
        self.matched_songplays += other.matched_songplays;
    }
}

use crate::error::Error;
use crate::gateway::{Gateway, SongLookup};
use crate::model::{RowCounts, SongKey, SongMatch, SongplayRecord, TimeRecord, UserRecord};
use chrono::{DateTime, NaiveDateTime};
use serde::{Deserialize, Deserializer};
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use tracing::debug;

const NEXT_SONG_PAGE: &str = "NextSong";

/// One line of an activity log.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogEvent {
    #[serde(default, deserialize_with = "deserialize_user_id")]
    user_id: Option<String>,
    first_name: Option<String>,
    last_name: Option<String>,
    gender: Option<String>,
    level: String,
    page: String,
    ts: i64,
    song: Option<String>,
    artist: Option<String>,
    length: Option<f64>,
    session_id: i32,
    location: Option<String>,
    user_agent: Option<String>,
}

/// `userId` shows up as a string ("" for logged-out events) or as a bare integer.
fn deserialize_user_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawUserId {
        Text(String),
        Number(i64),
    }

    Ok(
        Option::<RawUserId>::deserialize(deserializer)?.map(|raw| match raw {
            RawUserId::Text(text) => text,
            RawUserId::Number(number) => number.to_string(),
        }),
    )
}

impl LogEvent {
    fn has_user(&self) -> bool {
        self.user_id.as_deref().is_some_and(|id| !id.is_empty())
    }

    fn user(&self) -> UserRecord {
        UserRecord {
            user_id: self.user_id.clone().unwrap_or_default(),
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            gender: self.gender.clone(),
            level: self.level.clone(),
        }
    }
}

/// A playback event waiting for its song and artist ids.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayEvent {
    pub start_time: NaiveDateTime,
    pub user_id: String,
    pub level: String,
    pub song: Option<String>,
    pub artist: Option<String>,
    pub length: Option<f64>,
    pub session_id: i32,
    pub location: Option<String>,
    pub user_agent: Option<String>,
}

impl PlayEvent {
    /// Lookup key for the play, or `None` when title, artist or length is missing.
    pub fn song_key(&self) -> Option<SongKey> {
        match (&self.song, &self.artist, self.length) {
            (Some(song), Some(artist), Some(length)) => Some(SongKey::new(song, artist, length)),
            _ => None,
        }
    }

    pub fn into_songplay(self, song_match: Option<SongMatch>) -> SongplayRecord {
        let (song_id, artist_id) = match song_match {
            Some(found) => (Some(found.song_id), Some(found.artist_id)),
            None => (None, None),
        };
        SongplayRecord {
            start_time: self.start_time,
            user_id: self.user_id,
            level: self.level,
            song_id,
            artist_id,
            session_id: self.session_id,
            location: self.location,
            user_agent: self.user_agent,
        }
    }
}

/// Everything derived from one log file before any lookup happens.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LogFileRows {
    /// One row per NextSong event, duplicates included.
    pub times: Vec<TimeRecord>,
    /// Distinct user rows from every event with a user, NextSong or not.
    pub users: Vec<UserRecord>,
    /// NextSong events in file order.
    pub plays: Vec<PlayEvent>,
}

pub fn read_log_file(path: &Path) -> Result<LogFileRows, Error> {
    let contents = fs::read(path)?;

    let mut events = Vec::new();
    for (index, line) in super::lines(&contents) {
        if super::is_blank(line) {
            continue;
        }
        let event: LogEvent = serde_json::from_slice(line).map_err(|source| Error::Parse {
            path: path.to_path_buf(),
            line: index + 1,
            source,
        })?;
        events.push((index + 1, event));
    }

    events.retain(|(_, event)| event.has_user());

    let users = distinct_users(events.iter().map(|(_, event)| event.user()));

    let mut times = Vec::new();
    let mut plays = Vec::new();
    for (line, event) in events {
        if event.page != NEXT_SONG_PAGE {
            continue;
        }
        let start_time = DateTime::from_timestamp_millis(event.ts)
            .map(|dt| dt.naive_utc())
            .ok_or_else(|| Error::Timestamp {
                path: path.to_path_buf(),
                line,
                ts: event.ts,
            })?;

        times.push(TimeRecord::from_start_time(start_time));
        plays.push(PlayEvent {
            start_time,
            user_id: event.user_id.unwrap_or_default(),
            level: event.level,
            song: event.song,
            artist: event.artist,
            length: event.length,
            session_id: event.session_id,
            location: event.location,
            user_agent: event.user_agent,
        });
    }

    Ok(LogFileRows {
        times,
        users,
        plays,
    })
}

/// Drop repeated rows, keeping the first occurrence of each.
fn distinct_users(users: impl Iterator<Item = UserRecord>) -> Vec<UserRecord> {
    let mut seen = HashSet::new();
    users.filter(|user| seen.insert(user.clone())).collect()
}

/// Attach song and artist ids to a play when its key matches exactly one song.
pub fn resolve_songplay<L>(lookup: &mut L, play: PlayEvent) -> Result<SongplayRecord, Error>
where
    L: SongLookup + ?Sized,
{
    let song_match = match play.song_key() {
        Some(key) => lookup.find_song(&key)?,
        None => None,
    };
    Ok(play.into_songplay(song_match))
}

/// Insert time rows, then user rows, then songplays for one log file.
pub fn process_log_file(gateway: &mut dyn Gateway, path: &Path) -> Result<RowCounts, Error> {
    let rows = read_log_file(path)?;
    let mut counts = RowCounts::default();

    for time in &rows.times {
        gateway.insert_time(time)?;
        counts.times += 1;
    }

    for user in &rows.users {
        gateway.insert_user(user)?;
        counts.users += 1;
    }

    for play in rows.plays {
        let songplay = resolve_songplay(&mut *gateway, play)?;
        if songplay.song_id.is_some() {
            counts.matched_songplays += 1;
        }
        gateway.insert_songplay(&songplay)?;
        counts.songplays += 1;
    }

    debug!(
        "Loaded {} time rows, {} users, {} songplays ({} matched) from {}",
        counts.times,
        counts.users,
        counts.songplays,
        counts.matched_songplays,
        path.display()
    );

    Ok(counts)
}

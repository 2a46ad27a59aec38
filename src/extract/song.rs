use crate::error::Error;
use crate::gateway::Gateway;
use crate::model::{ArtistRecord, RowCounts, SongRecord};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::debug;

/// One line of a song metadata file. Fields not listed here (e.g. `num_songs`) are
/// ignored.
#[derive(Debug, Deserialize)]
struct SongFileRecord {
    song_id: String,
    title: String,
    artist_id: String,
    year: i32,
    duration: f64,
    artist_name: String,
    artist_location: Option<String>,
    artist_latitude: Option<f64>,
    artist_longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SongFileRows {
    pub song: SongRecord,
    pub artist: ArtistRecord,
}

impl From<SongFileRecord> for SongFileRows {
    fn from(record: SongFileRecord) -> Self {
        SongFileRows {
            song: SongRecord {
                song_id: record.song_id,
                title: record.title,
                artist_id: record.artist_id.clone(),
                year: record.year,
                duration: record.duration,
            },
            artist: ArtistRecord {
                artist_id: record.artist_id,
                name: record.artist_name,
                location: record.artist_location,
                latitude: record.artist_latitude,
                longitude: record.artist_longitude,
            },
        }
    }
}

/// Parse the single record of a song file into its song and artist rows.
pub fn read_song_file(path: &Path) -> Result<SongFileRows, Error> {
    let contents = fs::read(path)?;

    let (index, line) = super::lines(&contents)
        .find(|(_, line)| !super::is_blank(line))
        .ok_or_else(|| Error::EmptyFile {
            path: path.to_path_buf(),
        })?;

    let record: SongFileRecord = serde_json::from_slice(line).map_err(|source| Error::Parse {
        path: path.to_path_buf(),
        line: index + 1,
        source,
    })?;

    Ok(record.into())
}

/// Insert the song, then the artist, of one song file.
pub fn process_song_file(gateway: &mut dyn Gateway, path: &Path) -> Result<RowCounts, Error> {
    let rows = read_song_file(path)?;

    gateway.insert_song(&rows.song)?;
    gateway.insert_artist(&rows.artist)?;
    debug!(
        "Loaded song {} by artist {} from {}",
        rows.song.song_id,
        rows.artist.artist_id,
        path.display()
    );

    Ok(RowCounts {
        songs: 1,
        artists: 1,
        ..RowCounts::default()
    })
}

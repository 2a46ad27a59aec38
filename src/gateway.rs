use crate::error::Error;
use crate::model::{
    ArtistRecord, SongKey, SongMatch, SongRecord, SongplayRecord, TimeRecord, UserRecord,
};

/// Resolves a play's (title, artist name, duration) against the loaded song and artist
/// dimensions.
pub trait SongLookup {
    /// Returns the ids of the single matching song. Zero or several matches both
    /// yield `None`.
    fn find_song(&mut self, key: &SongKey) -> Result<Option<SongMatch>, Error>;
}

/// Session against the star-schema store. Extractors write through this and the batch
/// driver owns the transaction boundaries.
pub trait Gateway: SongLookup {
    fn insert_song(&mut self, song: &SongRecord) -> Result<(), Error>;
    fn insert_artist(&mut self, artist: &ArtistRecord) -> Result<(), Error>;
    fn insert_time(&mut self, time: &TimeRecord) -> Result<(), Error>;
    fn insert_user(&mut self, user: &UserRecord) -> Result<(), Error>;
    fn insert_songplay(&mut self, songplay: &SongplayRecord) -> Result<(), Error>;

    fn begin(&mut self) -> Result<(), Error>;
    fn commit(&mut self) -> Result<(), Error>;
    fn rollback(&mut self) -> Result<(), Error>;
}

use crate::error::Error;
use crate::gateway::{Gateway, SongLookup};
use crate::model::{
    ArtistRecord, SongKey, SongMatch, SongRecord, SongplayRecord, TimeRecord, UserRecord,
};
use tracing::debug;

/// Statements issued against a [`MemoryStore`], in the order they arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Statement {
    InsertSong,
    InsertArtist,
    InsertTime,
    InsertUser,
    InsertSongplay,
    SelectSong,
    Begin,
    Commit,
    Rollback,
}

#[derive(Debug, Default, Clone)]
pub struct Tables {
    pub songs: Vec<SongRecord>,
    pub artists: Vec<ArtistRecord>,
    pub times: Vec<TimeRecord>,
    pub users: Vec<UserRecord>,
    pub songplays: Vec<SongplayRecord>,
}

impl Tables {
    fn has_song(&self, song_id: &str) -> bool {
        self.songs.iter().any(|s| s.song_id == song_id)
    }

    fn has_artist(&self, artist_id: &str) -> bool {
        self.artists.iter().any(|a| a.artist_id == artist_id)
    }

    fn has_time(&self, time: &TimeRecord) -> bool {
        self.times.iter().any(|t| t.start_time == time.start_time)
    }

    fn insert_song(&mut self, song: &SongRecord) {
        if !self.has_song(&song.song_id) {
            self.songs.push(song.clone());
        }
    }

    fn insert_artist(&mut self, artist: &ArtistRecord) {
        if !self.has_artist(&artist.artist_id) {
            self.artists.push(artist.clone());
        }
    }

    fn insert_time(&mut self, time: &TimeRecord) {
        if !self.has_time(time) {
            self.times.push(time.clone());
        }
    }

    fn insert_user(&mut self, user: &UserRecord) {
        match self.users.iter_mut().find(|u| u.user_id == user.user_id) {
            Some(existing) => existing.level = user.level.clone(),
            None => self.users.push(user.clone()),
        }
    }

    fn merge(&mut self, other: Tables) {
        other.songs.iter().for_each(|s| self.insert_song(s));
        other.artists.iter().for_each(|a| self.insert_artist(a));
        other.times.iter().for_each(|t| self.insert_time(t));
        other.users.iter().for_each(|u| self.insert_user(u));
        self.songplays.extend(other.songplays);
    }
}

/// In-memory gateway with the same conflict rules as the PostgreSQL schema: songs,
/// artists and time rows keep the first insert per key, users take the latest level,
/// songplays append.
///
/// Writes made between `begin` and `commit` stay pending and are discarded by
/// `rollback`. Outside a transaction every write is committed immediately. Lookups see
/// pending and committed rows alike, as a database session sees its own writes.
#[derive(Debug, Default)]
pub struct MemoryStore {
    committed: Tables,
    pending: Tables,
    in_transaction: bool,
    statements: Vec<Statement>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed committed dimension rows, e.g. songs loaded by an earlier run.
    pub fn with_song(mut self, song: SongRecord, artist: ArtistRecord) -> Self {
        self.committed.insert_song(&song);
        self.committed.insert_artist(&artist);
        self
    }

    pub fn committed(&self) -> &Tables {
        &self.committed
    }

    pub fn pending(&self) -> &Tables {
        &self.pending
    }

    pub fn statements(&self) -> &[Statement] {
        &self.statements
    }

    pub fn count(&self, statement: Statement) -> usize {
        self.statements.iter().filter(|s| **s == statement).count()
    }

    fn target(&mut self) -> &mut Tables {
        if self.in_transaction {
            &mut self.pending
        } else {
            &mut self.committed
        }
    }
}

impl SongLookup for MemoryStore {
    fn find_song(&mut self, key: &SongKey) -> Result<Option<SongMatch>, Error> {
        self.statements.push(Statement::SelectSong);

        let artists: Vec<&ArtistRecord> = self
            .committed
            .artists
            .iter()
            .chain(self.pending.artists.iter())
            .collect();

        let mut matches = self
            .committed
            .songs
            .iter()
            .chain(self.pending.songs.iter())
            .filter(|song| {
                song.title.to_lowercase() == key.title && song.duration == key.duration
            })
            .filter_map(|song| {
                artists
                    .iter()
                    .find(|artist| {
                        artist.artist_id == song.artist_id
                            && artist.name.to_lowercase() == key.artist_name
                    })
                    .map(|artist| SongMatch {
                        song_id: song.song_id.clone(),
                        artist_id: artist.artist_id.clone(),
                    })
            })
            .take(2)
            .collect::<Vec<_>>();

        if matches.len() == 1 {
            Ok(matches.pop())
        } else {
            Ok(None)
        }
    }
}

impl Gateway for MemoryStore {
    fn insert_song(&mut self, song: &SongRecord) -> Result<(), Error> {
        self.statements.push(Statement::InsertSong);
        if !self.committed.has_song(&song.song_id) {
            self.target().insert_song(song);
        }
        Ok(())
    }

    fn insert_artist(&mut self, artist: &ArtistRecord) -> Result<(), Error> {
        self.statements.push(Statement::InsertArtist);
        if !self.committed.has_artist(&artist.artist_id) {
            self.target().insert_artist(artist);
        }
        Ok(())
    }

    fn insert_time(&mut self, time: &TimeRecord) -> Result<(), Error> {
        self.statements.push(Statement::InsertTime);
        if !self.committed.has_time(time) {
            self.target().insert_time(time);
        }
        Ok(())
    }

    fn insert_user(&mut self, user: &UserRecord) -> Result<(), Error> {
        self.statements.push(Statement::InsertUser);
        self.target().insert_user(user);
        Ok(())
    }

    fn insert_songplay(&mut self, songplay: &SongplayRecord) -> Result<(), Error> {
        self.statements.push(Statement::InsertSongplay);
        self.target().songplays.push(songplay.clone());
        Ok(())
    }

    fn begin(&mut self) -> Result<(), Error> {
        self.statements.push(Statement::Begin);
        self.in_transaction = true;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Error> {
        self.statements.push(Statement::Commit);
        let pending = std::mem::take(&mut self.pending);
        self.committed.merge(pending);
        self.in_transaction = false;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Error> {
        self.statements.push(Statement::Rollback);
        let discarded = std::mem::take(&mut self.pending);
        debug!(
            "Rolled back {} songplays, {} users, {} time rows",
            discarded.songplays.len(),
            discarded.users.len(),
            discarded.times.len()
        );
        self.in_transaction = false;
        Ok(())
    }
}

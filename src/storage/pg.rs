use super::schema::{artists, songplays, songs, time, users};
use crate::error::Error;
use crate::gateway::{Gateway, SongLookup};
use crate::model::{
    ArtistRecord, SongKey, SongMatch, SongRecord, SongplayRecord, TimeRecord, UserRecord,
};
use diesel::connection::{AnsiTransactionManager, TransactionManager};
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::sql_types::Text;
use diesel::upsert::excluded;
use diesel_migrations::{embed_migrations, EmbeddedMigrations, MigrationHarness};
use tracing::debug;

pub const MIGRATIONS: EmbeddedMigrations = embed_migrations!("migrations");

diesel::define_sql_function!(fn lower(x: Text) -> Text);

/// PostgreSQL-backed gateway holding the single connection used for a run.
pub struct PgStore {
    conn: PgConnection,
}

impl PgStore {
    pub fn connect(database_url: &str) -> Result<PgStore, Error> {
        let conn = PgConnection::establish(database_url)?;
        debug!("Connected to PostgreSQL");
        Ok(PgStore { conn })
    }

    /// Create the star schema if it is not there yet. Returns the number of migrations
    /// applied.
    pub fn run_migrations(&mut self) -> Result<usize, Error> {
        let applied = self
            .conn
            .run_pending_migrations(MIGRATIONS)
            .map_err(|err| Error::Migration(err.to_string()))?;
        debug!("{} migrations applied", applied.len());
        Ok(applied.len())
    }

    /// Drop every star-schema table and recreate them empty.
    pub fn reset(&mut self) -> Result<usize, Error> {
        let reverted = self
            .conn
            .revert_all_migrations(MIGRATIONS)
            .map_err(|err| Error::Migration(err.to_string()))?;
        debug!("{} migrations reverted", reverted.len());
        self.run_migrations()
    }
}

impl SongLookup for PgStore {
    fn find_song(&mut self, key: &SongKey) -> Result<Option<SongMatch>, Error> {
        let mut matches = songs::table
            .inner_join(artists::table.on(artists::artist_id.eq(songs::artist_id)))
            .filter(lower(songs::title).eq(&key.title))
            .filter(lower(artists::name).eq(&key.artist_name))
            .filter(songs::duration.eq(key.duration))
            .select((songs::song_id, artists::artist_id))
            .limit(2)
            .load::<SongMatch>(&mut self.conn)?;

        if matches.len() == 1 {
            Ok(matches.pop())
        } else {
            Ok(None)
        }
    }
}

impl Gateway for PgStore {
    fn insert_song(&mut self, song: &SongRecord) -> Result<(), Error> {
        diesel::insert_into(songs::table)
            .values(song)
            .on_conflict(songs::song_id)
            .do_nothing()
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn insert_artist(&mut self, artist: &ArtistRecord) -> Result<(), Error> {
        diesel::insert_into(artists::table)
            .values(artist)
            .on_conflict(artists::artist_id)
            .do_nothing()
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn insert_time(&mut self, record: &TimeRecord) -> Result<(), Error> {
        diesel::insert_into(time::table)
            .values(record)
            .on_conflict(time::start_time)
            .do_nothing()
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn insert_user(&mut self, user: &UserRecord) -> Result<(), Error> {
        diesel::insert_into(users::table)
            .values(user)
            .on_conflict(users::user_id)
            .do_update()
            .set(users::level.eq(excluded(users::level)))
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn insert_songplay(&mut self, songplay: &SongplayRecord) -> Result<(), Error> {
        diesel::insert_into(songplays::table)
            .values(songplay)
            .execute(&mut self.conn)?;
        Ok(())
    }

    fn begin(&mut self) -> Result<(), Error> {
        <AnsiTransactionManager as TransactionManager<PgConnection>>::begin_transaction(
            &mut self.conn,
        )?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), Error> {
        <AnsiTransactionManager as TransactionManager<PgConnection>>::commit_transaction(
            &mut self.conn,
        )?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), Error> {
        <AnsiTransactionManager as TransactionManager<PgConnection>>::rollback_transaction(
            &mut self.conn,
        )?;
        Ok(())
    }
}

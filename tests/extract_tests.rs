use serde_json::{json, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

use sparkify_etl::extract::events::{process_log_file, read_log_file};
use sparkify_etl::extract::song::{process_song_file, read_song_file};
use sparkify_etl::model::{ArtistRecord, SongRecord};
use sparkify_etl::storage::memory::Statement;
use sparkify_etl::storage::MemoryStore;
use sparkify_etl::{Error, ErrorKind};

const SONG_LINE: &str = r#"{"num_songs": 1, "artist_id": "ARD7TVE1187B99BFB1", "artist_latitude": null, "artist_longitude": null, "artist_location": "California - LA", "artist_name": "Casual", "song_id": "SOMZWCG12A8C13C480", "title": "I Didn't Mean To", "duration": 218.93179, "year": 0}"#;

fn write_file(dir: &Path, name: &str, contents: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, contents).unwrap();
    path
}

fn event(user_id: Value, page: &str, ts: i64, level: &str) -> Value {
    json!({
        "artist": null,
        "auth": "Logged In",
        "firstName": "Walter",
        "gender": "M",
        "itemInSession": 0,
        "lastName": "Frye",
        "length": null,
        "level": level,
        "location": "San Francisco-Oakland-Hayward, CA",
        "method": "GET",
        "page": page,
        "registration": 1540919166796.0,
        "sessionId": 38,
        "song": null,
        "status": 200,
        "ts": ts,
        "userAgent": "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_9_4)",
        "userId": user_id,
    })
}

fn play(
    user_id: &str,
    ts: i64,
    song: Option<&str>,
    artist: Option<&str>,
    length: Option<f64>,
) -> Value {
    let mut value = event(json!(user_id), "NextSong", ts, "free");
    value["song"] = json!(song);
    value["artist"] = json!(artist);
    value["length"] = json!(length);
    value
}

fn write_log(dir: &Path, events: &[Value]) -> PathBuf {
    let contents: Vec<String> = events.iter().map(|e| e.to_string()).collect();
    write_file(dir, "2018-11-01-events.json", &(contents.join("\n") + "\n"))
}

fn seeded_store() -> MemoryStore {
    MemoryStore::new().with_song(
        SongRecord {
            song_id: "SOAAAAA12A8C13C480".to_string(),
            title: "song a".to_string(),
            artist_id: "ARAAAAA1187B99BFB1".to_string(),
            year: 2004,
            duration: 210.5,
        },
        ArtistRecord {
            artist_id: "ARAAAAA1187B99BFB1".to_string(),
            name: "artist a".to_string(),
            location: None,
            latitude: None,
            longitude: None,
        },
    )
}

// ── Song files ───────────────────────────────────────────────

#[test]
fn test_song_file_projection() {
    let tmp = tempdir().unwrap();
    let path = write_file(tmp.path(), "TRAAAAW128F429D538.json", SONG_LINE);

    let rows = read_song_file(&path).unwrap();
    assert_eq!(rows.song.song_id, "SOMZWCG12A8C13C480");
    assert_eq!(rows.song.title, "I Didn't Mean To");
    assert_eq!(rows.song.artist_id, "ARD7TVE1187B99BFB1");
    assert_eq!(rows.song.year, 0);
    assert_eq!(rows.song.duration, 218.93179);
    assert_eq!(rows.artist.artist_id, "ARD7TVE1187B99BFB1");
    assert_eq!(rows.artist.name, "Casual");
    assert_eq!(rows.artist.location.as_deref(), Some("California - LA"));
    assert_eq!(rows.artist.latitude, None);
    assert_eq!(rows.artist.longitude, None);
}

#[test]
fn test_song_extraction_is_repeatable() {
    let tmp = tempdir().unwrap();
    let path = write_file(tmp.path(), "song.json", &format!("{}\n", SONG_LINE));

    let first = read_song_file(&path).unwrap();
    let second = read_song_file(&path).unwrap();
    assert_eq!(first, second);
}

#[test]
fn test_song_file_inserts_song_then_artist() {
    let tmp = tempdir().unwrap();
    let path = write_file(tmp.path(), "song.json", SONG_LINE);

    let mut store = MemoryStore::new();
    let counts = process_song_file(&mut store, &path).unwrap();
    assert_eq!(counts.songs, 1);
    assert_eq!(counts.artists, 1);
    assert_eq!(
        store.statements(),
        &[Statement::InsertSong, Statement::InsertArtist]
    );
    assert_eq!(store.committed().songs.len(), 1);
    assert_eq!(store.committed().artists.len(), 1);
}

#[test]
fn test_song_file_missing_required_field() {
    let tmp = tempdir().unwrap();
    let path = write_file(
        tmp.path(),
        "song.json",
        r#"{"artist_id": "AR1", "artist_name": "Casual", "title": "x", "duration": 1.0, "year": 0}"#,
    );

    let err = read_song_file(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
    assert!(matches!(err, Error::Parse { line: 1, .. }));
}

#[test]
fn test_song_file_mistyped_field() {
    let tmp = tempdir().unwrap();
    let path = write_file(
        tmp.path(),
        "song.json",
        &SONG_LINE.replace(r#""year": 0"#, r#""year": "nineteen""#),
    );

    let err = read_song_file(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_song_file_must_be_single_line() {
    let tmp = tempdir().unwrap();
    let pretty = serde_json::to_string_pretty(
        &serde_json::from_str::<Value>(SONG_LINE).unwrap(),
    )
    .unwrap();
    let path = write_file(tmp.path(), "song.json", &pretty);

    let err = read_song_file(&path).unwrap_err();
    assert!(matches!(err, Error::Parse { .. }));
}

#[test]
fn test_empty_song_file() {
    let tmp = tempdir().unwrap();
    let path = write_file(tmp.path(), "song.json", "\n  \n");

    let err = read_song_file(&path).unwrap_err();
    assert!(matches!(err, Error::EmptyFile { .. }));
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_song_file_with_invalid_utf8_is_a_parse_error() {
    let tmp = tempdir().unwrap();
    let path = tmp.path().join("song.json");
    fs::write(&path, [0xff, 0xfe, b'{', b'}']).unwrap();

    let err = read_song_file(&path).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 1, .. }));
    assert_eq!(err.kind(), ErrorKind::Parse);
}

// ── Log files ────────────────────────────────────────────────

#[test]
fn test_empty_user_id_produces_nothing() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[
            event(json!(""), "NextSong", 1541105830796, "free"),
            event(json!(""), "Home", 1541105830797, "free"),
        ],
    );

    let rows = read_log_file(&path).unwrap();
    assert!(rows.times.is_empty());
    assert!(rows.users.is_empty());
    assert!(rows.plays.is_empty());
}

#[test]
fn test_non_next_song_only_contributes_users() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[
            event(json!("39"), "Home", 1541105830796, "free"),
            event(json!("8"), "Settings", 1541106106796, "free"),
        ],
    );

    let rows = read_log_file(&path).unwrap();
    assert!(rows.times.is_empty());
    assert!(rows.plays.is_empty());
    let ids: Vec<&str> = rows.users.iter().map(|u| u.user_id.as_str()).collect();
    assert_eq!(ids, vec!["39", "8"]);
}

#[test]
fn test_level_change_yields_two_users() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[
            event(json!("15"), "NextSong", 1541105830796, "free"),
            event(json!("15"), "NextSong", 1541106106796, "free"),
            event(json!("15"), "NextSong", 1541106352796, "paid"),
        ],
    );

    let rows = read_log_file(&path).unwrap();
    assert_eq!(rows.users.len(), 2);
    assert_eq!(rows.users[0].level, "free");
    assert_eq!(rows.users[1].level, "paid");
    assert_eq!(rows.plays.len(), 3);
}

#[test]
fn test_time_rows_are_not_deduplicated() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[
            event(json!("15"), "NextSong", 1541105830796, "free"),
            event(json!("26"), "NextSong", 1541105830796, "free"),
        ],
    );

    let rows = read_log_file(&path).unwrap();
    assert_eq!(rows.times.len(), 2);
    assert_eq!(rows.times[0], rows.times[1]);
    assert_eq!(rows.times[0].year, 2018);
    assert_eq!(rows.times[0].month, 11);
    assert_eq!(rows.times[0].day, 1);
    assert_eq!(rows.times[0].hour, 20);
}

#[test]
fn test_numeric_user_id_is_accepted() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[event(json!(91), "NextSong", 1541105830796, "free")],
    );

    let rows = read_log_file(&path).unwrap();
    assert_eq!(rows.users[0].user_id, "91");
    assert_eq!(rows.plays[0].user_id, "91");
}

#[test]
fn test_missing_optional_fields_become_null() {
    let tmp = tempdir().unwrap();
    let path = write_file(
        tmp.path(),
        "events.json",
        r#"{"userId":"10","level":"free","page":"NextSong","ts":1541105830796,"sessionId":9,"song":"Intro","artist":"The xx","length":128.1}"#,
    );

    let rows = read_log_file(&path).unwrap();
    let play = &rows.plays[0];
    assert_eq!(play.location, None);
    assert_eq!(play.user_agent, None);
    assert_eq!(rows.users[0].first_name, None);
    assert_eq!(rows.users[0].gender, None);
}

#[test]
fn test_malformed_line_reports_line_number() {
    let tmp = tempdir().unwrap();
    let good = event(json!("39"), "NextSong", 1541105830796, "free").to_string();
    let path = write_file(
        tmp.path(),
        "events.json",
        &format!("{}\n\n{{\"userId\": \"39\", \"page\": \n", good),
    );

    let err = read_log_file(&path).unwrap_err();
    match err {
        Error::Parse { line, path: err_path, .. } => {
            assert_eq!(line, 3);
            assert_eq!(err_path, path);
        }
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_log_file_with_invalid_utf8_is_a_parse_error() {
    let tmp = tempdir().unwrap();
    let good = event(json!("39"), "NextSong", 1541105830796, "free").to_string();
    let mut contents = format!("{}\n", good).into_bytes();
    contents.extend_from_slice(br#"{"userId": "39", "firstName": "Wal"#);
    contents.extend_from_slice(&[0xc3, 0x28]);
    contents.extend_from_slice(b"\"}\n");
    let path = tmp.path().join("events.json");
    fs::write(&path, contents).unwrap();

    let err = read_log_file(&path).unwrap_err();
    assert!(matches!(err, Error::Parse { line: 2, .. }));
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_crlf_log_lines_are_accepted() {
    let tmp = tempdir().unwrap();
    let first = event(json!("39"), "NextSong", 1541105830796, "free").to_string();
    let second = event(json!("8"), "Home", 1541106106796, "free").to_string();
    let path = write_file(
        tmp.path(),
        "events.json",
        &format!("{}\r\n{}\r\n", first, second),
    );

    let rows = read_log_file(&path).unwrap();
    assert_eq!(rows.plays.len(), 1);
    assert_eq!(rows.users.len(), 2);
}

#[test]
fn test_missing_required_log_field() {
    let tmp = tempdir().unwrap();
    let path = write_file(
        tmp.path(),
        "events.json",
        r#"{"userId":"10","level":"free","page":"NextSong","sessionId":9}"#,
    );

    let err = read_log_file(&path).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Parse);
}

#[test]
fn test_songplay_resolves_case_insensitive_match() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[play("26", 1541105830796, Some("Song A"), Some("Artist A"), Some(210.5))],
    );

    let mut store = seeded_store();
    let counts = process_log_file(&mut store, &path).unwrap();
    assert_eq!(counts.songplays, 1);
    assert_eq!(counts.matched_songplays, 1);

    let songplay = &store.committed().songplays[0];
    assert_eq!(songplay.song_id.as_deref(), Some("SOAAAAA12A8C13C480"));
    assert_eq!(songplay.artist_id.as_deref(), Some("ARAAAAA1187B99BFB1"));
    assert_eq!(songplay.user_id, "26");
    assert_eq!(songplay.session_id, 38);
}

#[test]
fn test_songplay_duration_must_match_exactly() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[play("26", 1541105830796, Some("Song A"), Some("Artist A"), Some(210.50001))],
    );

    let mut store = seeded_store();
    process_log_file(&mut store, &path).unwrap();

    let songplay = &store.committed().songplays[0];
    assert_eq!(songplay.song_id, None);
    assert_eq!(songplay.artist_id, None);
}

#[test]
fn test_null_song_skips_lookup() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[play("26", 1541105830796, None, Some("Artist A"), Some(210.5))],
    );

    let mut store = seeded_store();
    process_log_file(&mut store, &path).unwrap();

    let songplay = &store.committed().songplays[0];
    assert_eq!(songplay.song_id, None);
    assert_eq!(songplay.artist_id, None);
    assert_eq!(store.count(Statement::SelectSong), 0);
}

#[test]
fn test_ambiguous_match_resolves_to_null() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[play("26", 1541105830796, Some("Song A"), Some("Artist A"), Some(210.5))],
    );

    let mut store = seeded_store().with_song(
        SongRecord {
            song_id: "SOBBBBB12A8C13C480".to_string(),
            title: "SONG A".to_string(),
            artist_id: "ARAAAAA1187B99BFB1".to_string(),
            year: 2010,
            duration: 210.5,
        },
        ArtistRecord {
            artist_id: "ARAAAAA1187B99BFB1".to_string(),
            name: "artist a".to_string(),
            location: None,
            latitude: None,
            longitude: None,
        },
    );
    process_log_file(&mut store, &path).unwrap();

    assert_eq!(store.count(Statement::SelectSong), 1);
    assert_eq!(store.committed().songplays[0].song_id, None);
}

#[test]
fn test_log_statement_order() {
    let tmp = tempdir().unwrap();
    let path = write_log(
        tmp.path(),
        &[
            play("26", 1541105830796, Some("Song A"), Some("Artist A"), Some(210.5)),
            event(json!("26"), "Home", 1541105830900, "free"),
            play("26", 1541106106796, None, None, None),
        ],
    );

    let mut store = seeded_store();
    let counts = process_log_file(&mut store, &path).unwrap();
    assert_eq!(counts.times, 2);
    assert_eq!(counts.users, 1);
    assert_eq!(counts.songplays, 2);
    assert_eq!(counts.matched_songplays, 1);

    assert_eq!(
        store.statements(),
        &[
            Statement::InsertTime,
            Statement::InsertTime,
            Statement::InsertUser,
            Statement::SelectSong,
            Statement::InsertSongplay,
            Statement::InsertSongplay,
        ]
    );
}

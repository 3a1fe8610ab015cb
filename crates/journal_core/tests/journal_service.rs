use chrono::{TimeZone, Utc};
use futures::StreamExt;
use journal_core::db::open_db_in_memory;
use journal_core::{CancellationToken, JournalEntry, JournalService, SqliteEntryRepository};
use std::time::Duration;

fn service() -> JournalService<SqliteEntryRepository> {
    JournalService::new(SqliteEntryRepository::new(open_db_in_memory().unwrap()))
}

fn journal(secs: i64, title: &str) -> JournalEntry {
    let mut entry = JournalEntry::new(title, "body");
    entry.created_at = Utc.timestamp_opt(secs, 0).unwrap();
    entry
}

#[tokio::test]
async fn upsert_maps_emojis_and_sleep_hours_through_storage() {
    let service = service();

    let mut entry = journal(1_000, "rested");
    entry.mood_emojis = vec!["😀".to_string(), "🌞".to_string()];
    entry.sleep_hours = 7.5;
    entry.mood_rating = Some(5);
    entry.toggle_w = true;
    entry.id = service.upsert(&entry).unwrap();

    let stored_csv: String = service
        .repository()
        .db()
        .lock()
        .query_row(
            "SELECT moodEmojisCsv FROM entries WHERE id = ?1;",
            [entry.id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(stored_csv, "😀,🌞");

    let loaded = service
        .get_all_once(CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(loaded, vec![entry]);
}

#[tokio::test]
async fn zero_sleep_hours_are_stored_as_null() {
    let service = service();
    let id = service.upsert(&journal(1, "no sleep data")).unwrap();

    let minutes: Option<i32> = service
        .repository()
        .db()
        .lock()
        .query_row(
            "SELECT sleepMinutes FROM entries WHERE id = ?1;",
            [id],
            |row| row.get(0),
        )
        .unwrap();
    assert_eq!(minutes, None);
}

#[tokio::test]
async fn observe_all_emits_journal_entries_newest_first() {
    let service = service();
    service
        .upsert_all(&[journal(10, "older"), journal(20, "newer")])
        .unwrap();

    let mut stream = service.observe_all();
    let first = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    let titles: Vec<_> = first.iter().map(|entry| entry.title.as_str()).collect();
    assert_eq!(titles, vec!["newer", "older"]);

    let newer_id = first[0].id;
    service.delete_by_id(newer_id).unwrap();
    let second = tokio::time::timeout(Duration::from_secs(2), stream.next())
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].title, "older");
}

#[tokio::test]
async fn clear_all_through_service_empties_journal() {
    let service = service();
    service.upsert(&journal(1, "a")).unwrap();
    service.upsert(&journal(2, "b")).unwrap();

    service.clear_all().unwrap();

    assert!(service
        .get_all_once(CancellationToken::new())
        .await
        .unwrap()
        .is_empty());
}

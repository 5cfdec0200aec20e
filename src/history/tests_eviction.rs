use super::*;
use crate::swatch::Color;
use tempfile::TempDir;

fn mem_service(capacity: u32) -> HistoryService {
    HistoryService::open_in_memory(&HistoryConfig {
        capacity,
        enabled: true,
    })
    .expect("open service")
}

fn themes(count: usize, swatches: &[u32]) -> Vec<ThemeRecord> {
    (0..count)
        .map(|i| ThemeRecord {
            title: format!("theme {i}"),
            author: "kuler".to_owned(),
            edited_at: "Apr 9, 2013".to_owned(),
            rating: i.to_string(),
            swatches: swatches.iter().copied().map(Color::new).collect(),
        })
        .collect()
}

fn assert_index_matches_store(history: &HistoryService) {
    let mut ids = history.list_ids();
    ids.sort();
    assert_eq!(ids, history.store().request_tables().expect("tables"));
}

#[test]
fn three_saves_with_capacity_two_evict_the_first() {
    let mut history = mem_service(2);
    assert_eq!(
        history.save("catA", &themes(2, &[1, 2])).expect("save A"),
        SaveOutcome::Inserted
    );
    assert_eq!(
        history.save("catB", &themes(1, &[3])).expect("save B"),
        SaveOutcome::Inserted
    );
    let outcome = history
        .save("catC", &themes(3, &[4, 5, 6, 7]))
        .expect("save C");

    assert_eq!(outcome, SaveOutcome::Evicted("catA".to_string()));
    assert_eq!(history.list_ids(), vec!["catB", "catC"]);
    assert!(!history.store().table_exists("catA").expect("exists"));

    let loaded = history.load("catC").expect("load");
    assert_eq!(loaded.len(), 3);
    assert!(loaded.iter().all(|t| t.swatches.used_count() == 4));
    assert_index_matches_store(&history);
}

#[test]
fn fifo_keeps_the_newest_n() {
    let n = 4;
    let mut history = mem_service(n);
    let ids: Vec<String> = (1..=n + 1).map(|i| format!("r{i}")).collect();
    for id in &ids {
        history.save(id, &themes(1, &[9])).expect("save");
    }
    assert_eq!(history.list_ids(), ids[1..]);
    assert!(!history.store().table_exists("r1").expect("exists"));
    assert_index_matches_store(&history);
}

#[test]
fn size_never_exceeds_capacity() {
    let capacity = 3;
    let mut history = mem_service(capacity);
    for i in 0..12 {
        history.save(&format!("q{i}"), &themes(i % 3, &[])).expect("save");
        assert!(history.list_ids().len() <= capacity as usize);
        assert_index_matches_store(&history);
    }
}

#[test]
fn capacity_zero_evicts_every_save_immediately() {
    let mut history = mem_service(0);
    let outcome = history.save("gone", &themes(2, &[1])).expect("save");
    assert_eq!(outcome, SaveOutcome::Evicted("gone".to_string()));
    assert!(history.list_ids().is_empty());
    assert!(history.store().request_tables().expect("tables").is_empty());
    assert!(history.store().catalog().expect("catalog").is_empty());
}

#[test]
fn raising_capacity_stops_eviction() {
    let mut history = mem_service(1);
    history.save("a", &[]).expect("save");
    history.set_capacity(3);
    assert_eq!(history.capacity(), 3);
    assert_eq!(history.save("b", &[]).expect("save"), SaveOutcome::Inserted);
    assert_eq!(history.save("c", &[]).expect("save"), SaveOutcome::Inserted);
    assert_eq!(
        history.save("d", &[]).expect("save"),
        SaveOutcome::Evicted("a".to_string())
    );
}

#[test]
fn evicted_identifier_can_be_saved_again() {
    let mut history = mem_service(1);
    history.save("x", &themes(1, &[1])).expect("save x");
    history.save("y", &[]).expect("save y");
    history.save("x", &themes(2, &[2])).expect("save x again");
    assert_eq!(history.list_ids(), vec!["x"]);
    assert_eq!(history.load("x").expect("load").len(), 2);
}

#[test]
fn leaked_eviction_is_reported_and_not_retracked() {
    let mut history = mem_service(1);
    history.save("old", &[]).expect("save old");

    // Drop the table behind the service's back so the eviction drop fails.
    history.store.drop_table("old").expect("external drop");

    let err = history.save("new", &[]).expect_err("leak");
    match err {
        HistoryError::EvictionLeak { evicted, .. } => assert_eq!(evicted, "old"),
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(history.list_ids(), vec!["new"]);
    assert!(history.store().table_exists("new").expect("exists"));
}

#[test]
fn reopen_after_leak_drops_table_and_does_not_retrack() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history.db");
    {
        let mut history = HistoryService::open(
            &path,
            &HistoryConfig {
                capacity: 3,
                enabled: true,
            },
        )
        .expect("open");
        history.save("old", &themes(2, &[1])).expect("save old");
        history.save("keep", &themes(1, &[2])).expect("save keep");
    }
    {
        // An eviction that flagged "old" but whose drop never committed.
        let store = HistoryStore::open(&path).expect("open store");
        store.mark_evicted("old").expect("mark");
    }

    let history = HistoryService::open(
        &path,
        &HistoryConfig {
            capacity: 3,
            enabled: true,
        },
    )
    .expect("reopen");
    assert_eq!(history.list_ids(), vec!["keep"]);
    assert!(!history.store().table_exists("old").expect("exists"));
    assert!(history.store().leaked().expect("leaked").is_empty());
    assert_index_matches_store(&history);
}

#[test]
fn leak_flag_without_table_is_cleared_on_reopen() {
    let dir = TempDir::new().expect("tempdir");
    let path = dir.path().join("history.db");
    {
        let mut store = HistoryStore::open(&path).expect("open store");
        store
            .create_and_insert("gone", DateTime::from_timestamp(1, 0).expect("ts"), &[])
            .expect("insert");
        store.mark_evicted("gone").expect("mark");
        let conn = rusqlite::Connection::open(&path).expect("raw open");
        conn.execute_batch(&format!("DROP TABLE theme_{};", hex::encode("gone")))
            .expect("drop table");
    }

    let history = HistoryService::open(&path, &HistoryConfig::default()).expect("reopen");
    assert!(history.list_ids().is_empty());
    assert!(history.store().leaked().expect("leaked").is_empty());
}

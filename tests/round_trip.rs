use std::sync::Arc;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use taskdeck::io::documents::UserId;
use taskdeck::io::fs_store::FsStore;
use taskdeck::io::sync::RemoteSync;
use taskdeck::model::taxonomy::EntryKind;
use taskdeck::model::view::SortKind;
use taskdeck::ops::board::Board;

fn sync_for(root: &std::path::Path, user: &str) -> RemoteSync {
    RemoteSync::new(
        Arc::new(FsStore::new(root)),
        Some(UserId::new(user).unwrap()),
    )
}

fn date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Mutate a board, flush, then bootstrap a second board from the same
/// directory and compare every slice.
#[tokio::test]
async fn board_survives_a_restart() {
    let tmp = tempfile::TempDir::new().unwrap();

    let mut board = Board::bootstrap(sync_for(tmp.path(), "ada")).await;
    board
        .add_task("Pay rent", "Finance", "Not Started", date("2024-04-01"))
        .unwrap();
    board
        .add_task("Run 5k", "Health", "Low Progress", date("2024-03-01"))
        .unwrap();
    board
        .add_task("Read", "Education", "Completed", date("2024-02-01"))
        .unwrap();
    board.delete_task(3);
    board
        .add_taxonomy_entry("Errands", EntryKind::Category, None)
        .unwrap();
    board
        .add_taxonomy_entry("Blocked", EntryKind::Progress, Some("#123456"))
        .unwrap();
    board
        .reorder_taxonomy_entry("Completed", EntryKind::Progress, true)
        .unwrap();
    board
        .edit_taxonomy_entry("Health", "Fitness", EntryKind::Category, None)
        .unwrap();
    board.filter_tasks(
        vec!["Finance".into(), "Fitness".into()],
        vec!["Not Started".into(), "Low Progress".into()],
    );
    board.sort_tasks_by(SortKind::Progress, false);
    board.sync().flush().await;

    let restored = Board::bootstrap(sync_for(tmp.path(), "ada")).await;
    assert_eq!(restored.tasks(), board.tasks());
    assert_eq!(restored.categories(), board.categories());
    assert_eq!(restored.progress(), board.progress());
    assert_eq!(restored.selection(), board.selection());
    assert_eq!(restored.sort(), board.sort());
    assert_eq!(restored.view(), board.view());
    assert_eq!(restored.next_id(), 3);
}

#[tokio::test]
async fn users_do_not_share_boards() {
    let tmp = tempfile::TempDir::new().unwrap();

    let mut ada = Board::bootstrap(sync_for(tmp.path(), "ada")).await;
    ada.add_task("Pay rent", "Finance", "Not Started", None)
        .unwrap();
    ada.sync().flush().await;

    let bob = Board::bootstrap(sync_for(tmp.path(), "bob")).await;
    assert!(bob.tasks().is_empty());
    assert_eq!(bob.next_id(), 1);
}

#[tokio::test]
async fn hand_edited_documents_are_tolerated() {
    let tmp = tempfile::TempDir::new().unwrap();
    let user_dir = tmp.path().join("users/ada");
    std::fs::create_dir_all(user_dir.join("taskList")).unwrap();
    std::fs::create_dir_all(user_dir.join("categories")).unwrap();
    std::fs::create_dir_all(user_dir.join("sort")).unwrap();

    std::fs::write(
        user_dir.join("taskList/7.json"),
        r#"{"name":"Old","category":"Work","progress":"Completed","dateDue":"2023-12-31T22:00:00.000-05:00","id":7}"#,
    )
    .unwrap();
    std::fs::write(user_dir.join("taskList/8.json"), "{ not json").unwrap();
    std::fs::write(
        user_dir.join("categories/categoriesSortedList.json"),
        r#"{"categoryList":[{"key":"Home","value":"ignored"},{"key":"Home","value":"Home"},{"key":"Work","value":"Work"}]}"#,
    )
    .unwrap();
    std::fs::write(user_dir.join("sort/sortType.json"), r#"{"sort":"filter"}"#).unwrap();
    std::fs::write(
        user_dir.join("sort/ascendingType.json"),
        r#"{"ascending":true}"#,
    )
    .unwrap();

    let board = Board::bootstrap(sync_for(tmp.path(), "ada")).await;
    let ids: Vec<u64> = board.tasks().iter().map(|t| t.id).collect();
    assert_eq!(ids, vec![7]);
    assert_eq!(board.tasks()[0].due, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
    assert_eq!(board.categories().keys().collect::<Vec<_>>(), vec!["Home", "Work"]);
    assert_eq!(board.categories().lookup("Home"), Some("Home"));
    assert_eq!(board.sort().kind, SortKind::Category);
    assert_eq!(board.next_id(), 8);
}

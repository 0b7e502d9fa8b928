use std::sync::Arc;

use parley_persist::{
    InMemoryPersistenceClient, MessageRole, PersistError, ThreadDirectory, DEFAULT_THREAD_TITLE,
};

fn directory() -> ThreadDirectory {
    ThreadDirectory::new(Arc::new(InMemoryPersistenceClient::new()))
}

#[tokio::test]
async fn test_create_thread_uses_placeholder_for_blank_hint() {
    let dir = directory();

    let untitled = dir.create_thread(None).await.unwrap();
    let blank = dir.create_thread(Some("   ")).await.unwrap();
    let named = dir.create_thread(Some("  Trip plans ")).await.unwrap();

    assert_eq!(untitled.title, DEFAULT_THREAD_TITLE);
    assert_eq!(blank.title, DEFAULT_THREAD_TITLE);
    assert_eq!(named.title, "Trip plans");
    assert!(!untitled.archived);
    assert_ne!(untitled.id, blank.id);
}

#[tokio::test]
async fn test_rename_trims_and_rejects_blank() {
    let dir = directory();
    let thread = dir.create_thread(None).await.unwrap();

    let renamed = dir.rename_thread(&thread.id, "  Weekend  ").await.unwrap();
    assert_eq!(renamed.title, "Weekend");

    let err = dir.rename_thread(&thread.id, " \n ").await.unwrap_err();
    assert!(matches!(err, PersistError::Validation(_)));
    assert_eq!(dir.get_thread(&thread.id).await.unwrap().title, "Weekend");

    let err = dir.rename_thread("missing", "x").await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_archive_hides_thread_but_keeps_messages() {
    let dir = directory();
    let thread = dir.create_thread(None).await.unwrap();
    dir.append_message(&thread.id, MessageRole::User, "Hello").await.unwrap();

    dir.archive_thread(&thread.id).await.unwrap();

    let visible = dir.list_recent(50, false).await.unwrap();
    assert!(visible.iter().all(|l| l.id != thread.id));

    let all = dir.list_recent(50, true).await.unwrap();
    let listing = all.iter().find(|l| l.id == thread.id).unwrap();
    assert!(listing.archived);

    let messages = dir.list_messages(&thread.id, None).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "Hello");
}

#[tokio::test]
async fn test_append_then_list_preserves_order() {
    let dir = directory();
    let thread = dir.create_thread(None).await.unwrap();

    dir.append_message(&thread.id, MessageRole::User, "Hello").await.unwrap();
    dir.append_message(&thread.id, MessageRole::Assistant, "Hi there!").await.unwrap();

    let messages = dir.list_messages(&thread.id, None).await.unwrap();
    let pairs: Vec<_> = messages.iter().map(|m| (m.role, m.content.as_str())).collect();
    assert_eq!(
        pairs,
        vec![(MessageRole::User, "Hello"), (MessageRole::Assistant, "Hi there!")]
    );
}

#[tokio::test]
async fn test_listing_orders_by_activity_and_summarizes() {
    let dir = directory();
    let older = dir.create_thread(Some("older")).await.unwrap();
    let newer = dir.create_thread(Some("newer")).await.unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    dir.append_message(&older.id, MessageRole::User, "bump\nthis one").await.unwrap();

    let listings = dir.list_recent(50, false).await.unwrap();
    assert_eq!(listings[0].id, older.id);
    assert!(listings[0].has_messages);
    assert_eq!(listings[0].summary.as_deref(), Some("bump this one"));

    let empty = listings.iter().find(|l| l.id == newer.id).unwrap();
    assert!(!empty.has_messages);
    assert!(empty.summary.is_none());

    assert_eq!(dir.list_recent(1, false).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_freshness_requires_single_user_message() {
    let dir = directory();
    let thread = dir.create_thread(None).await.unwrap();
    assert!(!dir.is_fresh(&thread.id).await.unwrap());

    dir.append_message(&thread.id, MessageRole::User, "one").await.unwrap();
    assert!(dir.is_fresh(&thread.id).await.unwrap());

    dir.append_message(&thread.id, MessageRole::User, "two").await.unwrap();
    assert!(!dir.is_fresh(&thread.id).await.unwrap());

    let seeded = dir.create_thread(None).await.unwrap();
    dir.append_message(&seeded.id, MessageRole::Assistant, "welcome").await.unwrap();
    assert!(!dir.is_fresh(&seeded.id).await.unwrap());
}

#[tokio::test]
async fn test_delete_purges_thread_and_messages() {
    let dir = directory();
    let thread = dir.create_thread(None).await.unwrap();
    dir.append_message(&thread.id, MessageRole::User, "x").await.unwrap();

    assert!(dir.delete_thread(&thread.id).await.unwrap());
    assert!(dir.get_thread(&thread.id).await.unwrap_err().is_not_found());
    assert!(dir.list_messages(&thread.id, None).await.is_err());
    assert!(!dir.delete_thread(&thread.id).await.unwrap());
}

#[tokio::test]
async fn test_concurrent_appends_to_different_threads() {
    let dir = directory();
    let a = dir.create_thread(None).await.unwrap();
    let b = dir.create_thread(None).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..20 {
        let dir = dir.clone();
        let id = if i % 2 == 0 { a.id.clone() } else { b.id.clone() };
        tasks.push(tokio::spawn(async move {
            dir.append_message(&id, MessageRole::User, format!("m{}", i)).await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let a_msgs = dir.list_messages(&a.id, None).await.unwrap();
    let b_msgs = dir.list_messages(&b.id, None).await.unwrap();
    assert_eq!(a_msgs.len(), 10);
    assert_eq!(b_msgs.len(), 10);
    let seqs: Vec<u64> = a_msgs.iter().map(|m| m.seq).collect();
    assert_eq!(seqs, (0..10).collect::<Vec<u64>>());
}

#[tokio::test]
async fn test_zero_limit_returns_nothing() {
    let dir = directory();
    let thread = dir.create_thread(None).await.unwrap();
    dir.append_message(&thread.id, MessageRole::User, "Hello").await.unwrap();

    assert!(dir.list_messages(&thread.id, Some(0)).await.unwrap().is_empty());
    assert!(dir.list_recent(0, true).await.unwrap().is_empty());
}

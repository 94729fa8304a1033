mod mock_backend;

use bankops::core::knowledge::{
    FileUpload, KnowledgeBaseService, MAX_FILE_SIZE, UpdateKnowledgeRequest,
};
use bankops::core::store::{KnowledgeBaseStore, Reconcile};
use mock_backend::{MockBackend, TestResult, start_or_skip};

fn store(mock: &MockBackend, reconcile: Reconcile) -> KnowledgeBaseStore {
    KnowledgeBaseStore::new(KnowledgeBaseService::new(mock.client()), reconcile)
}

#[tokio::test]
async fn text_entries_round_through_the_store() -> TestResult<()> {
    let Some(mock) = start_or_skip("text_entries_round_through_the_store").await? else {
        return Ok(());
    };
    let mut kb = store(&mock, Reconcile::Local);
    kb.fetch_items().await?;
    assert!(kb.items().is_empty());

    let item = kb
        .add_text_knowledge("Card limits", "# Daily limits\n\nATM: 20m VND")
        .await?;
    assert!(!item.is_file());
    assert_eq!(kb.items().len(), 1);
    assert_eq!(mock.item_list_hits(), 1);

    let patch = UpdateKnowledgeRequest {
        title: Some("Card limits 2025".to_string()),
        description: None,
    };
    let updated = kb.update_knowledge_item(&item.id, &patch).await?;
    assert_eq!(updated.title, "Card limits 2025");
    assert_eq!(
        kb.item(&item.id).map(|i| i.description.as_str()),
        Some("# Daily limits\n\nATM: 20m VND")
    );

    let content = KnowledgeBaseService::new(mock.client())
        .content(&item.id)
        .await?;
    assert!(content.starts_with("# Daily limits"));

    kb.delete_knowledge_item(&item.id).await?;
    assert!(kb.items().is_empty());
    assert_eq!(mock.item_list_hits(), 1);

    mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn file_upload_reports_progress_to_completion() -> TestResult<()> {
    let Some(mock) = start_or_skip("file_upload_reports_progress_to_completion").await? else {
        return Ok(());
    };
    let mut kb = store(&mock, Reconcile::Local);
    let rx = kb.subscribe_progress();

    // Large enough to span several body chunks.
    let body = vec![b'x'; 300 * 1024];
    let upload = FileUpload::new("policy.pdf", "application/pdf", body);
    let item = kb
        .upload_file_knowledge(&upload, "Lending policy", "Q3 revision")
        .await?;

    assert!(item.is_file());
    assert_eq!(item.metadata.size, Some(300 * 1024));
    assert_eq!(kb.upload_progress(), 100);
    assert!(!kb.is_uploading());
    let last = *rx.borrow();
    assert!(last.done);
    assert_eq!(last.sent, last.total);

    let uploads = mock.uploads();
    assert_eq!(uploads.len(), 1);
    assert_eq!(uploads[0].title, "Lending policy");
    assert_eq!(uploads[0].file_name, "policy.pdf");
    assert_eq!(uploads[0].mime_type, "application/pdf");
    assert_eq!(uploads[0].size, 300 * 1024);

    mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn oversized_upload_never_reaches_the_server() -> TestResult<()> {
    let Some(mock) = start_or_skip("oversized_upload_never_reaches_the_server").await? else {
        return Ok(());
    };
    let mut kb = store(&mock, Reconcile::Local);
    let upload = FileUpload::new(
        "dump.csv",
        "text/csv",
        vec![0u8; (MAX_FILE_SIZE + 1) as usize],
    );

    let err = kb.upload_file_knowledge(&upload, "", "").await.unwrap_err();
    assert!(err.is_validation());
    assert!(kb.error().unwrap_or_default().contains("10 MB"));
    assert!(mock.uploads().is_empty());

    mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn refetch_mode_reloads_items() -> TestResult<()> {
    let Some(mock) = start_or_skip("refetch_mode_reloads_items").await? else {
        return Ok(());
    };
    let mut kb = store(&mock, Reconcile::Refetch);
    let item = kb.add_text_knowledge("FAQ", "Opening hours").await?;
    assert_eq!(mock.item_list_hits(), 1);
    assert_eq!(kb.items().len(), 1);

    kb.delete_knowledge_item(&item.id).await?;
    assert_eq!(mock.item_list_hits(), 2);
    assert!(kb.items().is_empty());

    mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn added_item_is_returned_when_the_reload_fails() -> TestResult<()> {
    let Some(mock) = start_or_skip("added_item_is_returned_when_the_reload_fails").await? else {
        return Ok(());
    };
    let mut kb = store(&mock, Reconcile::Refetch);
    mock.set_item_list_failing(true);

    let item = kb.add_text_knowledge("FAQ", "Opening hours").await?;
    assert_eq!(item.title, "FAQ");
    assert!(kb.error().unwrap_or_default().contains("HTTP error! status: 500"));
    assert!(kb.items().is_empty());

    mock.set_item_list_failing(false);
    kb.fetch_items().await?;
    assert!(kb.error().is_none());
    assert_eq!(kb.item(&item.id).map(|i| i.title.as_str()), Some("FAQ"));

    mock.shutdown().await;
    Ok(())
}

#[tokio::test]
async fn wrong_token_is_reported_as_authentication_failure() -> TestResult<()> {
    let Some(mock) = start_or_skip("wrong_token_is_reported_as_authentication_failure").await?
    else {
        return Ok(());
    };
    let mut kb = KnowledgeBaseStore::new(
        KnowledgeBaseService::new(mock.client_with_token("stale")),
        Reconcile::Local,
    );

    let err = kb.fetch_items().await.unwrap_err();
    assert!(err.is_auth());
    assert_eq!(err.status().map(|s| s.as_u16()), Some(401));
    assert!(kb.error().unwrap_or_default().contains("Authentication failed"));
    assert_eq!(mock.item_list_hits(), 0);

    mock.shutdown().await;
    Ok(())
}

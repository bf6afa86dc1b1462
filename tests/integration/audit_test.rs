//! Ledger contents and ordering.

use futures::TryStreamExt;

use docshare_entity::Department;
use docshare_entity::activity::{ActivityAction, ActivityCursor, ActivityFilter, DetailValue};
use docshare_entity::file::{AccessType, Grantee};
use docshare_entity::user::UserRole;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_actor_program_order_is_preserved() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Releases", Department::It, false).await;
    let ctx = app.ctx(owner);

    let file = app.upload(owner, folder.id, "v1.tar.gz", 2048).await;
    app.engine
        .files
        .download(&ctx, folder.id, file.id)
        .await
        .unwrap();
    app.engine
        .files
        .view_file(&ctx, folder.id, file.id)
        .await
        .unwrap();
    app.engine
        .files
        .soft_delete_file(&ctx, folder.id, file.id)
        .await
        .unwrap();

    let entries = app
        .entries(ActivityFilter {
            file_id: Some(file.id),
            ..Default::default()
        })
        .await;
    let actions: Vec<ActivityAction> = entries.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            ActivityAction::Upload,
            ActivityAction::Download,
            ActivityAction::View,
            ActivityAction::Delete,
        ]
    );
    assert!(entries.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
}

#[tokio::test]
async fn test_entries_snapshot_names() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let folder = app.folder(owner, "Old Name", Department::Finance, false).await;
    let file = app.upload(owner, folder.id, "report.pdf", 1).await;

    app.engine
        .folders
        .update_folder(
            &app.ctx(owner),
            folder.id,
            docshare_entity::folder::UpdateFolder {
                name: Some("New Name".into()),
                description: None,
            },
        )
        .await
        .unwrap();
    app.engine
        .files
        .soft_delete_file(&app.ctx(owner), folder.id, file.id)
        .await
        .unwrap();

    let entries = app
        .entries(ActivityFilter {
            file_id: Some(file.id),
            ..Default::default()
        })
        .await;
    assert_eq!(entries[0].folder_name.as_deref(), Some("Old Name"));
    assert_eq!(entries[1].folder_name.as_deref(), Some("New Name"));
    assert_eq!(entries[1].file_name.as_deref(), Some("report.pdf"));
}

#[tokio::test]
async fn test_query_filters_and_resumes_across_pages() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let viewer = app.user(UserRole::Employee, Department::It);
    let folder = app.folder(owner, "Docs", Department::It, false).await;
    let file = app.upload(owner, folder.id, "guide.md", 10).await;

    for _ in 0..9 {
        app.engine
            .files
            .view_file(&app.ctx(viewer), folder.id, file.id)
            .await
            .unwrap();
    }

    let filter = ActivityFilter {
        user_id: Some(viewer),
        action: Some(ActivityAction::View),
        ..Default::default()
    };
    let views = app.entries(filter.clone()).await;
    assert_eq!(views.len(), 9);
    assert!(views.iter().all(|e| e.user_id == viewer));

    let rest: Vec<_> = app
        .engine
        .ledger
        .query_after(filter, Some(ActivityCursor::of(&views[5])))
        .try_collect()
        .await
        .unwrap();
    let expected: Vec<_> = views[6..].iter().map(|e| e.id).collect();
    let got: Vec<_> = rest.iter().map(|e| e.id).collect();
    assert_eq!(got, expected);
}

#[tokio::test]
async fn test_download_via_share_is_flagged() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let partner = app.user(UserRole::Employee, Department::It);
    let folder = app.folder(owner, "Statements", Department::Finance, false).await;
    let file = app.upload(owner, folder.id, "jan.pdf", 5).await;

    app.engine
        .access_control
        .share_file(
            &app.ctx(owner),
            folder.id,
            file.id,
            Grantee::UserId(partner),
            AccessType::Download,
        )
        .await
        .unwrap();
    app.engine
        .files
        .download(&app.ctx(partner).with_ip("192.168.1.20"), folder.id, file.id)
        .await
        .unwrap();

    let downloads = app
        .entries(ActivityFilter {
            action: Some(ActivityAction::Download),
            ..Default::default()
        })
        .await;
    assert_eq!(downloads.len(), 1);
    assert_eq!(downloads[0].details.get("via_share"), Some(&DetailValue::Bool(true)));
    assert_eq!(
        downloads[0].details.get("ip_address"),
        Some(&DetailValue::Text("192.168.1.20".into()))
    );
}

#[tokio::test]
async fn test_record_appends_routine_events() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Misc", Department::It, false).await;

    app.engine
        .access
        .record(
            docshare_entity::activity::NewActivity::new(ActivityAction::View, owner)
                .folder(folder.id, &folder.name),
        )
        .await;

    let views = app
        .entries(ActivityFilter {
            folder_id: Some(folder.id),
            action: Some(ActivityAction::View),
            ..Default::default()
        })
        .await;
    assert_eq!(views.len(), 1);
}

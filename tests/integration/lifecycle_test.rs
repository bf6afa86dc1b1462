//! Folder and file lifecycle, aggregates, and listings.

use docshare_core::ErrorKind;
use docshare_core::types::PageRequest;
use docshare_entity::Department;
use docshare_entity::activity::{ActivityAction, ActivityFilter};
use docshare_entity::file::{AccessType, CreateFile, File, Grantee};
use docshare_entity::folder::UpdateFolder;
use docshare_entity::user::UserRole;
use docshare_service::{CreateFolderRequest, NewVersionRequest, UploadRequest};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_aggregates_track_uploads_and_deletes() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::SupplyChain);
    let folder = app.folder(owner, "Shipments", Department::SupplyChain, false).await;

    let mut files = Vec::new();
    for i in 1..=5 {
        files.push(app.upload(owner, folder.id, &format!("bol-{i}.pdf"), i * 100).await);
    }
    for file in &files[..2] {
        app.engine
            .files
            .soft_delete_file(&app.ctx(owner), folder.id, file.id)
            .await
            .unwrap();
    }

    let reloaded = app.reload_folder(folder.id).await;
    assert_eq!(reloaded.file_count, 3);
    assert_eq!(reloaded.total_size, 300 + 400 + 500);

    app.engine
        .folder_store
        .set_aggregates(folder.id, 99, 1, reloaded.last_modified)
        .await
        .unwrap();
    let report = app
        .engine
        .aggregates
        .recompute_aggregates(folder.id)
        .await
        .unwrap();
    assert!(report.changed());
    assert_eq!(report.file_count, 3);
    assert_eq!(report.total_size, 1200);

    let repaired = app.reload_folder(folder.id).await;
    assert_eq!(repaired.file_count, 3);
    assert_eq!(repaired.total_size, 1200);

    let all = app.engine.aggregates.recompute_all().await.unwrap();
    assert_eq!(all.len(), 1);
    assert!(!all[0].changed());
}

#[tokio::test]
async fn test_aggregates_never_go_negative() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Temp", Department::It, false).await;
    let file = app.upload(owner, folder.id, "a.txt", 10).await;

    app.engine
        .folder_store
        .set_aggregates(folder.id, 0, 0, folder.last_modified)
        .await
        .unwrap();
    app.engine
        .files
        .soft_delete_file(&app.ctx(owner), folder.id, file.id)
        .await
        .unwrap();

    let reloaded = app.reload_folder(folder.id).await;
    assert_eq!(reloaded.file_count, 0);
    assert_eq!(reloaded.total_size, 0);
}

#[tokio::test]
async fn test_folder_delete_requires_cascade_when_files_remain() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let folder = app.folder(owner, "Archive", Department::Finance, false).await;
    let file = app.upload(owner, folder.id, "2019.zip", 1_000).await;
    let ctx = app.ctx(owner);

    let err = app
        .engine
        .folders
        .delete_folder(&ctx, folder.id, false)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);

    let deleted = app
        .engine
        .folders
        .delete_folder(&ctx, folder.id, true)
        .await
        .unwrap();
    assert!(deleted.is_deleted);
    assert_eq!(deleted.deleted_by, Some(owner));

    let stored = app
        .engine
        .file_store
        .find_by_id(file.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.is_deleted);

    let recreated = app.folder(owner, "Archive", Department::Finance, false).await;
    assert_ne!(recreated.id, folder.id);
}

#[tokio::test]
async fn test_file_landing_during_folder_delete_is_swept() {
    let (app, files) = TestApp::racing();
    let owner = app.user(UserRole::Manager, Department::Technical);
    let folder = app.folder(owner, "Drafts", Department::Technical, false).await;

    let late = File::from_create(CreateFile {
        folder_id: folder.id,
        name: "late.dwg".to_string(),
        mimetype: "application/acad".to_string(),
        size: 300,
        path: "uploads/late.dwg".to_string(),
        public_id: None,
        uploaded_by: owner,
    });
    files.insert_after_next_scan(late.clone());

    let deleted = app
        .engine
        .folders
        .delete_folder(&app.ctx(owner), folder.id, false)
        .await
        .unwrap();
    assert!(deleted.is_deleted);

    let live = app
        .engine
        .file_store
        .list_by_folder(folder.id, false)
        .await
        .unwrap();
    assert!(live.is_empty());
    let deletes = app
        .entries(ActivityFilter {
            file_id: Some(late.id),
            action: Some(ActivityAction::Delete),
            ..Default::default()
        })
        .await;
    assert_eq!(deletes.len(), 1);
}

#[tokio::test]
async fn test_upload_into_folder_deleted_mid_upload_is_withdrawn() {
    let (app, files) = TestApp::racing();
    let owner = app.user(UserRole::Manager, Department::Technical);
    let folder = app.folder(owner, "Specs", Department::Technical, false).await;

    files.delete_folder_before_next_insert(folder.id);
    let err = app
        .engine
        .files
        .upload(
            &app.ctx(owner),
            UploadRequest {
                folder_id: folder.id,
                name: "spec.pdf".to_string(),
                mimetype: "application/pdf".to_string(),
                size: 10,
                path: "uploads/spec.pdf".to_string(),
                public_id: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::NotFound);

    let live = app
        .engine
        .file_store
        .list_by_folder(folder.id, false)
        .await
        .unwrap();
    assert!(live.is_empty());
    let uploads = app
        .entries(ActivityFilter {
            folder_id: Some(folder.id),
            action: Some(ActivityAction::Upload),
            ..Default::default()
        })
        .await;
    assert!(uploads.is_empty());
}

#[tokio::test]
async fn test_folder_names_are_unique_and_validated() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let other = app.user(UserRole::Manager, Department::It);
    app.folder(owner, "Shared", Department::It, false).await;
    let second = app.folder(other, "Private", Department::It, false).await;

    let dup = app
        .engine
        .folders
        .create_folder(
            &app.ctx(owner),
            CreateFolderRequest {
                name: "Shared".into(),
                department: "IT".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(dup.kind, ErrorKind::Conflict);

    let long = app
        .engine
        .folders
        .create_folder(
            &app.ctx(owner),
            CreateFolderRequest {
                name: "x".repeat(101),
                department: "IT".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(long.kind, ErrorKind::Validation);

    let rename = app
        .engine
        .folders
        .update_folder(
            &app.ctx(other),
            second.id,
            UpdateFolder {
                name: Some("Shared".into()),
                description: None,
            },
        )
        .await
        .unwrap_err();
    assert_eq!(rename.kind, ErrorKind::Conflict);

    let renamed = app
        .engine
        .folders
        .update_folder(
            &app.ctx(other),
            second.id,
            UpdateFolder {
                name: Some("Team".into()),
                description: Some("Team notes".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.name, "Team");
    assert_eq!(renamed.description, "Team notes");
}

#[tokio::test]
async fn test_employees_create_folders_only_for_their_department() {
    let app = TestApp::new();
    let employee = app.user(UserRole::Employee, Department::Technical);
    let admin = app.user(UserRole::Admin, Department::It);

    let err = app
        .engine
        .folders
        .create_folder(
            &app.ctx(employee),
            CreateFolderRequest {
                name: "Finance Stuff".into(),
                department: "Finance".into(),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let folder = app.folder(admin, "Finance Stuff", Department::Finance, false).await;
    assert_eq!(folder.created_by, admin);
}

#[tokio::test]
async fn test_new_versions_keep_history() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Technical);
    let editor = app.user(UserRole::Employee, Department::It);
    let reader = app.user(UserRole::Employee, Department::Finance);
    let folder = app.folder(owner, "CAD", Department::Technical, false).await;
    let file = app.upload(owner, folder.id, "bracket.step", 500).await;
    let ctx = app.ctx(owner);

    let mutator = &app.engine.access_control;
    mutator
        .share_file(&ctx, folder.id, file.id, Grantee::UserId(editor), AccessType::Edit)
        .await
        .unwrap();
    mutator
        .share_file(&ctx, folder.id, file.id, Grantee::UserId(reader), AccessType::Download)
        .await
        .unwrap();

    let request = |size| NewVersionRequest {
        path: format!("uploads/bracket-{size}.step"),
        public_id: None,
        mimetype: "model/step".into(),
        size,
    };

    let v2 = app
        .engine
        .files
        .upload_version(&app.ctx(editor), folder.id, file.id, request(800))
        .await
        .unwrap();
    assert_eq!(v2.versions.len(), 1);
    assert_eq!(v2.versions[0].size, 500);
    assert_eq!(v2.versions[0].storage_ref, "uploads/bracket.step");
    assert_eq!(v2.uploaded_by, owner);

    let err = app
        .engine
        .files
        .upload_version(&app.ctx(reader), folder.id, file.id, request(900))
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let reloaded = app.reload_folder(folder.id).await;
    assert_eq!(reloaded.file_count, 1);
    assert_eq!(reloaded.total_size, 800);
}

#[tokio::test]
async fn test_download_is_logged_on_the_file() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let partner = app.user(UserRole::Employee, Department::SupplyChain);
    let folder = app.folder(owner, "Contracts", Department::Finance, false).await;
    let file = app.upload(owner, folder.id, "msa.pdf", 300).await;

    app.engine
        .access_control
        .share_file(
            &app.ctx(owner),
            folder.id,
            file.id,
            Grantee::Department(Department::SupplyChain),
            AccessType::Download,
        )
        .await
        .unwrap();

    let ctx = app.ctx(partner).with_ip("10.0.0.7");
    let downloaded = app
        .engine
        .files
        .download(&ctx, folder.id, file.id)
        .await
        .unwrap();
    assert_eq!(downloaded.downloads, 1);
    assert_eq!(downloaded.download_log.len(), 1);
    assert_eq!(downloaded.download_log[0].user_id, partner);
    assert_eq!(downloaded.download_log[0].ip_address.as_deref(), Some("10.0.0.7"));
}

#[tokio::test]
async fn test_listings_respect_visibility() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let member = app.user(UserRole::Employee, Department::Finance);
    let sharee = app.user(UserRole::Employee, Department::It);
    let folder = app.folder(owner, "Ledger", Department::Finance, false).await;
    app.folder(owner, "Tax", Department::Finance, false).await;
    let a = app.upload(owner, folder.id, "a.csv", 1).await;
    let b = app.upload(owner, folder.id, "b.csv", 2).await;
    let c = app.upload(owner, folder.id, "c.csv", 3).await;
    let ctx = app.ctx(owner);

    app.engine
        .access_control
        .share_file(&ctx, folder.id, b.id, Grantee::UserId(sharee), AccessType::View)
        .await
        .unwrap();
    app.engine
        .files
        .soft_delete_file(&ctx, folder.id, c.id)
        .await
        .unwrap();

    let member_files = app
        .engine
        .files
        .list_files(&app.ctx(member), folder.id, PageRequest::default())
        .await
        .unwrap();
    let ids: Vec<_> = member_files.items.iter().map(|f| f.id).collect();
    assert_eq!(ids.len(), 2);
    assert!(ids.contains(&a.id) && ids.contains(&b.id));

    let sharee_files = app
        .engine
        .files
        .list_files(&app.ctx(sharee), folder.id, PageRequest::default())
        .await
        .unwrap();
    assert_eq!(sharee_files.total_items, 1);
    assert_eq!(sharee_files.items[0].id, b.id);

    let member_folders = app
        .engine
        .folders
        .list_folders(&app.ctx(member), PageRequest::new(1, 1))
        .await
        .unwrap();
    assert_eq!(member_folders.total_items, 2);
    assert_eq!(member_folders.items.len(), 1);
    assert!(member_folders.has_next);

    let sharee_folders = app
        .engine
        .folders
        .list_folders(&app.ctx(sharee), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(sharee_folders.total_items, 0);
}

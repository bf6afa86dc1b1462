//! Access-control mutations: validation, audit atomicity, concurrency.

use docshare_core::ErrorKind;
use docshare_entity::Department;
use docshare_entity::activity::{ActivityAction, ActivityFilter, DetailValue};
use docshare_entity::file::{AccessType, Grantee};
use docshare_entity::folder::UpdateFolder;
use docshare_entity::user::UserRole;
use docshare_service::AccessGrantRequest;

use crate::helpers::TestApp;

#[tokio::test]
async fn test_ledger_fault_leaves_grant_unapplied() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let accountant = app.user(UserRole::Employee, Department::Finance);
    let folder = app.folder(owner, "Licenses", Department::It, false).await;
    let before = app.reload_folder(folder.id).await;
    let entries_before = app.activity.len().await;

    app.activity.fail_writes(true);
    let err = app
        .engine
        .access_control
        .grant_access(
            &app.ctx(owner),
            folder.id,
            AccessGrantRequest::departments(["Finance"]),
        )
        .await
        .unwrap_err();
    app.activity.fail_writes(false);

    assert_eq!(err.kind, ErrorKind::LedgerWrite);
    let after = app.reload_folder(folder.id).await;
    assert_eq!(after.access_control, before.access_control);
    assert!(!after.access_control.allowed_departments.contains(&Department::Finance));
    assert!(!app.engine.access.can_view(accountant, folder.id, None).await);
    assert_eq!(app.activity.len().await, entries_before);
}

#[tokio::test]
async fn test_ledger_fault_with_concurrent_edit_leaves_grant_unapplied() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let accountant = app.user(UserRole::Employee, Department::Finance);
    let folder = app.folder(owner, "Renewals", Department::It, false).await;

    // Another writer edits the description between the grant and its
    // failed ledger write.
    let store = app.engine.folder_store.clone();
    let folder_id = folder.id;
    app.activity.before_next_failure(async move {
        let current = store.find_by_id(folder_id).await.unwrap().unwrap();
        let changes = UpdateFolder {
            name: None,
            description: Some("edited".to_string()),
        };
        store
            .update_metadata(folder_id, current.revision, &changes)
            .await
            .unwrap();
    });

    app.activity.fail_writes(true);
    let err = app
        .engine
        .access_control
        .grant_access(
            &app.ctx(owner),
            folder.id,
            AccessGrantRequest::departments(["Finance"]),
        )
        .await
        .unwrap_err();
    app.activity.fail_writes(false);

    assert_eq!(err.kind, ErrorKind::LedgerWrite);
    let after = app.reload_folder(folder.id).await;
    assert_eq!(after.description, "edited");
    assert!(!after.access_control.allowed_departments.contains(&Department::Finance));
    assert!(!app.engine.access.can_view(accountant, folder.id, None).await);
    let granted = app
        .entries(ActivityFilter {
            folder_id: Some(folder.id),
            action: Some(ActivityAction::AccessGranted),
            ..Default::default()
        })
        .await;
    assert!(granted.is_empty());
}

#[tokio::test]
async fn test_ledger_fault_leaves_sharing_unapplied() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let guest = app.user(UserRole::Employee, Department::HrAdmin);
    let folder = app.folder(owner, "Laptops", Department::It, false).await;
    let file = app.upload(owner, folder.id, "inventory.csv", 42).await;

    app.activity.fail_writes(true);
    let err = app
        .engine
        .access_control
        .share_file(
            &app.ctx(owner),
            folder.id,
            file.id,
            Grantee::UserId(guest),
            AccessType::Download,
        )
        .await
        .unwrap_err();
    app.activity.fail_writes(false);

    assert_eq!(err.kind, ErrorKind::LedgerWrite);
    let stored = app
        .engine
        .file_store
        .find_by_id(file.id)
        .await
        .unwrap()
        .unwrap();
    assert!(stored.shared_with.is_empty());
    assert!(!app.engine.access.can_view(guest, folder.id, Some(file.id)).await);
}

#[tokio::test]
async fn test_routine_events_survive_ledger_faults() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Scripts", Department::It, false).await;

    app.activity.fail_writes(true);
    let file = app.upload(owner, folder.id, "deploy.sh", 7).await;
    app.activity.fail_writes(false);

    let folder = app.reload_folder(folder.id).await;
    assert_eq!(folder.file_count, 1);
    assert!(
        app.entries(ActivityFilter {
            file_id: Some(file.id),
            ..Default::default()
        })
        .await
        .is_empty()
    );
}

#[tokio::test]
async fn test_unknown_department_is_rejected_before_mutation() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Backups", Department::It, false).await;

    let err = app
        .engine
        .access_control
        .grant_access(
            &app.ctx(owner),
            folder.id,
            AccessGrantRequest::departments(["Finance", "Marketing"]),
        )
        .await
        .unwrap_err();

    assert_eq!(err.kind, ErrorKind::Validation);
    let after = app.reload_folder(folder.id).await;
    assert!(after.access_control.allowed_departments.is_empty());
    assert_eq!(after.revision, folder.revision);
}

#[tokio::test]
async fn test_non_manager_cannot_grant() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let member = app.user(UserRole::Employee, Department::It);
    let folder = app.folder(owner, "Firewall", Department::It, false).await;

    let err = app
        .engine
        .access_control
        .grant_access(
            &app.ctx(member),
            folder.id,
            AccessGrantRequest::users([member]),
        )
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(err.message, "insufficient-privilege");
}

#[tokio::test]
async fn test_block_and_grant_are_mutually_exclusive() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let contractor = app.user(UserRole::Employee, Department::SupplyChain);
    let folder = app.folder(owner, "Vendors", Department::It, false).await;
    let ctx = app.ctx(owner);
    let mutator = &app.engine.access_control;

    mutator
        .grant_access(&ctx, folder.id, AccessGrantRequest::users([contractor]))
        .await
        .unwrap();
    let blocked = mutator.block_user(&ctx, folder.id, contractor).await.unwrap();
    assert!(blocked.access_control.denied_users.contains(&contractor));
    assert!(!blocked.access_control.allowed_users.contains(&contractor));

    let regranted = mutator
        .grant_access(&ctx, folder.id, AccessGrantRequest::users([contractor]))
        .await
        .unwrap();
    assert!(regranted.access_control.allowed_users.contains(&contractor));
    assert!(!regranted.access_control.denied_users.contains(&contractor));
    assert!(app.engine.access.can_view(contractor, folder.id, None).await);

    let granted = app
        .entries(ActivityFilter {
            folder_id: Some(folder.id),
            action: Some(ActivityAction::AccessGranted),
            ..Default::default()
        })
        .await;
    assert_eq!(granted.len(), 2);
    assert_eq!(granted[1].details.get("unblocked"), Some(&DetailValue::Bool(true)));
}

#[tokio::test]
async fn test_revoking_department_keeps_file_shares() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let engineer = app.user(UserRole::Employee, Department::It);
    let folder = app.folder(owner, "Forecasts", Department::Finance, false).await;
    let file = app.upload(owner, folder.id, "q3.xlsx", 64).await;
    let ctx = app.ctx(owner);
    let mutator = &app.engine.access_control;

    mutator
        .grant_access(&ctx, folder.id, AccessGrantRequest::departments(["IT"]))
        .await
        .unwrap();
    mutator
        .share_file(&ctx, folder.id, file.id, Grantee::UserId(engineer), AccessType::View)
        .await
        .unwrap();
    mutator
        .revoke_access(&ctx, folder.id, AccessGrantRequest::departments(["IT"]))
        .await
        .unwrap();

    assert!(!app.engine.access.can_view(engineer, folder.id, None).await);
    assert!(app.engine.access.can_view(engineer, folder.id, Some(file.id)).await);
}

#[tokio::test]
async fn test_share_updates_and_unshare() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let folder = app.folder(owner, "Invoices", Department::Finance, false).await;
    let file = app.upload(owner, folder.id, "inv-001.pdf", 12).await;
    let ctx = app.ctx(owner);
    let grantee = Grantee::Department(Department::SupplyChain);
    let mutator = &app.engine.access_control;

    mutator
        .share_file(&ctx, folder.id, file.id, grantee, AccessType::View)
        .await
        .unwrap();
    let upgraded = mutator
        .share_file(&ctx, folder.id, file.id, grantee, AccessType::Edit)
        .await
        .unwrap();
    assert_eq!(upgraded.shared_with.len(), 1);
    assert_eq!(upgraded.shared_with[0].access_type, AccessType::Edit);

    let shares = app
        .entries(ActivityFilter {
            file_id: Some(file.id),
            action: Some(ActivityAction::Share),
            ..Default::default()
        })
        .await;
    assert_eq!(shares.len(), 2);
    assert_eq!(
        shares[1].details.get("previous_access_type"),
        Some(&DetailValue::Text("view".into()))
    );

    let unshared = mutator
        .unshare_file(&ctx, folder.id, file.id, grantee)
        .await
        .unwrap();
    assert!(unshared.shared_with.is_empty());
}

#[tokio::test]
async fn test_set_public_is_audited() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::HrAdmin);
    let outsider = app.user(UserRole::Employee, Department::Technical);
    let folder = app.folder(owner, "Handbook", Department::HrAdmin, false).await;

    app.engine
        .access_control
        .set_public(&app.ctx(owner), folder.id, true)
        .await
        .unwrap();
    assert!(app.engine.access.can_view(outsider, folder.id, None).await);

    app.engine
        .access_control
        .set_public(&app.ctx(owner), folder.id, false)
        .await
        .unwrap();
    assert!(!app.engine.access.can_view(outsider, folder.id, None).await);

    let entries = app
        .entries(ActivityFilter {
            folder_id: Some(folder.id),
            ..Default::default()
        })
        .await;
    let actions: Vec<ActivityAction> = entries.iter().map(|e| e.action).collect();
    assert_eq!(
        actions,
        vec![
            ActivityAction::FolderCreate,
            ActivityAction::AccessGranted,
            ActivityAction::AccessRevoked,
        ]
    );
}

#[tokio::test]
async fn test_stale_revision_conflicts() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Monitoring", Department::It, false).await;
    let stale = app.reload_folder(folder.id).await;

    app.engine
        .access_control
        .grant_access(
            &app.ctx(owner),
            folder.id,
            AccessGrantRequest::departments(["Technical"]),
        )
        .await
        .unwrap();

    let mut acl = stale.access_control.clone();
    acl.allow_department(Department::Finance);
    let err = app
        .engine
        .folder_store
        .update_access(stale.id, stale.revision, &acl, stale.is_public)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Conflict);
    assert!(err.is_retryable());

    let current = app.reload_folder(folder.id).await;
    assert!(current.access_control.allowed_departments.contains(&Department::Technical));
    assert!(!current.access_control.allowed_departments.contains(&Department::Finance));
}

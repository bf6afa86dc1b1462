//! Access decisions through the `can_*` boundary.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;

use docshare_auth::{DirectoryService, InMemoryDirectory};
use docshare_core::ErrorKind;
use docshare_core::config::access::AccessConfig;
use docshare_core::result::AppResult;
use docshare_core::types::UserId;
use docshare_entity::Department;
use docshare_entity::file::{AccessType, Grantee};
use docshare_entity::user::{Actor, UserRole};
use docshare_service::{AccessGrantRequest, Engine};

use crate::helpers::TestApp;

#[tokio::test]
async fn test_deny_wins_over_department_match() {
    let app = TestApp::new();
    let manager = app.user(UserRole::Manager, Department::It);
    let u7 = app.user(UserRole::Employee, Department::It);
    let u9 = app.user(UserRole::Employee, Department::It);

    let folder = app.folder(manager, "IT Runbooks", Department::It, false).await;
    let ctx = app.ctx(manager);
    app.engine
        .access_control
        .grant_access(&ctx, folder.id, AccessGrantRequest::departments(["IT"]))
        .await
        .unwrap();
    app.engine
        .access_control
        .block_user(&ctx, folder.id, u7)
        .await
        .unwrap();

    assert!(!app.engine.access.can_view(u7, folder.id, None).await);
    assert!(app.engine.access.can_view(u9, folder.id, None).await);
}

#[tokio::test]
async fn test_view_only_sharee_sees_file_but_cannot_upload() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let u2 = app.user(UserRole::Employee, Department::It);

    let folder = app.folder(owner, "Payroll", Department::Finance, false).await;
    let file = app.upload(owner, folder.id, "march.xlsx", 100).await;
    app.engine
        .access_control
        .share_file(
            &app.ctx(owner),
            folder.id,
            file.id,
            Grantee::UserId(u2),
            AccessType::View,
        )
        .await
        .unwrap();

    let access = &app.engine.access;
    assert!(access.can_view(u2, folder.id, Some(file.id)).await);
    assert!(!access.can_view(u2, folder.id, None).await);
    assert!(!access.can_upload(u2, folder.id).await);

    let err = app
        .engine
        .files
        .download(&app.ctx(u2), folder.id, file.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(err.message, "insufficient-privilege");
}

#[tokio::test]
async fn test_deny_overrides_public_flag_and_sharing() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Company);
    let target = app.user(UserRole::Employee, Department::Company);

    let folder = app.folder(owner, "Announcements", Department::Company, true).await;
    let file = app.upload(owner, folder.id, "memo.pdf", 10).await;
    let ctx = app.ctx(owner);
    app.engine
        .access_control
        .share_file(&ctx, folder.id, file.id, Grantee::UserId(target), AccessType::Edit)
        .await
        .unwrap();
    assert!(app.engine.access.can_view(target, folder.id, Some(file.id)).await);

    app.engine
        .access_control
        .block_user(&ctx, folder.id, target)
        .await
        .unwrap();

    assert!(!app.engine.access.can_view(target, folder.id, None).await);
    assert!(!app.engine.access.can_view(target, folder.id, Some(file.id)).await);
    assert!(!app.engine.access.can_upload(target, folder.id).await);
}

#[tokio::test]
async fn test_public_folder_is_visible_to_every_department() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::HrAdmin);
    let folder = app.folder(owner, "Holidays", Department::HrAdmin, true).await;

    for department in Department::ALL {
        let user = app.user(UserRole::Employee, department);
        assert!(
            app.engine.access.can_view(user, folder.id, None).await,
            "{department}"
        );
    }
}

#[tokio::test]
async fn test_admin_bypasses_policy_but_cannot_be_blocked() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let admin = app.user(UserRole::Admin, Department::It);
    let folder = app.folder(owner, "Audit", Department::Finance, false).await;

    let access = &app.engine.access;
    assert!(access.can_view(admin, folder.id, None).await);
    assert!(access.can_upload(admin, folder.id).await);
    assert!(access.can_manage(admin, folder.id).await);
    assert!(access.can_delete(admin, folder.id).await);
    assert!(access.can_block(admin, folder.id, owner).await);

    let err = app
        .engine
        .access_control
        .block_user(&app.ctx(owner), folder.id, admin)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Validation);
    assert!(access.can_manage(admin, folder.id).await);
}

#[tokio::test]
async fn test_owner_keeps_management_after_grant_removed() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Employee, Department::Technical);
    let folder = app.folder(owner, "Specs", Department::Technical, false).await;
    let ctx = app.ctx(owner);

    app.engine
        .access_control
        .grant_access(&ctx, folder.id, AccessGrantRequest::users([owner]))
        .await
        .unwrap();
    app.engine
        .access_control
        .revoke_access(&ctx, folder.id, AccessGrantRequest::users([owner]))
        .await
        .unwrap();
    app.directory
        .set_department(owner, Department::SupplyChain)
        .unwrap();

    assert!(app.engine.access.can_manage(owner, folder.id).await);
    assert!(app.engine.access.can_delete(owner, folder.id).await);
    assert!(!app.engine.access.can_view(owner, folder.id, None).await);
}

#[tokio::test]
async fn test_blocked_owner_loses_management_until_unblocked() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Employee, Department::Technical);
    let manager = app.user(UserRole::Manager, Department::Technical);
    let admin = app.user(UserRole::Admin, Department::Company);
    let folder = app.folder(owner, "Drawings", Department::Technical, false).await;

    let err = app
        .engine
        .access_control
        .block_user(&app.ctx(manager), folder.id, owner)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);
    assert_eq!(err.message, "owner-cannot-be-blocked");
    assert!(!app.engine.access.can_block(manager, folder.id, owner).await);

    app.engine
        .access_control
        .block_user(&app.ctx(admin), folder.id, owner)
        .await
        .unwrap();
    assert!(!app.engine.access.can_manage(owner, folder.id).await);
    assert!(!app.engine.access.can_delete(owner, folder.id).await);

    app.engine
        .access_control
        .unblock_user(&app.ctx(admin), folder.id, owner)
        .await
        .unwrap();
    assert!(app.engine.access.can_manage(owner, folder.id).await);
}

#[tokio::test]
async fn test_manager_rights_follow_department() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::Finance);
    let it_manager = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Budgets", Department::Finance, false).await;

    assert!(!app.engine.access.can_manage(it_manager, folder.id).await);
    app.directory
        .set_department(it_manager, Department::Finance)
        .unwrap();
    assert!(app.engine.access.can_manage(it_manager, folder.id).await);
    assert!(app.engine.access.can_view(it_manager, folder.id, None).await);
}

#[tokio::test]
async fn test_missing_resources_answer_false() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let folder = app.folder(owner, "Servers", Department::It, false).await;

    let stranger = UserId::new();
    assert!(!app.engine.access.can_view(stranger, folder.id, None).await);

    let deleted = app
        .engine
        .folders
        .delete_folder(&app.ctx(owner), folder.id, false)
        .await
        .unwrap();
    assert!(deleted.is_deleted);
    assert!(!app.engine.access.can_view(owner, folder.id, None).await);
}

#[tokio::test]
async fn test_list_access_is_for_managers_only() {
    let app = TestApp::new();
    let owner = app.user(UserRole::Manager, Department::It);
    let member = app.user(UserRole::Employee, Department::It);
    let blocked = app.user(UserRole::Employee, Department::It);
    let folder = app.folder(owner, "Network", Department::It, false).await;
    let file = app.upload(owner, folder.id, "topology.png", 5).await;

    let ctx = app.ctx(owner);
    app.engine
        .access_control
        .block_user(&ctx, folder.id, blocked)
        .await
        .unwrap();
    app.engine
        .access_control
        .share_file(
            &ctx,
            folder.id,
            file.id,
            Grantee::Department(Department::Finance),
            AccessType::Download,
        )
        .await
        .unwrap();

    let err = app
        .engine
        .access
        .list_access(&app.ctx(member), folder.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Authorization);

    let listing = app.engine.access.list_access(&ctx, folder.id).await.unwrap();
    assert!(listing.denied_users.contains(&blocked));
    assert_eq!(listing.shared_files.len(), 1);
    assert_eq!(listing.shared_files[0].file_id, file.id);
}

struct SlowDirectory(InMemoryDirectory);

#[async_trait]
impl DirectoryService for SlowDirectory {
    async fn resolve_actor(&self, user_id: UserId) -> AppResult<Actor> {
        tokio::time::sleep(Duration::from_secs(30)).await;
        self.0.resolve_actor(user_id).await
    }
}

#[tokio::test(start_paused = true)]
async fn test_directory_timeout_fails_closed() {
    let inner = InMemoryDirectory::new();
    let admin = UserId::new();
    inner.upsert(admin, UserRole::Admin, Department::It);

    let engine = Engine::in_memory(Arc::new(SlowDirectory(inner)), &AccessConfig::default());
    let folder = docshare_entity::folder::Folder::from_create(
        docshare_entity::folder::CreateFolder {
            name: "Slow".into(),
            description: String::new(),
            department: Department::It,
            is_public: true,
            created_by: admin,
            access_control: Default::default(),
        },
    );
    let folder = engine.folder_store.insert(&folder).await.unwrap();

    assert!(!engine.access.can_view(admin, folder.id, None).await);
    let err = engine
        .access
        .check(admin, folder.id, None, docshare_auth::Operation::View)
        .await
        .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Timeout);
}

//! File lifecycle: upload, new versions, download, view, soft-delete, list.
//!
//! Folder aggregates are adjusted after each file change. Those updates are
//! advisory; a failed adjustment is logged and left for
//! [`AggregateService`](crate::aggregate::AggregateService) to repair.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use validator::Validate;

use docshare_auth::Operation;
use docshare_core::error::{AppError, ErrorKind};
use docshare_core::result::AppResult;
use docshare_core::types::{FileId, FolderId, PageRequest, PageResponse};
use docshare_database::store::ContentUpdate;
use docshare_database::{FileStore, FolderStore};
use docshare_entity::activity::{ActivityAction, ActivityDetails, NewActivity};
use docshare_entity::file::{CreateFile, DownloadRecord, File, FileVersion};
use docshare_entity::folder::Folder;
use docshare_entity::user::Actor;

use crate::access::AccessService;
use crate::context::RequestContext;
use crate::ledger::ActivityLedger;

/// Metadata of a file whose bytes the storage collaborator already holds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Target folder.
    pub folder_id: FolderId,
    /// File name.
    pub name: String,
    /// MIME type.
    pub mimetype: String,
    /// Size in bytes.
    pub size: i64,
    /// Storage path.
    pub path: String,
    /// Object store id.
    #[serde(default)]
    pub public_id: Option<String>,
}

/// Replacement content for an existing file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewVersionRequest {
    /// Storage path of the new content.
    pub path: String,
    /// Object store id of the new content.
    #[serde(default)]
    pub public_id: Option<String>,
    /// MIME type of the new content.
    pub mimetype: String,
    /// Size in bytes of the new content.
    pub size: i64,
}

/// Manages files inside folders.
#[derive(Clone)]
pub struct FileService {
    access: Arc<AccessService>,
    folders: Arc<dyn FolderStore>,
    files: Arc<dyn FileStore>,
    ledger: Arc<ActivityLedger>,
}

impl FileService {
    /// Creates a new file service.
    pub fn new(
        access: Arc<AccessService>,
        folders: Arc<dyn FolderStore>,
        files: Arc<dyn FileStore>,
        ledger: Arc<ActivityLedger>,
    ) -> Self {
        Self {
            access,
            folders,
            files,
            ledger,
        }
    }

    /// Registers an uploaded file in a folder.
    pub async fn upload(&self, ctx: &RequestContext, req: UploadRequest) -> AppResult<File> {
        let data = CreateFile {
            folder_id: req.folder_id,
            name: req.name.trim().to_string(),
            mimetype: req.mimetype,
            size: req.size,
            path: req.path,
            public_id: req.public_id,
            uploaded_by: ctx.user_id,
        };
        data.validate()
            .map_err(|e| AppError::validation(format!("Invalid file: {e}")))?;

        let granted = self
            .access
            .authorize(ctx, req.folder_id, None, Operation::Upload)
            .await?;
        let folder = granted.folder;

        let file = self.files.insert(&File::from_create(data)).await?;

        // A folder deleted after the insert may already have been swept.
        match self.folders.find_by_id(folder.id).await {
            Ok(Some(current)) if !current.is_deleted => {}
            Ok(_) => {
                self.withdraw(&file).await;
                return Err(AppError::not_found(format!("Folder {} not found", folder.id)));
            }
            Err(e) => {
                self.withdraw(&file).await;
                return Err(e);
            }
        }
        self.adjust(&folder, 1, file.size, file.uploaded_at).await;

        let details = ActivityDetails::new()
            .with("size", file.size)
            .with("mimetype", file.mimetype.as_str())
            .with("version", 1_i64);
        self.ledger
            .append(
                NewActivity::new(ActivityAction::Upload, ctx.user_id)
                    .folder(folder.id, &folder.name)
                    .file(file.id, &file.name)
                    .details(details),
            )
            .await;

        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            file_id = %file.id,
            size = file.size,
            "File uploaded"
        );
        Ok(file)
    }

    async fn withdraw(&self, file: &File) {
        match self
            .files
            .mark_deleted(file.id, file.revision, file.uploaded_by, Utc::now())
            .await
        {
            Ok(_) => {}
            // Already swept by the folder deletion.
            Err(e) if e.is(ErrorKind::Conflict) => {}
            Err(e) => warn!(file_id = %file.id, error = %e, "Failed to withdraw upload"),
        }
    }

    /// Replaces a file's content, keeping the previous content as a version.
    pub async fn upload_version(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
        req: NewVersionRequest,
    ) -> AppResult<File> {
        if req.size < 0 {
            return Err(AppError::validation("File size must not be negative"));
        }
        if req.path.is_empty() {
            return Err(AppError::validation("Storage path must not be empty"));
        }

        let granted = self
            .access
            .authorize_replace(ctx, folder_id, file_id)
            .await?;
        let (folder, file) = (granted.folder, live(granted.file, file_id)?);

        let now = Utc::now();
        let update = ContentUpdate {
            path: req.path,
            public_id: req.public_id,
            mimetype: req.mimetype,
            size: req.size,
            previous: FileVersion {
                storage_ref: file.path.clone(),
                uploaded_at: file.uploaded_at,
                uploaded_by: file.uploaded_by,
                size: file.size,
            },
        };
        let updated = self
            .files
            .replace_content(file.id, file.revision, &update)
            .await?;
        self.adjust(&folder, 0, updated.size - file.size, now).await;

        let details = ActivityDetails::new()
            .with("size", updated.size)
            .with("mimetype", updated.mimetype.as_str())
            .with("version", updated.versions.len() as i64 + 1);
        self.ledger
            .append(
                NewActivity::new(ActivityAction::Upload, ctx.user_id)
                    .folder(folder.id, &folder.name)
                    .file(updated.id, &updated.name)
                    .details(details),
            )
            .await;

        info!(
            actor_id = %ctx.user_id,
            file_id = %updated.id,
            versions = updated.versions.len(),
            "File version uploaded"
        );
        Ok(updated)
    }

    /// Records a download and returns the file, whose `path`/`public_id`
    /// the caller hands to the storage collaborator.
    pub async fn download(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
    ) -> AppResult<File> {
        let granted = self
            .access
            .authorize_download(ctx, folder_id, file_id)
            .await?;
        let via_share = self.via_share(&granted.actor, &granted.folder);
        let (folder, file) = (granted.folder, live(granted.file, file_id)?);

        let record = DownloadRecord {
            user_id: ctx.user_id,
            downloaded_at: Utc::now(),
            ip_address: ctx.ip_address.clone(),
        };
        let updated = self.files.record_download(file.id, &record).await?;

        let mut details = ActivityDetails::new().with("via_share", via_share);
        if let Some(ip) = &ctx.ip_address {
            details.insert("ip_address", ip.as_str());
        }
        self.ledger
            .append(
                NewActivity::new(ActivityAction::Download, ctx.user_id)
                    .folder(folder.id, &folder.name)
                    .file(file.id, &file.name)
                    .details(details),
            )
            .await;

        Ok(updated)
    }

    /// Returns a file the caller may view and records the view.
    pub async fn view_file(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
    ) -> AppResult<File> {
        let granted = self
            .access
            .authorize(ctx, folder_id, Some(file_id), Operation::View)
            .await?;
        let via_share = self.via_share(&granted.actor, &granted.folder);
        let (folder, file) = (granted.folder, live(granted.file, file_id)?);

        self.ledger
            .append(
                NewActivity::new(ActivityAction::View, ctx.user_id)
                    .folder(folder.id, &folder.name)
                    .file(file.id, &file.name)
                    .details(ActivityDetails::new().with("via_share", via_share)),
            )
            .await;

        Ok(file)
    }

    /// Soft-deletes a file. Its ledger history stays queryable.
    pub async fn soft_delete_file(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        file_id: FileId,
    ) -> AppResult<File> {
        let granted = self
            .access
            .authorize(ctx, folder_id, Some(file_id), Operation::Delete)
            .await?;
        let (folder, file) = (granted.folder, live(granted.file, file_id)?);

        let now = Utc::now();
        let deleted = self
            .files
            .mark_deleted(file.id, file.revision, ctx.user_id, now)
            .await?;
        self.adjust(&folder, -1, -file.size, now).await;

        let details = ActivityDetails::new()
            .with("scope", "file")
            .with("size", file.size);
        self.ledger
            .append(
                NewActivity::new(ActivityAction::Delete, ctx.user_id)
                    .folder(folder.id, &folder.name)
                    .file(file.id, &file.name)
                    .details(details),
            )
            .await;

        info!(
            actor_id = %ctx.user_id,
            folder_id = %folder.id,
            file_id = %file.id,
            "File deleted"
        );
        Ok(deleted)
    }

    /// Lists the live files of a folder the caller may view.
    ///
    /// Someone who reaches the folder sees every file; someone who only
    /// holds sharing grants sees just the files shared with them.
    pub async fn list_files(
        &self,
        ctx: &RequestContext,
        folder_id: FolderId,
        page: PageRequest,
    ) -> AppResult<PageResponse<File>> {
        let actor = self.access.resolve_actor(ctx.user_id).await?;
        let folder = self.access.live_folder(folder_id).await?;
        let evaluator = self.access.evaluator();

        let visible: Vec<File> = self
            .files
            .list_by_folder(folder.id, false)
            .await?
            .into_iter()
            .filter(|f| {
                evaluator
                    .decide(&actor, &folder, Some(f), Operation::View)
                    .is_allowed()
            })
            .collect();
        Ok(page.apply(visible))
    }

    fn via_share(&self, actor: &Actor, folder: &Folder) -> bool {
        !actor.is_admin() && !self.access.evaluator().is_folder_eligible(actor, folder)
    }

    async fn adjust(&self, folder: &Folder, files: i64, size: i64, at: DateTime<Utc>) {
        if let Err(e) = self
            .folders
            .adjust_aggregates(folder.id, files, size, at)
            .await
        {
            warn!(
                folder_id = %folder.id,
                error = %e,
                "Failed to adjust folder aggregates"
            );
        }
    }
}

fn live(file: Option<File>, file_id: FileId) -> AppResult<File> {
    file.ok_or_else(|| AppError::not_found(format!("File {file_id} not found")))
}

//! Accessory form handling: validation, image upload and save

use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use validator::Validate;

use crate::{
    client::FilePart,
    config::UploadConfig,
    error::{AppError, AppResult},
    models::accessory::{Accessory, CreateAccessory, UpdateAccessory},
    repository::Repository,
};

use super::notify::Notifier;

/// Multipart field the upload endpoint reads
pub const IMAGE_FIELD: &str = "images";

static IMAGE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\.(jpe?g|png|gif|webp|bmp)$").expect("static image pattern"));

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AccessoryStore: Send + Sync {
    /// Upload in one call, returning the stored references
    async fn upload_images(&self, files: Vec<FilePart>) -> AppResult<Vec<String>>;

    async fn create(&self, data: CreateAccessory) -> AppResult<Accessory>;

    async fn update(&self, id: String, data: UpdateAccessory) -> AppResult<Accessory>;

    async fn delete_image(&self, filename: String) -> AppResult<()>;
}

#[async_trait]
impl AccessoryStore for Repository {
    async fn upload_images(&self, files: Vec<FilePart>) -> AppResult<Vec<String>> {
        let uploaded = self.accessories.upload_images(files).await?;
        Ok(uploaded.data.map(|d| d.images).unwrap_or_default())
    }

    async fn create(&self, data: CreateAccessory) -> AppResult<Accessory> {
        self.accessories.create(&data).await?.into_data()
    }

    async fn update(&self, id: String, data: UpdateAccessory) -> AppResult<Accessory> {
        self.accessories.update(&id, &data).await?.into_data()
    }

    async fn delete_image(&self, filename: String) -> AppResult<()> {
        self.accessories.delete_image(&filename).await.map(|_| ())
    }
}

/// Read an image from disk into an upload part
pub async fn load_image(path: &Path) -> AppResult<FilePart> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Upload(format!("Không đọc được tệp {}: {}", path.display(), e)))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "image".to_string());
    let content_type = match path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .as_deref()
    {
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("bmp") => "image/bmp",
        _ => "application/octet-stream",
    };
    Ok(FilePart {
        field: IMAGE_FIELD.to_string(),
        file_name,
        content_type: content_type.to_string(),
        bytes,
    })
}

pub struct AccessoryEditor {
    store: Arc<dyn AccessoryStore>,
    notifier: Arc<dyn Notifier>,
    max_image_bytes: usize,
}

impl AccessoryEditor {
    pub fn new(store: Arc<dyn AccessoryStore>, notifier: Arc<dyn Notifier>, uploads: &UploadConfig) -> Self {
        Self {
            store,
            notifier,
            max_image_bytes: uploads.max_image_bytes,
        }
    }

    /// Reject non-images and oversized files before anything is sent
    pub fn check_image(&self, file: &FilePart) -> AppResult<()> {
        let is_image = file.content_type.starts_with("image/") || IMAGE_NAME.is_match(&file.file_name);
        if !is_image {
            return Err(AppError::Upload(format!("{} không phải là tệp ảnh", file.file_name)));
        }
        if file.bytes.len() > self.max_image_bytes {
            return Err(AppError::Upload(format!(
                "Ảnh {} vượt quá {} MB",
                file.file_name,
                self.max_image_bytes / (1024 * 1024)
            )));
        }
        Ok(())
    }

    pub async fn create(&self, form: CreateAccessory, new_images: Vec<FilePart>) -> AppResult<Accessory> {
        let saved = self.report(self.save_new(form, new_images).await)?;
        self.notifier.success(&format!("Đã thêm phụ kiện {}", saved.name));
        Ok(saved)
    }

    /// Save changes. `kept_images` are the stored references the operator
    /// left in place; the others are deleted after a successful save.
    pub async fn update(
        &self,
        current: &Accessory,
        changes: UpdateAccessory,
        kept_images: Vec<String>,
        new_images: Vec<FilePart>,
    ) -> AppResult<Accessory> {
        let saved = self.report(
            self.save_changes(&current.id, changes, kept_images.clone(), new_images)
                .await,
        )?;

        let kept: HashSet<&str> = kept_images.iter().map(String::as_str).collect();
        for removed in current.images.iter().filter(|i| !kept.contains(i.as_str())) {
            let filename = removed.rsplit('/').next().unwrap_or(removed).to_string();
            if let Err(e) = self.store.delete_image(filename).await {
                tracing::warn!("Could not delete image {} of accessory {}: {}", removed, current.id, e);
            }
        }

        self.notifier.success(&format!("Đã cập nhật phụ kiện {}", saved.name));
        Ok(saved)
    }

    async fn save_new(&self, mut form: CreateAccessory, new_images: Vec<FilePart>) -> AppResult<Accessory> {
        form.validate()?;
        let uploaded = self.upload(new_images).await?;
        form.images.extend(uploaded);
        self.store.create(form).await
    }

    async fn save_changes(
        &self,
        id: &str,
        mut changes: UpdateAccessory,
        mut images: Vec<String>,
        new_images: Vec<FilePart>,
    ) -> AppResult<Accessory> {
        if changes.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Tên phụ kiện là bắt buộc".to_string()));
        }
        if changes.accessory_type.as_deref().is_some_and(|t| t.trim().is_empty()) {
            return Err(AppError::Validation("Loại phụ kiện là bắt buộc".to_string()));
        }
        images.extend(self.upload(new_images).await?);
        changes.images = Some(images);
        self.store.update(id.to_string(), changes).await
    }

    async fn upload(&self, files: Vec<FilePart>) -> AppResult<Vec<String>> {
        if files.is_empty() {
            return Ok(Vec::new());
        }
        for file in &files {
            self.check_image(file)?;
        }
        let count = files.len();
        let stored = self
            .store
            .upload_images(files)
            .await
            .map_err(|e| AppError::Upload(format!("Tải ảnh lên thất bại: {}", e.user_message())))?;
        tracing::debug!("Uploaded {} images", count);
        Ok(stored)
    }

    fn report<T>(&self, result: AppResult<T>) -> AppResult<T> {
        if let Err(e) = &result {
            self.notifier.failure("Saving accessory", e);
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::services::notify::MemoryNotifier;
    use serde_json::json;

    fn image(name: &str, content_type: &str, size: usize) -> FilePart {
        FilePart {
            field: IMAGE_FIELD.into(),
            file_name: name.into(),
            content_type: content_type.into(),
            bytes: vec![0; size],
        }
    }

    fn form() -> CreateAccessory {
        CreateAccessory {
            name: "RAM 16GB".into(),
            sub_tool_id: "s1".into(),
            accessory_type: "type-ram".into(),
            ..Default::default()
        }
    }

    fn accessory(images: &[&str]) -> Accessory {
        serde_json::from_value(json!({
            "_id": "a1",
            "name": "RAM 16GB",
            "subToolId": "s1",
            "images": images
        }))
        .unwrap()
    }

    fn editor(store: MockAccessoryStore) -> (AccessoryEditor, Arc<MemoryNotifier>) {
        let notifier = Arc::new(MemoryNotifier::new());
        let uploads = UploadConfig { max_image_bytes: 1024 };
        (AccessoryEditor::new(Arc::new(store), notifier.clone(), &uploads), notifier)
    }

    #[test]
    fn test_check_image_rules() {
        let (editor, _) = editor(MockAccessoryStore::new());
        assert!(editor.check_image(&image("front.JPG", "application/octet-stream", 10)).is_ok());
        assert!(editor.check_image(&image("scan", "image/png", 10)).is_ok());
        assert!(editor.check_image(&image("notes.pdf", "application/pdf", 10)).is_err());
        let err = editor.check_image(&image("big.png", "image/png", 2048)).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Upload);
    }

    #[tokio::test]
    async fn test_create_uploads_once_then_saves() {
        let mut store = MockAccessoryStore::new();
        store
            .expect_upload_images()
            .withf(|files| files.len() == 2)
            .times(1)
            .returning(|_| Ok(vec!["/uploads/1.png".into(), "/uploads/2.png".into()]));
        store
            .expect_create()
            .withf(|data| data.images == vec!["/uploads/1.png".to_string(), "/uploads/2.png".to_string()])
            .times(1)
            .returning(|_| Ok(accessory(&["/uploads/1.png", "/uploads/2.png"])));
        let (editor, notifier) = editor(store);

        let saved = editor
            .create(form(), vec![image("1.png", "image/png", 10), image("2.png", "image/png", 10)])
            .await
            .unwrap();

        assert_eq!(saved.images.len(), 2);
        assert_eq!(notifier.messages(), vec!["Đã thêm phụ kiện RAM 16GB"]);
    }

    #[tokio::test]
    async fn test_upload_failure_aborts_save() {
        let mut store = MockAccessoryStore::new();
        store
            .expect_upload_images()
            .returning(|_| Err(AppError::Network("reset".into())));
        store.expect_create().never();
        let (editor, notifier) = editor(store);

        let err = editor
            .create(form(), vec![image("1.png", "image/png", 10)])
            .await
            .unwrap_err();

        assert_eq!(err.kind(), ErrorKind::Upload);
        assert_eq!(notifier.drain().len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_form_sends_nothing() {
        let mut store = MockAccessoryStore::new();
        store.expect_upload_images().never();
        store.expect_create().never();
        let (editor, _) = editor(store);

        let mut invalid = form();
        invalid.accessory_type.clear();
        let err = editor.create(invalid, vec![image("1.png", "image/png", 10)]).await.unwrap_err();

        assert!(matches!(err, AppError::Validation(ref m) if m.contains("Loại phụ kiện")));
    }

    #[tokio::test]
    async fn test_update_deletes_removed_images_best_effort() {
        let mut store = MockAccessoryStore::new();
        store.expect_upload_images().never();
        store
            .expect_update()
            .withf(|id, data| id == "a1" && data.images == Some(vec!["/uploads/keep.png".to_string()]))
            .times(1)
            .returning(|_, _| Ok(accessory(&["/uploads/keep.png"])));
        store
            .expect_delete_image()
            .withf(|name| name == "gone.png")
            .times(1)
            .returning(|_| Err(AppError::NotFound("gone.png".into())));
        let (editor, notifier) = editor(store);

        let current = accessory(&["/uploads/keep.png", "/uploads/gone.png"]);
        editor
            .update(&current, UpdateAccessory::default(), vec!["/uploads/keep.png".into()], Vec::new())
            .await
            .unwrap();

        assert_eq!(notifier.messages(), vec!["Đã cập nhật phụ kiện RAM 16GB"]);
    }

    #[tokio::test]
    async fn test_load_image_guesses_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("front.jpeg");
        std::fs::write(&path, b"jpeg").unwrap();

        let part = load_image(&path).await.unwrap();
        assert_eq!(part.file_name, "front.jpeg");
        assert_eq!(part.content_type, "image/jpeg");
        assert_eq!(part.field, IMAGE_FIELD);
    }
}

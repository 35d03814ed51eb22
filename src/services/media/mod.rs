pub mod image_upload_service;
pub mod object_storage;

pub use image_upload_service::{ImageUpload, ImageUploadService};
pub use object_storage::{LocalStorage, ObjectStorage, StorageError, SupabaseStorage};

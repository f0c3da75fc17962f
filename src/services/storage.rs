//! Object storage for return verification videos and job-application resumes.
//!
//! Production uses Cloudflare R2 through its S3-compatible API. A local
//! filesystem backend exists for development and tests.

use std::path::PathBuf;

use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    Client,
    config::{Credentials, Region},
    error::DisplayErrorContext,
    primitives::ByteStream,
};
use thiserror::Error;

use crate::{config::StorageConfig, validation::sanitize_object_segment};

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("storage is not configured")]
    NotConfigured,

    #[error("upload failed: {0}")]
    Upload(String),

    #[error("delete failed: {0}")]
    Delete(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Clone, Debug)]
pub enum ObjectStorage {
    R2 {
        client: Client,
        bucket: String,
        public_url_base: String,
    },
    Local {
        root: PathBuf,
        public_url_base: String,
    },
    Disabled,
}

impl ObjectStorage {
    pub async fn from_config(config: &StorageConfig) -> Result<Self, StorageError> {
        match config {
            StorageConfig::R2 {
                account_id,
                access_key_id,
                secret_access_key,
                bucket,
                public_url_base,
            } => {
                let credentials = Credentials::new(
                    access_key_id.clone(),
                    secret_access_key.clone(),
                    None,
                    None,
                    "r2",
                );
                let sdk_config = aws_config::defaults(BehaviorVersion::latest())
                    .region(Region::new("auto"))
                    .endpoint_url(format!("https://{account_id}.r2.cloudflarestorage.com"))
                    .credentials_provider(credentials)
                    .load()
                    .await;
                let s3_config = aws_sdk_s3::config::Builder::from(&sdk_config)
                    .force_path_style(true)
                    .build();

                tracing::info!(bucket = %bucket, "object storage: r2");
                Ok(ObjectStorage::R2 {
                    client: Client::from_conf(s3_config),
                    bucket: bucket.clone(),
                    public_url_base: public_url_base.trim_end_matches('/').to_string(),
                })
            }
            StorageConfig::Local {
                root,
                public_url_base,
            } => {
                tokio::fs::create_dir_all(root).await?;
                tracing::info!(root = %root.display(), "object storage: local");
                Ok(ObjectStorage::Local {
                    root: root.clone(),
                    public_url_base: public_url_base.trim_end_matches('/').to_string(),
                })
            }
            StorageConfig::Disabled => Ok(ObjectStorage::Disabled),
        }
    }

    /// Store `body` under `key` and return its public URL.
    #[tracing::instrument(skip(self, body), fields(bytes = body.len()))]
    pub async fn put(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<String, StorageError> {
        match self {
            ObjectStorage::R2 {
                client,
                bucket,
                public_url_base,
            } => {
                client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .content_type(content_type)
                    .body(ByteStream::from(body))
                    .send()
                    .await
                    .map_err(|e| StorageError::Upload(DisplayErrorContext(&e).to_string()))?;
                Ok(format!("{public_url_base}/{key}"))
            }
            ObjectStorage::Local {
                root,
                public_url_base,
            } => {
                let path = root.join(key);
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent).await?;
                }
                tokio::fs::write(&path, body).await?;
                Ok(format!("{public_url_base}/{key}"))
            }
            ObjectStorage::Disabled => Err(StorageError::NotConfigured),
        }
    }

    /// Remove the object at `key`. A missing object is not an error.
    #[tracing::instrument(skip(self))]
    pub async fn delete(&self, key: &str) -> Result<(), StorageError> {
        match self {
            ObjectStorage::R2 { client, bucket, .. } => {
                match client.delete_object().bucket(bucket).key(key).send().await {
                    Ok(_) => Ok(()),
                    Err(err)
                        if err.raw_response().map(|r| r.status().as_u16()) == Some(404) =>
                    {
                        tracing::warn!(key, "object already absent");
                        Ok(())
                    }
                    Err(err) => Err(StorageError::Delete(DisplayErrorContext(&err).to_string())),
                }
            }
            ObjectStorage::Local { root, .. } => match tokio::fs::remove_file(root.join(key)).await
            {
                Ok(()) => Ok(()),
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    tracing::warn!(key, "object already absent");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            },
            ObjectStorage::Disabled => Err(StorageError::NotConfigured),
        }
    }
}

/// `{sanitized_user_name}/{returnId}/{returnId}_verification.mp4`
pub fn return_video_key(user_name: &str, return_id: &str) -> String {
    format!(
        "{}/{return_id}/{return_id}_verification.mp4",
        sanitize_object_segment(user_name)
    )
}

/// `job_applications/{applicationId}/{applicationId}_resume.pdf`
pub fn resume_key(application_id: &str) -> String {
    format!("job_applications/{application_id}/{application_id}_resume.pdf")
}

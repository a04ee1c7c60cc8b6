//! PostgreSQL content repository

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use crate::models::{BucketHandle, ContentRecord, EncryptedRecord, RecordId};
use crate::services::crypto::PayloadCipher;
use crate::utils::errors::{QuickyError, Result};
use super::ContentRepository;

#[derive(Clone, Debug)]
pub struct PgContentRepository {
    pool: PgPool,
    cipher: PayloadCipher,
}

impl PgContentRepository {
    pub fn new(pool: PgPool, cipher: PayloadCipher) -> Self {
        Self { pool, cipher }
    }

    async fn insert_bucket(&self, user_id: &str, bucket_name: &str) -> std::result::Result<BucketHandle, sqlx::Error> {
        sqlx::query_as::<_, BucketHandle>(
            r#"
            INSERT INTO storage_buckets (user_id, bucket_name, created_at)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, bucket_name, created_at
            "#
        )
        .bind(user_id)
        .bind(bucket_name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
    }
}

fn is_unique_violation(error: &sqlx::Error) -> bool {
    match error {
        sqlx::Error::Database(db_error) => db_error.is_unique_violation(),
        _ => false,
    }
}

#[async_trait]
impl ContentRepository for PgContentRepository {
    async fn ensure_bucket(&self, user_id: &str, bucket_name: &str) -> Result<BucketHandle> {
        if let Some(bucket) = self.find_bucket(user_id, bucket_name).await? {
            return Ok(bucket);
        }

        match self.insert_bucket(user_id, bucket_name).await {
            Ok(bucket) => {
                tracing::debug!(user_id = user_id, bucket = bucket_name, "Storage bucket created");
                Ok(bucket)
            }
            // Lost a race with a concurrent insert of the same bucket
            Err(e) if is_unique_violation(&e) => self
                .find_bucket(user_id, bucket_name)
                .await?
                .ok_or_else(|| QuickyError::BucketNotFound {
                    user_id: user_id.to_string(),
                    bucket_name: bucket_name.to_string(),
                }),
            Err(e) => Err(e.into()),
        }
    }

    async fn find_bucket(&self, user_id: &str, bucket_name: &str) -> Result<Option<BucketHandle>> {
        let bucket = sqlx::query_as::<_, BucketHandle>(
            "SELECT id, user_id, bucket_name, created_at FROM storage_buckets WHERE user_id = $1 AND bucket_name = $2"
        )
        .bind(user_id)
        .bind(bucket_name)
        .fetch_optional(&self.pool)
        .await?;

        Ok(bucket)
    }

    async fn append_record(
        &self,
        bucket: &BucketHandle,
        recorded_at: DateTime<Utc>,
        payload: &str,
    ) -> Result<RecordId> {
        let sealed = self.cipher.encrypt(payload)?;

        let id: RecordId = sqlx::query_scalar(
            r#"
            INSERT INTO storage_records (bucket_id, recorded_at, payload)
            VALUES ($1, $2, $3)
            RETURNING id
            "#
        )
        .bind(bucket.id)
        .bind(recorded_at)
        .bind(sealed)
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_records(&self, user_id: &str, bucket_name: &str) -> Result<Vec<ContentRecord>> {
        let bucket = self
            .find_bucket(user_id, bucket_name)
            .await?
            .ok_or_else(|| QuickyError::BucketNotFound {
                user_id: user_id.to_string(),
                bucket_name: bucket_name.to_string(),
            })?;

        let rows = sqlx::query_as::<_, EncryptedRecord>(
            "SELECT id, bucket_id, recorded_at, payload FROM storage_records WHERE bucket_id = $1 ORDER BY recorded_at ASC, id ASC"
        )
        .bind(bucket.id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter()
            .map(|row| {
                Ok(ContentRecord {
                    id: row.id,
                    recorded_at: row.recorded_at,
                    payload: self.cipher.decrypt(&row.payload)?,
                })
            })
            .collect()
    }

    async fn list_buckets(&self, user_id: &str) -> Result<Vec<BucketHandle>> {
        let buckets = sqlx::query_as::<_, BucketHandle>(
            "SELECT id, user_id, bucket_name, created_at FROM storage_buckets WHERE user_id = $1 ORDER BY created_at ASC, id ASC"
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(buckets)
    }

    async fn health_check(&self) -> Result<()> {
        crate::database::connection::health_check(&self.pool).await
    }
}

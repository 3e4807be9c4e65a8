use crate::binary_store::BinaryStore;
use crate::config::StorageConfig;
use anyhow::{Context, Result};
use async_trait::async_trait;
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use std::time::Duration;

/// S3バケットへの音声アップロード
///
/// put-objectで保存し、期限付きの署名付きGET URLを返す。
/// 認証情報はAWS SDKのデフォルトチェーン (環境変数、プロファイル等)
/// に従う。
pub struct S3Store {
    client: aws_sdk_s3::Client,
    bucket: String,
    presign_expiry: Duration,
}

impl S3Store {
    /// 設定からクライアントを作成
    ///
    /// # Errors
    ///
    /// バケットが未設定の場合にエラーを返す。
    pub async fn new(config: &StorageConfig) -> Result<Self> {
        if config.bucket.is_empty() {
            anyhow::bail!("S3バケットが設定されていません");
        }

        // AWS SDKクライアント初期化
        let sdk_config = match &config.region {
            Some(region) => {
                aws_config::defaults(aws_config::BehaviorVersion::latest())
                    .region(aws_config::Region::new(region.clone()))
                    .load()
                    .await
            }
            None => aws_config::load_defaults(aws_config::BehaviorVersion::latest()).await,
        };

        Ok(Self {
            client: aws_sdk_s3::Client::new(&sdk_config),
            bucket: config.bucket.clone(),
            presign_expiry: Duration::from_secs(config.presign_expiry_secs),
        })
    }
}

#[async_trait]
impl BinaryStore for S3Store {
    async fn store(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .with_context(|| format!("S3へのアップロードに失敗: {}", key))?;

        let presign = PresigningConfig::expires_in(self.presign_expiry)
            .context("署名付きURLの有効期限が不正")?;
        let request = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .presigned(presign)
            .await
            .with_context(|| format!("署名付きURLの生成に失敗: {}", key))?;

        log::info!("音声をアップロードしました: s3://{}/{}", self.bucket, key);
        Ok(request.uri().to_string())
    }
}

use anyhow::Result;
use async_trait::async_trait;

/// バイナリストレージの共通トレイト
///
/// キーを指定してオブジェクトを保存し、取得用の参照
/// (期限付きの署名付きURLなど) を返す。
#[async_trait]
pub trait BinaryStore: Send + Sync {
    /// オブジェクトを保存して取得用URLを返す
    ///
    /// # Arguments
    /// * `key` - オブジェクトキー
    /// * `bytes` - 保存するデータ
    /// * `content_type` - Content-Type (例: "audio/wav")
    async fn store(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<String>;
}

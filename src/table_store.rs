use crate::error::Error;
use crate::types::{AttemptRecord, CatalogRow, RecordId};
use async_trait::async_trait;

/// テーブルストレージの共通トレイト
///
/// カタログの取得と試行レコードの作成を提供する。
/// 本番実装はAirtableクライアント、テストではコール回数を数える
/// ダブルに差し替える。
#[async_trait]
pub trait TableStore: Send + Sync {
    /// 単語テーブルの全行を取得
    ///
    /// # Errors
    ///
    /// 非成功ステータスやレスポンスの解析失敗は
    /// [`Error::CatalogUnavailable`] になる。
    async fn list_words(&self) -> Result<Vec<CatalogRow>, Error>;

    /// 試行レコードを1件作成し、新しいレコードIDを返す
    ///
    /// # Errors
    ///
    /// 非成功ステータスは [`Error::RecordWriteFailed`] になり、
    /// ステータスとレスポンスボディをそのまま保持する。
    async fn create_attempt(&self, record: &AttemptRecord) -> Result<RecordId, Error>;
}

use thiserror::Error;

/// 送信ワークフローの失敗分類
///
/// どの失敗もユーザーに即座に提示され、自動リトライは行わない。
/// ドラフトは送信成功が確認されるまで破棄されない。
#[derive(Debug, Error)]
pub enum Error {
    /// 単語カタログのリモート取得に失敗した
    ///
    /// 呼び出し側は空のカタログとして縮退し、以後の選択と送信を
    /// 停止する。
    #[error("単語カタログを取得できません: {0}")]
    CatalogUnavailable(String),

    /// 選択された単語がIDマッピングに存在しない
    ///
    /// 正しく配線されたUIでは発生しないはずの内部整合性エラー。
    /// この送信は致命的として中断し、ネットワーク書き込みは一切
    /// 行わない。
    #[error("単語のレコードIDを解決できません: {0}")]
    UnknownWord(String),

    /// 音声のアップロード (またはペイロードの組み立て) に失敗した
    ///
    /// 送信全体を中断する。存在しない参照を持つレコードが
    /// 書き込まれることはない。
    #[error("音声のアップロードに失敗: {0}")]
    AudioUploadFailed(String),

    /// レコードの書き込みに失敗した
    ///
    /// ステータスとレスポンスボディを診断用にそのまま保持する。
    /// status 0 はHTTPレスポンスに至らなかったトランスポート層の
    /// 失敗を表す。
    #[error("記録の書き込みに失敗 (HTTP {status}): {body}")]
    RecordWriteFailed { status: u16, body: String },
}

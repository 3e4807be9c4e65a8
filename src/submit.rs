use crate::binary_store::BinaryStore;
use crate::catalog::WordCatalog;
use crate::error::Error;
use crate::table_store::TableStore;
use crate::types::{AttemptDraft, AttemptRecord, RecordId};

/// 送信コーディネーター
///
/// 単語IDの解決 → (任意の) 音声アップロード → レコード作成を
/// この順で実行する。途中のどの失敗でも残りのステップを中断し、
/// 部分的な副作用を残さない。アップロードに失敗したのにレコード
/// だけ書き込まれる、という状態は作らない。
///
/// ドラフトは借用のみで消費しない。失敗時にそのまま再送信できる。
pub struct SubmissionCoordinator<'a> {
    table: &'a dyn TableStore,
    storage: Option<&'a dyn BinaryStore>,
    key_prefix: &'a str,
}

impl<'a> SubmissionCoordinator<'a> {
    pub fn new(
        table: &'a dyn TableStore,
        storage: Option<&'a dyn BinaryStore>,
        key_prefix: &'a str,
    ) -> Self {
        Self {
            table,
            storage,
            key_prefix,
        }
    }

    /// ドラフトを1件送信する
    ///
    /// # Errors
    ///
    /// * [`Error::UnknownWord`] - IDを解決できない (ネットワーク
    ///   アクセスなしで中断)
    /// * [`Error::AudioUploadFailed`] - アップロード失敗 (レコードは
    ///   書き込まれない)
    /// * [`Error::RecordWriteFailed`] - 書き込み失敗 (ステータスと
    ///   ボディを保持)
    pub async fn submit(
        &self,
        catalog: &WordCatalog,
        draft: &AttemptDraft,
    ) -> Result<RecordId, Error> {
        // 1. レコードIDの解決
        //    マッピングはセッション毎に再構築されるため防御的に確認する
        let target = catalog
            .resolve(&draft.word.text)
            .ok_or_else(|| Error::UnknownWord(draft.word.text.clone()))?
            .clone();

        // 2. 音声ペイロードの組み立てとアップロード
        let recording_url = match &draft.audio {
            Some(source) => {
                let payload = source
                    .to_payload()
                    .map_err(|e| Error::AudioUploadFailed(format!("{:#}", e)))?;
                match (payload, self.storage) {
                    (Some(payload), Some(storage)) => {
                        let key =
                            derive_key(self.key_prefix, &draft.word.text, &payload.extension);
                        let url = storage
                            .store(&key, payload.bytes, &payload.content_type)
                            .await
                            .map_err(|e| Error::AudioUploadFailed(format!("{:#}", e)))?;
                        Some(url)
                    }
                    (Some(_), None) => {
                        log::warn!("バイナリストレージが無効のため音声なしで送信します");
                        None
                    }
                    (None, _) => None,
                }
            }
            None => None,
        };

        // 3. レコードの組み立て
        let record = AttemptRecord {
            target,
            mode: draft.mode,
            transcription: draft.transcription.clone(),
            outcome: draft.outcome,
            notes: draft.notes.clone(),
            recording_url,
        };

        // 4. 書き込み (1回のcreate呼び出し)
        let id = self.table.create_attempt(&record).await?;
        log::info!("発話を記録しました: {} → {}", draft.word.text, id);
        Ok(id)
    }
}

/// アップロード先のオブジェクトキーを導出
///
/// 単語と鮮度トークン (ミリ秒込みのUTCタイムスタンプ) の組で、
/// 同じ単語を扱う並行セッション同士が互いの録音を上書きしない
/// キーを作る。
fn derive_key(prefix: &str, word: &str, extension: &str) -> String {
    let stamp = chrono::Utc::now().format("%Y%m%d_%H%M%S_%3f");
    format!("{}/{}/{}_{}.{}", prefix, word, word, stamp, extension)
}

use crate::capture::AudioSource;
use serde::{Deserialize, Serialize};

/// 16ビット整数型のオーディオサンプル
///
/// PCM形式の音声データを表現するための型エイリアス。
/// -32768 から 32767 の範囲の値を取る。
pub type SampleI16 = i16;

/// テーブルストレージが割り当てるレコードID
///
/// このシステムにとっては不透明な識別子で、中身を解釈しない。
/// カタログ行の識別と、試行レコードのリンクフィールドにのみ使用する。
///
/// # Examples
///
/// ```
/// # use kotoba_log::types::RecordId;
/// let id = RecordId::new("recCRXiLOgFkl1kqr");
/// assert_eq!(id.as_str(), "recCRXiLOgFkl1kqr");
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct RecordId(String);

impl RecordId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// 練習対象の単語
///
/// カタログに保持される1単語。`text` はカタログ内で一意であり、
/// `remote_id` の検索キーとして使用する。セッション開始時に
/// 一度だけロードされ、以後は不変。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Word {
    /// 単語の文字列 (カタログ内で一意)
    pub text: String,

    /// 音韻カテゴリ (例: "Stops (P/B)")
    ///
    /// 元データに存在しない場合は "Other" が入る
    pub category: String,

    /// テーブルストレージ上のレコードID
    pub remote_id: RecordId,
}

/// 発話の引き出し方
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum ElicitationMode {
    /// 自発的な発話を誘導した
    Elicited,
    /// 大人の発話を模倣した
    Imitated,
}

impl ElicitationMode {
    /// ワイヤー上の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            ElicitationMode::Elicited => "Elicited",
            ElicitationMode::Imitated => "Imitated",
        }
    }
}

/// 発話試行の結果
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum Outcome {
    /// 正しく発話できた
    Success,
    /// 部分的に発話できた
    Partial,
    /// 発話しなかった
    #[serde(rename = "No Attempt")]
    NoAttempt,
}

impl Outcome {
    /// ワイヤー上の文字列表現
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success => "Success",
            Outcome::Partial => "Partial",
            Outcome::NoAttempt => "No Attempt",
        }
    }
}

/// 記入中の試行ドラフト
///
/// 単語が選択された時点で空の状態で作成され、ユーザーの入力に
/// 従ってフィールド単位で更新される。送信成功後に破棄されるか、
/// 別の単語を開始した時点で放棄される。
#[derive(Clone, Debug)]
pub struct AttemptDraft {
    /// 選択された対象単語
    pub word: Word,

    /// 誘導か模倣か
    pub mode: ElicitationMode,

    /// 実際の発話の書き起こし
    pub transcription: String,

    /// 試行の結果
    pub outcome: Outcome,

    /// 自由記述のメモ
    pub notes: String,

    /// 添付する音声 (任意、常に高々1つ)
    pub audio: Option<AudioSource>,
}

impl AttemptDraft {
    /// 選択された単語に対する空のドラフトを作成
    pub fn new(word: Word) -> Self {
        Self {
            word,
            mode: ElicitationMode::Elicited,
            transcription: String::new(),
            outcome: Outcome::Success,
            notes: String::new(),
            audio: None,
        }
    }

    /// 音声を添付する
    ///
    /// ドラフトに添付できる音声は高々1つ。既に音声がある場合は
    /// 追記ではなく置き換えになる。
    pub fn attach_audio(&mut self, source: AudioSource) {
        if self.audio.is_some() {
            log::info!("既存の音声を新しい音声で置き換えます");
        }
        self.audio = Some(source);
    }
}

/// テーブルストレージから取得した単語テーブルの1行
///
/// ワイヤー形式から切り離された中間表現。フィールドが欠けた行も
/// そのまま保持し、カタログ構築時にスキップ判定する。
#[derive(Clone, Debug)]
pub struct CatalogRow {
    /// レコードID
    pub id: String,

    /// 単語の文字列 (欠損あり)
    pub word: Option<String>,

    /// 音韻カテゴリ (欠損あり)
    pub sound_class: Option<String>,
}

/// 送信直前に組み立てる確定済みレコード
///
/// 単語IDの解決と音声アップロードが完了した後の、
/// テーブルストレージへ書き込む内容そのもの。
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttemptRecord {
    /// 対象単語のレコードID (解決済み)
    pub target: RecordId,

    /// 誘導か模倣か
    pub mode: ElicitationMode,

    /// 実際の発話の書き起こし
    pub transcription: String,

    /// 試行の結果
    pub outcome: Outcome,

    /// 自由記述のメモ
    pub notes: String,

    /// アップロード済み音声への署名付きURL (任意)
    pub recording_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::AudioSource;

    #[test]
    fn test_mode_and_outcome_wire_strings() {
        assert_eq!(ElicitationMode::Elicited.as_str(), "Elicited");
        assert_eq!(ElicitationMode::Imitated.as_str(), "Imitated");
        assert_eq!(Outcome::Success.as_str(), "Success");
        assert_eq!(Outcome::Partial.as_str(), "Partial");
        // 元テーブルの選択肢はスペース入り
        assert_eq!(Outcome::NoAttempt.as_str(), "No Attempt");
    }

    #[test]
    fn test_outcome_serde_rename() {
        let json = serde_json::to_string(&Outcome::NoAttempt).unwrap();
        assert_eq!(json, r#""No Attempt""#);
    }

    fn sample_word() -> Word {
        Word {
            text: "pig".to_string(),
            category: "Stops (P/B)".to_string(),
            remote_id: RecordId::new("rec001"),
        }
    }

    #[test]
    fn test_draft_defaults() {
        let draft = AttemptDraft::new(sample_word());
        assert_eq!(draft.mode, ElicitationMode::Elicited);
        assert_eq!(draft.outcome, Outcome::Success);
        assert!(draft.transcription.is_empty());
        assert!(draft.notes.is_empty());
        assert!(draft.audio.is_none());
    }

    #[test]
    fn test_attach_audio_replaces_previous() {
        let mut draft = AttemptDraft::new(sample_word());

        draft.attach_audio(AudioSource::FileUpload {
            bytes: vec![1, 2, 3],
            extension: "wav".to_string(),
        });
        draft.attach_audio(AudioSource::FileUpload {
            bytes: vec![9, 9],
            extension: "mp3".to_string(),
        });

        // 置き換えであって追記ではない
        match draft.audio {
            Some(AudioSource::FileUpload { ref bytes, ref extension }) => {
                assert_eq!(bytes, &vec![9, 9]);
                assert_eq!(extension, "mp3");
            }
            _ => panic!("音声が置き換えられていない"),
        }
    }
}

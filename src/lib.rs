//! kotoba-log - 構音練習の発話記録ツール
//!
//! このクレートは、練習対象の単語を選び、子どもの発話の試行を
//! 注釈 (誘導/模倣、書き起こし、結果、メモ) と任意の音声付きで
//! リモートのテーブルストレージ (Airtable) へ記録するツールを
//! 提供します。
//!
//! # 主な機能
//!
//! - **単語カタログ**: 組み込みの単語表、またはセッション開始時に
//!   リモートの単語テーブルから一度だけ取得
//! - **選択戦略**: ランダム / カテゴリ内ランダム / 一覧からの明示選択。
//!   一度選ばれた単語は送信成功か明示的な破棄まで固定される
//! - **音声キャプチャ**: ファイルアップロードとマイク収録を同じ
//!   抽象で扱い、収録は無音検出で自動終了。送信直前に一括で
//!   WAVコンテナへ変換
//! - **送信コーディネーター**: ID解決 → 音声アップロード →
//!   レコード作成を順に実行し、途中の失敗で全体を中断
//!   (孤児アップロードを参照するレコードは書き込まれない)
//!
//! # アーキテクチャ
//!
//! ```text
//! [WordCatalog] → [selector] → [Session (AttemptDraft)]
//!                                     ↓
//!                       [MicInput] → [CaptureBuffer]
//!                                     ↓
//!                          [SubmissionCoordinator]
//!                              ↓             ↓
//!                        [BinaryStore]  [TableStore]
//!                          (S3)          (Airtable)
//! ```
//!
//! # 使用例
//!
//! ```no_run
//! use kotoba_log::catalog::WordCatalog;
//! use kotoba_log::selector::{self, SelectionStrategy};
//!
//! let catalog = WordCatalog::builtin();
//! let word = selector::select(&catalog, &SelectionStrategy::Random).unwrap();
//! println!("{} ({})", word.text, word.category);
//! ```

pub mod airtable;
pub mod binary_store;
pub mod capture;
pub mod catalog;
pub mod config;
pub mod error;
pub mod mic;
pub mod s3_store;
pub mod selector;
pub mod session;
pub mod silence;
pub mod submit;
pub mod table_store;
pub mod types;

use crate::types::{CatalogRow, RecordId, Word};
use std::collections::HashMap;

/// カテゴリが欠損している行に与える既定カテゴリ
pub const DEFAULT_CATEGORY: &str = "Other";

/// 組み込みの静的な単語表
///
/// (単語, 音韻カテゴリ, レコードID) の3つ組。リモート取得を使わない
/// 構成でもツールが動くように、テーブルストレージ側の初期データと
/// 同じ内容を保持している。
const BUILTIN_WORDS: &[(&str, &str, &str)] = &[
    ("pig", "Stops (P/B)", "recCRXiLOgFkl1kqr"),
    ("ball", "Stops (P/B)", "recQF2QcxHd1qytcE"),
    ("cup", "Stops (P/K)", "recNlsLOZgbisgBkN"),
    ("dog", "Stops (T/D)", "recRtwdBvNTAR9zZg"),
    ("cat", "Stops (T/D)", "recwotmBqv6EznIjz"),
    ("go", "Velars (K/G)", "recixx9q5tYxW8x0D"),
    ("happy", "Other", "reczz2JDNtkJD0CA2"),
    ("baby", "Stops (P/B)", "recFAvAK12XZWDsOh"),
    ("tiger", "Other", "recxMD5Zm3lzyNDUX"),
    ("bucket", "Other", "recCqTnD3PWRl6D8e"),
    ("mum", "Nasals (M/N)", "rec67ZL9K4eVeyLMz"),
    ("nose", "Nasals (M/N)", "recU4Rn8HZiGPoDcC"),
    ("jam", "Affricates", "recidStqZqkLZ2KQQ"),
    ("fish", "Fricatives (F/V)", "rec2Rz2gkDZDRMyok"),
    ("van", "Fricatives (F/V)", "rec83pqkZbHG1pEvm"),
    ("sun", "Fricatives (S/Z)", "recN2RtS3dMYjWcT5"),
    ("zoo", "Fricatives (S/Z)", "recEomjztOrr2RcvI"),
    ("shoe", "Fricatives (SH)", "recGS7X1DczP9Pywu"),
    ("brush", "Fricatives (S/Z)", "recZAfkOUf6WqMvoM"),
    ("chair", "Affricates", "recz6Hc0HLVGcM9Bq"),
    ("water", "Glides (W/Y)", "recjUZF99cnQMTll1"),
    ("yellow", "Glides (W/Y)", "rec24IEuD5gMXkpa4"),
];

/// 練習単語のカタログ
///
/// セッション開始時に一度だけ構築され、以後は読み取り専用。
/// 単語の文字列からレコードIDを解決するためのインデックスを
/// 合わせて保持する。
///
/// # Examples
///
/// ```
/// # use kotoba_log::catalog::WordCatalog;
/// let catalog = WordCatalog::builtin();
/// assert!(!catalog.is_empty());
/// assert!(catalog.resolve("pig").is_some());
/// ```
#[derive(Clone, Debug, Default)]
pub struct WordCatalog {
    words: Vec<Word>,
    index: HashMap<String, usize>,
}

impl WordCatalog {
    /// 空のカタログを作成
    ///
    /// リモート取得に失敗した場合の縮退先。選択も送信もできない。
    pub fn new() -> Self {
        Self::default()
    }

    /// 取得した行からカタログを構築
    ///
    /// 単語文字列のない行はスキップし、残りの行だけで構築する
    /// (1行の不備でロード全体を失敗させない)。カテゴリが欠けて
    /// いる行には既定カテゴリを与える。
    ///
    /// 単語が重複した場合は後の行が勝ち、1つの文字列が2つのIDに
    /// 解決されることはない。
    pub fn from_rows(rows: Vec<CatalogRow>) -> Self {
        let mut catalog = Self::new();

        for row in rows {
            let text = match row.word {
                Some(word) if !word.trim().is_empty() => word.trim().to_string(),
                _ => {
                    log::warn!("単語名のない行をスキップ: {}", row.id);
                    continue;
                }
            };

            let category = match row.sound_class {
                Some(class) if !class.trim().is_empty() => class.trim().to_string(),
                _ => DEFAULT_CATEGORY.to_string(),
            };

            catalog.insert(Word {
                text,
                category,
                remote_id: RecordId::new(row.id),
            });
        }

        catalog
    }

    /// 組み込みの単語表からカタログを構築
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for &(text, category, record_id) in BUILTIN_WORDS {
            catalog.insert(Word {
                text: text.to_string(),
                category: category.to_string(),
                remote_id: RecordId::new(record_id),
            });
        }
        catalog
    }

    fn insert(&mut self, word: Word) {
        match self.index.get(&word.text) {
            Some(&position) => {
                log::warn!("重複する単語を後の行で上書き: {}", word.text);
                self.words[position] = word;
            }
            None => {
                self.index.insert(word.text.clone(), self.words.len());
                self.words.push(word);
            }
        }
    }

    /// カタログ内の全単語 (ロード順)
    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// 単語の文字列から単語を取得
    pub fn get(&self, text: &str) -> Option<&Word> {
        self.index.get(text).map(|&position| &self.words[position])
    }

    /// 単語の文字列からレコードIDを解決
    pub fn resolve(&self, text: &str) -> Option<&RecordId> {
        self.get(text).map(|word| &word.remote_id)
    }

    /// 選択フィルタ用のカテゴリ一覧
    ///
    /// 全単語のカテゴリから重複を除き、ソートして返す。
    pub fn categories(&self) -> Vec<String> {
        let mut categories: Vec<String> = self
            .words
            .iter()
            .map(|word| word.category.clone())
            .collect();
        categories.sort();
        categories.dedup();
        categories
    }

    /// 手動選択用にソート済みの単語文字列一覧
    pub fn sorted_texts(&self) -> Vec<&str> {
        let mut texts: Vec<&str> = self.words.iter().map(|word| word.text.as_str()).collect();
        texts.sort_unstable();
        texts
    }
}

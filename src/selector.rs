use crate::catalog::WordCatalog;
use crate::types::Word;
use rand::seq::SliceRandom;

/// 単語の選択戦略
///
/// ランダム / カテゴリ内ランダム / 一覧からの明示選択 の3方式。
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectionStrategy {
    /// カタログ全体から一様ランダムに選ぶ
    Random,
    /// 指定カテゴリに絞ってから一様ランダムに選ぶ
    ///
    /// カテゴリはカタログ由来の一覧から渡す前提で、
    /// 存在チェックはここでは行わない (呼び出し側の責務)。
    ByCategory { category: String },
    /// 単語の文字列で明示的に選ぶ
    Manual { text: String },
}

/// カタログと戦略から単語を1つ選ぶ
///
/// カタログと戦略に対する純粋な関数で、副作用を持たない。
/// ただしランダム選択はプロセス共通の乱数源から引く
/// (再現性は要求しない)。
///
/// 該当する単語がない場合は None を返す:
/// - `Random`: カタログが空のときのみ
/// - `ByCategory`: 絞り込み後の集合が空のとき
/// - `Manual`: 指定の文字列がカタログにないとき
pub fn select<'a>(catalog: &'a WordCatalog, strategy: &SelectionStrategy) -> Option<&'a Word> {
    match strategy {
        SelectionStrategy::Random => catalog.words().choose(&mut rand::thread_rng()),
        SelectionStrategy::ByCategory { category } => {
            let narrowed: Vec<&Word> = catalog
                .words()
                .iter()
                .filter(|word| &word.category == category)
                .collect();
            narrowed.choose(&mut rand::thread_rng()).copied()
        }
        SelectionStrategy::Manual { text } => catalog.get(text),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogRow;

    fn stops_and_fricatives() -> WordCatalog {
        let rows = vec![
            CatalogRow {
                id: "rec1".to_string(),
                word: Some("pig".to_string()),
                sound_class: Some("Stops".to_string()),
            },
            CatalogRow {
                id: "rec2".to_string(),
                word: Some("cat".to_string()),
                sound_class: Some("Stops".to_string()),
            },
            CatalogRow {
                id: "rec3".to_string(),
                word: Some("sun".to_string()),
                sound_class: Some("Fricatives".to_string()),
            },
        ];
        WordCatalog::from_rows(rows)
    }

    #[test]
    fn test_random_never_none_on_nonempty_catalog() {
        let catalog = stops_and_fricatives();
        for _ in 0..100 {
            assert!(select(&catalog, &SelectionStrategy::Random).is_some());
        }
    }

    #[test]
    fn test_random_always_none_on_empty_catalog() {
        let catalog = WordCatalog::new();
        for _ in 0..10 {
            assert!(select(&catalog, &SelectionStrategy::Random).is_none());
        }
    }

    #[test]
    fn test_by_category_only_returns_matching_words() {
        let catalog = stops_and_fricatives();
        let strategy = SelectionStrategy::ByCategory {
            category: "Stops".to_string(),
        };

        // Stops からは pig か cat だけが出る。sun は決して出ない
        for _ in 0..100 {
            let word = select(&catalog, &strategy).unwrap();
            assert_eq!(word.category, "Stops");
            assert!(word.text == "pig" || word.text == "cat");
        }
    }

    #[test]
    fn test_by_category_none_when_narrowed_set_empty() {
        let catalog = stops_and_fricatives();
        let strategy = SelectionStrategy::ByCategory {
            category: "Nasals".to_string(),
        };
        assert!(select(&catalog, &strategy).is_none());
    }

    #[test]
    fn test_manual_selection_is_idempotent() {
        let catalog = stops_and_fricatives();
        let strategy = SelectionStrategy::Manual {
            text: "sun".to_string(),
        };

        let first = select(&catalog, &strategy).unwrap();
        let second = select(&catalog, &strategy).unwrap();
        assert_eq!(first.remote_id, second.remote_id);
    }

    #[test]
    fn test_manual_none_for_unknown_text() {
        let catalog = stops_and_fricatives();
        let strategy = SelectionStrategy::Manual {
            text: "zebra".to_string(),
        };
        assert!(select(&catalog, &strategy).is_none());
    }
}

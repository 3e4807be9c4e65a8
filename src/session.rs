use crate::catalog::WordCatalog;
use crate::selector::{self, SelectionStrategy};
use crate::types::{AttemptDraft, Word};

/// 1回の試行サイクルのセッション状態
///
/// 現在の単語と記入中のドラフトをまとめて保持する値オブジェクト。
/// グローバル変数の代わりに各ステップへ明示的に渡す。
///
/// 選択の固定ルール: 一度単語が選ばれたら、送信成功
/// ([`Session::complete`]) か明示的な破棄 ([`Session::discard`]) まで
/// 以後の選択要求で上書きされない。画面の再描画や再入力のたびに
/// ランダム選択が引き直されるのを防ぐ。
#[derive(Debug, Default)]
pub struct Session {
    draft: Option<AttemptDraft>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// アクティブなドラフトがなければ戦略に従って単語を選択する
    ///
    /// 既にドラフトがある場合は選択を引き直さず、保持中の単語を
    /// そのまま返す。新しい選択が行われた時点で空のドラフトが
    /// 作成される。
    ///
    /// # Returns
    ///
    /// 保持中または新たに選択された単語。戦略が単語を返せなかった
    /// 場合は None。
    pub fn ensure_selected(
        &mut self,
        catalog: &WordCatalog,
        strategy: &SelectionStrategy,
    ) -> Option<&Word> {
        if self.draft.is_none() {
            let word = selector::select(catalog, strategy)?.clone();
            log::info!("単語を選択: {} ({})", word.text, word.category);
            self.draft = Some(AttemptDraft::new(word));
        }
        self.draft.as_ref().map(|draft| &draft.word)
    }

    /// 記入中のドラフト
    pub fn draft(&self) -> Option<&AttemptDraft> {
        self.draft.as_ref()
    }

    /// 記入中のドラフト (可変)
    pub fn draft_mut(&mut self) -> Option<&mut AttemptDraft> {
        self.draft.as_mut()
    }

    /// 現在選択されている単語
    pub fn current_word(&self) -> Option<&Word> {
        self.draft.as_ref().map(|draft| &draft.word)
    }

    /// 送信成功後のリセット
    ///
    /// ドラフトと選択状態を解除する唯一の正常経路。
    pub fn complete(&mut self) {
        self.draft = None;
    }

    /// ドラフトの明示的な破棄
    ///
    /// 送信せずに別の単語を始める場合に使う。
    pub fn discard(&mut self) {
        if let Some(draft) = self.draft.take() {
            log::warn!("ドラフトを破棄: {}", draft.word.text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::CatalogRow;

    fn small_catalog() -> WordCatalog {
        let rows = vec![
            CatalogRow {
                id: "rec1".to_string(),
                word: Some("pig".to_string()),
                sound_class: Some("Stops".to_string()),
            },
            CatalogRow {
                id: "rec2".to_string(),
                word: Some("sun".to_string()),
                sound_class: Some("Fricatives".to_string()),
            },
        ];
        WordCatalog::from_rows(rows)
    }

    #[test]
    fn test_selection_is_sticky_across_cycles() {
        let catalog = small_catalog();
        let mut session = Session::new();

        let first = session
            .ensure_selected(&catalog, &SelectionStrategy::Random)
            .unwrap()
            .text
            .clone();

        // 再描画サイクルを模して繰り返し呼んでも選択は変わらない
        for _ in 0..50 {
            let held = session
                .ensure_selected(&catalog, &SelectionStrategy::Random)
                .unwrap();
            assert_eq!(held.text, first);
        }
    }

    #[test]
    fn test_strategy_change_does_not_override_active_selection() {
        let catalog = small_catalog();
        let mut session = Session::new();

        assert!(session
            .ensure_selected(
                &catalog,
                &SelectionStrategy::Manual {
                    text: "pig".to_string(),
                },
            )
            .is_some());
        let held = session
            .ensure_selected(
                &catalog,
                &SelectionStrategy::Manual {
                    text: "sun".to_string(),
                },
            )
            .unwrap();
        assert_eq!(held.text, "pig");
    }

    #[test]
    fn test_complete_clears_selection() {
        let catalog = small_catalog();
        let mut session = Session::new();

        assert!(session
            .ensure_selected(
                &catalog,
                &SelectionStrategy::Manual {
                    text: "pig".to_string(),
                },
            )
            .is_some());
        session.complete();
        assert!(session.draft().is_none());
        assert!(session.current_word().is_none());

        // リセット後は新しい選択ができる
        let next = session
            .ensure_selected(
                &catalog,
                &SelectionStrategy::Manual {
                    text: "sun".to_string(),
                },
            )
            .unwrap();
        assert_eq!(next.text, "sun");
    }

    #[test]
    fn test_discard_clears_selection() {
        let catalog = small_catalog();
        let mut session = Session::new();

        assert!(session
            .ensure_selected(&catalog, &SelectionStrategy::Random)
            .is_some());
        session.discard();
        assert!(session.draft().is_none());
    }

    #[test]
    fn test_empty_catalog_yields_no_selection() {
        let catalog = WordCatalog::new();
        let mut session = Session::new();
        assert!(session
            .ensure_selected(&catalog, &SelectionStrategy::Random)
            .is_none());
        assert!(session.draft().is_none());
    }
}

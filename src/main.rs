use anyhow::{Context, Result};
use env_logger::Env;
use kotoba_log::airtable::AirtableClient;
use kotoba_log::binary_store::BinaryStore;
use kotoba_log::capture::{self, AudioSource};
use kotoba_log::catalog::WordCatalog;
use kotoba_log::config::{CatalogSource, Config};
use kotoba_log::error::Error;
use kotoba_log::mic::MicInput;
use kotoba_log::s3_store::S3Store;
use kotoba_log::selector::SelectionStrategy;
use kotoba_log::session::Session;
use kotoba_log::submit::SubmissionCoordinator;
use kotoba_log::table_store::TableStore;
use kotoba_log::types::{ElicitationMode, Outcome};
use std::io::{self, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    // ロガーを初期化
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .init();

    // コマンドライン引数をパース
    let args: Vec<String> = std::env::args().collect();

    // デバイス一覧表示モード
    if args.len() > 1 && args[1] == "--list-devices" {
        MicInput::list_devices()?;
        return Ok(());
    }

    // 設定ファイル生成モード
    if args.len() > 1 && args[1] == "--generate-config" {
        let config_path = if args.len() > 2 {
            &args[2]
        } else {
            "config.toml"
        };
        Config::write_default(config_path)?;
        println!("設定ファイルを生成しました: {}", config_path);
        return Ok(());
    }

    // 設定ファイルのパス
    let config_path = if args.len() > 1 && !args[1].starts_with("--") {
        &args[1]
    } else {
        "config.toml"
    };

    // 設定を読み込み
    let config = Config::load_or_default(config_path)?;

    log::info!("kotoba-log を起動します");

    // Ctrl+C ハンドラを設定
    let running = Arc::new(AtomicBool::new(true));
    let running_clone = running.clone();
    ctrlc::set_handler(move || {
        log::info!("停止シグナルを受信しました...");
        running_clone.store(false, Ordering::SeqCst);
    })?;

    // テーブルストレージクライアント
    let table = AirtableClient::new(&config.airtable)?;

    // カタログをロード (取得失敗時は空のカタログへ縮退)
    let catalog = match config.catalog.source {
        CatalogSource::Builtin => WordCatalog::builtin(),
        CatalogSource::Remote => match table.list_words().await {
            Ok(rows) => WordCatalog::from_rows(rows),
            Err(e) => {
                log::error!("{}", e);
                WordCatalog::new()
            }
        },
    };

    if catalog.is_empty() {
        println!("利用可能な単語がありません。終了します。");
        return Ok(());
    }
    log::info!(
        "カタログ: {} 単語, {} カテゴリ",
        catalog.len(),
        catalog.categories().len()
    );

    // バイナリストレージ (任意)
    let storage = if config.storage.enabled {
        Some(S3Store::new(&config.storage).await?)
    } else {
        None
    };
    let storage_ref: Option<&dyn BinaryStore> = storage.as_ref().map(|s| s as &dyn BinaryStore);
    let coordinator = SubmissionCoordinator::new(&table, storage_ref, &config.storage.key_prefix);

    let mut session = Session::new();

    while running.load(Ordering::SeqCst) {
        println!();
        let Some(strategy) = prompt_strategy(&catalog)? else {
            break;
        };

        let (word_text, word_category) = match session.ensure_selected(&catalog, &strategy) {
            Some(word) => (word.text.clone(), word.category.clone()),
            None => {
                println!("該当する単語がありません。別の方法を選んでください。");
                continue;
            }
        };
        println!();
        println!("=== 選択された単語: {} ({}) ===", word_text, word_category);

        // 音声 (任意)
        if let Some(source) = prompt_audio(&config, running.as_ref()).await? {
            if let Some(draft) = session.draft_mut() {
                draft.attach_audio(source);
            }
        }

        // 注釈フィールド
        let mode = prompt_mode()?;
        let transcription = prompt_line("実際の発話 (聞こえたまま)")?;
        let outcome = prompt_outcome()?;
        let notes = prompt_line("メモ")?;

        if let Some(draft) = session.draft_mut() {
            draft.mode = mode;
            draft.transcription = transcription;
            draft.outcome = outcome;
            draft.notes = notes;
        }

        // 確認と送信
        if !prompt_yes_no("この内容で送信しますか?")? {
            if prompt_yes_no("ドラフトを破棄して別の単語にしますか?")? {
                session.discard();
            }
            continue;
        }

        let mut submitted = false;
        while running.load(Ordering::SeqCst) {
            let draft = session.draft().context("送信対象のドラフトがありません")?;
            match coordinator.submit(&catalog, draft).await {
                Ok(id) => {
                    println!("✔ 発話を記録しました: {}", id);
                    submitted = true;
                    break;
                }
                Err(Error::RecordWriteFailed { status, body }) => {
                    println!("✘ 記録の書き込みに失敗しました (HTTP {})", status);
                    println!("{}", body);
                }
                Err(e) => {
                    println!("✘ {}", e);
                }
            }
            // 失敗してもドラフトは保持されている。リトライは手動のみ
            if !prompt_yes_no("再送信しますか?")? {
                break;
            }
        }
        if submitted {
            session.complete();
        }
    }

    log::info!("kotoba-log を終了しました");
    Ok(())
}

/// ラベルを表示して1行読む
fn prompt_line(label: &str) -> Result<String> {
    print!("{}: ", label);
    io::stdout().flush().context("標準出力のフラッシュに失敗")?;
    let mut line = String::new();
    let bytes = io::stdin()
        .read_line(&mut line)
        .context("標準入力の読み取りに失敗")?;
    if bytes == 0 {
        anyhow::bail!("入力が閉じられました");
    }
    Ok(line.trim().to_string())
}

/// 番号付きの選択肢から1つ選ぶ
fn prompt_choice(label: &str, options: &[String]) -> Result<usize> {
    println!("{}", label);
    for (idx, option) in options.iter().enumerate() {
        println!("  [{}] {}", idx + 1, option);
    }
    loop {
        let input = prompt_line("番号")?;
        match input.parse::<usize>() {
            Ok(n) if (1..=options.len()).contains(&n) => return Ok(n - 1),
            _ => println!("1 から {} の番号を入力してください", options.len()),
        }
    }
}

fn prompt_yes_no(label: &str) -> Result<bool> {
    loop {
        let input = prompt_line(&format!("{} [y/n]", label))?;
        match input.to_ascii_lowercase().as_str() {
            "y" | "yes" => return Ok(true),
            "n" | "no" => return Ok(false),
            _ => println!("y か n を入力してください"),
        }
    }
}

/// 選択戦略を決める。None は終了
fn prompt_strategy(catalog: &WordCatalog) -> Result<Option<SelectionStrategy>> {
    println!("単語の選択方法:");
    println!("  [1] ランダム");
    println!("  [2] カテゴリから");
    println!("  [3] 一覧から選択");
    println!("  [q] 終了");
    loop {
        let input = prompt_line("選択")?;
        match input.as_str() {
            "1" => return Ok(Some(SelectionStrategy::Random)),
            "2" => {
                let categories = catalog.categories();
                let idx = prompt_choice("カテゴリ:", &categories)?;
                return Ok(Some(SelectionStrategy::ByCategory {
                    category: categories[idx].clone(),
                }));
            }
            "3" => {
                let texts: Vec<String> = catalog
                    .sorted_texts()
                    .iter()
                    .map(|text| text.to_string())
                    .collect();
                let idx = prompt_choice("単語:", &texts)?;
                return Ok(Some(SelectionStrategy::Manual {
                    text: texts[idx].clone(),
                }));
            }
            "q" | "Q" => return Ok(None),
            _ => println!("1 / 2 / 3 / q を入力してください"),
        }
    }
}

/// 音声の取得方法を選んで AudioSource を作る。None は音声なし
async fn prompt_audio(config: &Config, running: &AtomicBool) -> Result<Option<AudioSource>> {
    println!("音声:");
    println!("  [1] マイクで収録");
    println!("  [2] ファイルを指定");
    println!("  [3] 音声なし");
    loop {
        let input = prompt_line("選択")?;
        match input.as_str() {
            "1" => {
                let mut mic = match MicInput::new(&config.audio) {
                    Ok(mic) => mic,
                    Err(e) => {
                        log::error!("マイクを開けません: {:#}", e);
                        println!("マイクを開けませんでした。音声なしで続行します。");
                        return Ok(None);
                    }
                };
                println!("どうぞ話してください...");
                let buffer = capture::record_segment(
                    &mut mic,
                    &config.capture,
                    config.audio.sample_rate,
                    running,
                )
                .await?;
                if buffer.is_empty() {
                    println!("何も収録されませんでした。音声なしとして扱います。");
                } else {
                    println!("収録しました ({:.2}秒)", buffer.duration_seconds());
                }
                return Ok(Some(AudioSource::BufferedStream(buffer)));
            }
            "2" => {
                let path_input = prompt_line("ファイルパス")?;
                let path = Path::new(&path_input);
                let bytes = match std::fs::read(path) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        println!("ファイルを読めません: {}", e);
                        continue;
                    }
                };
                let extension = path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .unwrap_or("wav")
                    .to_string();
                return Ok(Some(AudioSource::FileUpload { bytes, extension }));
            }
            "3" => return Ok(None),
            _ => println!("1 / 2 / 3 を入力してください"),
        }
    }
}

fn prompt_mode() -> Result<ElicitationMode> {
    let options = vec![
        "誘導 (Elicited)".to_string(),
        "模倣 (Imitated)".to_string(),
    ];
    match prompt_choice("誘導か模倣か:", &options)? {
        0 => Ok(ElicitationMode::Elicited),
        _ => Ok(ElicitationMode::Imitated),
    }
}

fn prompt_outcome() -> Result<Outcome> {
    let options = vec![
        "成功 (Success)".to_string(),
        "部分的 (Partial)".to_string(),
        "試行なし (No Attempt)".to_string(),
    ];
    match prompt_choice("結果:", &options)? {
        0 => Ok(Outcome::Success),
        1 => Ok(Outcome::Partial),
        _ => Ok(Outcome::NoAttempt),
    }
}

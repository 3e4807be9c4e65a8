use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub audio: AudioConfig,
    #[serde(default)]
    pub capture: CaptureConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub airtable: AirtableConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// オーディオ入力設定
///
/// マイクからの収録に関する設定。収録は常にモノラルで行う。
///
/// # デフォルト値
///
/// - `device_id`: "default" (システムのデフォルトデバイス)
/// - `sample_rate`: 16000 Hz (音声記録には十分な帯域)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AudioConfig {
    #[serde(default = "default_device_id")]
    pub device_id: String,
    #[serde(default = "default_sample_rate")]
    pub sample_rate: u32,
}

/// 収録セグメントの終了判定設定
///
/// 無音ベースのカットオフに関する設定。
///
/// # デフォルト値
///
/// - `silence_threshold_db`: -40.0 dB
/// - `trailing_silence_ms`: 1500 ms (この長さの無音で収録終了)
/// - `max_duration_secs`: 15 秒 (無音が来なくても打ち切る上限)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CaptureConfig {
    #[serde(default = "default_silence_threshold_db")]
    pub silence_threshold_db: f32,
    #[serde(default = "default_trailing_silence_ms")]
    pub trailing_silence_ms: u32,
    #[serde(default = "default_max_duration_secs")]
    pub max_duration_secs: u64,
}

/// カタログの取得元
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum CatalogSource {
    /// 組み込みの静的な単語表
    Builtin,
    /// テーブルストレージの単語テーブルからセッション開始時に取得
    Remote,
}

/// カタログ設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_source")]
    pub source: CatalogSource,
}

/// Airtable (テーブルストレージ) 設定
///
/// # デフォルト値
///
/// - `words_table`: "Words"
/// - `attempts_table`: "Attempts"
/// - `timeout_seconds`: 30 秒
///
/// # 認証
///
/// `token` は環境変数 `AIRTABLE_TOKEN` が設定されていれば
/// そちらが優先される。設定ファイルに書くのは避け、環境変数を
/// 使うことを推奨。
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AirtableConfig {
    /// Bearerトークン (空なら環境変数 AIRTABLE_TOKEN を使用)
    #[serde(default)]
    pub token: String,
    /// ベースID (例: "appXXXXXXXXXXXXXX")
    #[serde(default)]
    pub base_id: String,
    #[serde(default = "default_words_table")]
    pub words_table: String,
    #[serde(default = "default_attempts_table")]
    pub attempts_table: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl AirtableConfig {
    /// 有効なトークンを解決する
    ///
    /// 環境変数 `AIRTABLE_TOKEN` → 設定ファイルの順に探し、
    /// どちらも空なら None を返す。
    pub fn resolve_token(&self) -> Option<String> {
        match std::env::var("AIRTABLE_TOKEN") {
            Ok(token) if !token.is_empty() => Some(token),
            _ if !self.token.is_empty() => Some(self.token.clone()),
            _ => None,
        }
    }
}

/// バイナリストレージ (S3) 設定
///
/// 収録音声のアップロード先。`enabled` が false の場合、
/// 音声は送信されず記録のみが書き込まれる。
///
/// # デフォルト値
///
/// - `enabled`: false
/// - `key_prefix`: "attempts"
/// - `presign_expiry_secs`: 3600 秒 (署名付きURLの有効期限)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub enabled: bool,
    #[serde(default)]
    pub bucket: String,
    /// リージョン (未指定なら環境のデフォルトチェーンに従う)
    pub region: Option<String>,
    #[serde(default = "default_key_prefix")]
    pub key_prefix: String,
    #[serde(default = "default_presign_expiry_secs")]
    pub presign_expiry_secs: u64,
}

/// 出力設定
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct OutputConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

// Default functions
fn default_device_id() -> String {
    "default".to_string()
}

fn default_sample_rate() -> u32 {
    16000
}

fn default_silence_threshold_db() -> f32 {
    -40.0
}

fn default_trailing_silence_ms() -> u32 {
    1500
}

fn default_max_duration_secs() -> u64 {
    15
}

fn default_catalog_source() -> CatalogSource {
    CatalogSource::Builtin
}

fn default_words_table() -> String {
    "Words".to_string()
}

fn default_attempts_table() -> String {
    "Attempts".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_key_prefix() -> String {
    "attempts".to_string()
}

fn default_presign_expiry_secs() -> u64 {
    3600
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            audio: AudioConfig::default(),
            capture: CaptureConfig::default(),
            catalog: CatalogConfig::default(),
            airtable: AirtableConfig::default(),
            storage: StorageConfig::default(),
            output: OutputConfig::default(),
        }
    }
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device_id: default_device_id(),
            sample_rate: default_sample_rate(),
        }
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            silence_threshold_db: default_silence_threshold_db(),
            trailing_silence_ms: default_trailing_silence_ms(),
            max_duration_secs: default_max_duration_secs(),
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            source: default_catalog_source(),
        }
    }
}

impl Default for AirtableConfig {
    fn default() -> Self {
        Self {
            token: String::new(),
            base_id: String::new(),
            words_table: default_words_table(),
            attempts_table: default_attempts_table(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            bucket: String::new(),
            region: None,
            key_prefix: default_key_prefix(),
            presign_expiry_secs: default_presign_expiry_secs(),
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl Config {
    /// 設定ファイルから読み込み
    ///
    /// TOML形式の設定ファイルをパースしてConfig構造体を生成する。
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルの読み込みまたはパースに失敗した場合にエラーを返す。
    ///
    /// # Examples
    ///
    /// ```no_run
    /// # use kotoba_log::config::Config;
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("設定ファイルの読み込みに失敗: {:?}", path.as_ref()))?;
        let config: Config =
            toml::from_str(&content).with_context(|| "設定ファイルのパースに失敗")?;
        Ok(config)
    }

    /// デフォルト設定をファイルに書き出し
    ///
    /// デフォルト値を持つ設定ファイルを生成する。
    /// 既存のファイルは上書きされる。
    ///
    /// # Arguments
    ///
    /// * `path` - 出力先のパス
    ///
    /// # Errors
    ///
    /// ファイルの書き込みに失敗した場合にエラーを返す。
    pub fn write_default<P: AsRef<Path>>(path: P) -> Result<()> {
        let config = Config::default();
        let content =
            toml::to_string_pretty(&config).with_context(|| "設定のシリアライズに失敗")?;
        fs::write(path.as_ref(), content)
            .with_context(|| format!("設定ファイルの書き込みに失敗: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// 設定ファイルがあれば読み込み、なければデフォルトを使用
    ///
    /// # Arguments
    ///
    /// * `path` - 設定ファイルのパス
    ///
    /// # Errors
    ///
    /// ファイルが存在するがパースに失敗した場合にエラーを返す。
    /// ファイルが存在しない場合はエラーにならず、デフォルト設定を返す。
    pub fn load_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::from_file(path)
        } else {
            log::warn!(
                "設定ファイルが見つかりません。デフォルト設定を使用します: {:?}",
                path.as_ref()
            );
            Ok(Config::default())
        }
    }
}

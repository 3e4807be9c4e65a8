use crate::config::AirtableConfig;
use crate::error::Error;
use crate::table_store::TableStore;
use crate::types::{AttemptRecord, CatalogRow, RecordId};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

const API_BASE: &str = "https://api.airtable.com/v0";

/// Airtable REST APIクライアント
///
/// 単語テーブルのlist-recordsと試行テーブルのcreate-recordを
/// 型付きのワイヤー構造体で扱い、動的なフィールド名への
/// アクセスをこのモジュール内に閉じ込める。
///
/// タイムアウトはクライアント全体に設定する。リトライは行わず、
/// 失敗は即座に呼び出し側へ返す。
pub struct AirtableClient {
    client: reqwest::Client,
    token: String,
    base_url: String,
    words_table: String,
    attempts_table: String,
}

impl AirtableClient {
    /// 設定からクライアントを作成
    ///
    /// # Errors
    ///
    /// トークンまたはベースIDが未設定の場合、HTTPクライアントの
    /// 構築に失敗した場合にエラーを返す。
    pub fn new(config: &AirtableConfig) -> Result<Self> {
        let token = config
            .resolve_token()
            .context("Airtableトークンが設定されていません (config または AIRTABLE_TOKEN)")?;
        if config.base_id.is_empty() {
            anyhow::bail!("Airtableの base_id が設定されていません");
        }

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_seconds))
            .build()
            .context("HTTPクライアント作成失敗")?;

        Ok(Self {
            client,
            token,
            base_url: format!("{}/{}", API_BASE, config.base_id),
            words_table: config.words_table.clone(),
            attempts_table: config.attempts_table.clone(),
        })
    }
}

// --- ワイヤー形式 (Airtable REST API) ---

#[derive(Debug, Deserialize)]
struct ListRecordsResponse {
    records: Vec<WordRecord>,
    offset: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WordRecord {
    id: String,
    #[serde(default)]
    fields: WordFields,
}

/// 単語テーブルの行。空のフィールドはレスポンスから省略される
#[derive(Debug, Default, Deserialize)]
struct WordFields {
    #[serde(rename = "Word")]
    word: Option<String>,
    #[serde(rename = "Sound Class")]
    sound_class: Option<String>,
}

#[derive(Debug, Serialize)]
struct CreateRecordBody<'a> {
    fields: AttemptFields<'a>,
}

/// 試行テーブルのフィールド。リンクフィールドはID配列、
/// 添付フィールドは `{url}` の配列という規約に従う
#[derive(Debug, Serialize)]
struct AttemptFields<'a> {
    #[serde(rename = "Target Word")]
    target_word: Vec<&'a str>,
    #[serde(rename = "Elicited or Imitated")]
    elicited_or_imitated: &'a str,
    #[serde(rename = "Child's Version")]
    childs_version: &'a str,
    #[serde(rename = "Outcome")]
    outcome: &'a str,
    #[serde(rename = "Comments")]
    comments: &'a str,
    #[serde(rename = "Recording", skip_serializing_if = "Option::is_none")]
    recording: Option<Vec<AttachmentField>>,
}

#[derive(Debug, Serialize)]
struct AttachmentField {
    url: String,
}

#[derive(Debug, Deserialize)]
struct CreateRecordResponse {
    id: String,
}

impl<'a> AttemptFields<'a> {
    fn from_record(record: &'a AttemptRecord) -> Self {
        Self {
            target_word: vec![record.target.as_str()],
            elicited_or_imitated: record.mode.as_str(),
            childs_version: &record.transcription,
            outcome: record.outcome.as_str(),
            comments: &record.notes,
            recording: record
                .recording_url
                .as_ref()
                .map(|url| vec![AttachmentField { url: url.clone() }]),
        }
    }
}

#[async_trait]
impl TableStore for AirtableClient {
    async fn list_words(&self) -> Result<Vec<CatalogRow>, Error> {
        let url = format!("{}/{}", self.base_url, self.words_table);
        let mut rows = Vec::new();
        let mut offset: Option<String> = None;

        // offsetカーソルで全ページを取得
        loop {
            let mut request = self.client.get(&url).bearer_auth(&self.token);
            if let Some(ref cursor) = offset {
                request = request.query(&[("offset", cursor.as_str())]);
            }

            let response = request
                .send()
                .await
                .map_err(|e| Error::CatalogUnavailable(e.to_string()))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::CatalogUnavailable(format!(
                    "HTTP {}: {}",
                    status, body
                )));
            }

            let page: ListRecordsResponse = response
                .json()
                .await
                .map_err(|e| Error::CatalogUnavailable(format!("レスポンスの解析に失敗: {}", e)))?;

            for record in page.records {
                rows.push(CatalogRow {
                    id: record.id,
                    word: record.fields.word,
                    sound_class: record.fields.sound_class,
                });
            }

            match page.offset {
                Some(next) => offset = Some(next),
                None => break,
            }
        }

        log::info!("単語カタログを取得: {} 行", rows.len());
        Ok(rows)
    }

    async fn create_attempt(&self, record: &AttemptRecord) -> Result<RecordId, Error> {
        let url = format!("{}/{}", self.base_url, self.attempts_table);
        let body = CreateRecordBody {
            fields: AttemptFields::from_record(record),
        };

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.token)
            .json(&body)
            .send()
            .await
            .map_err(|e| Error::RecordWriteFailed {
                status: 0,
                body: e.to_string(),
            })?;

        let status = response.status();
        if status != reqwest::StatusCode::OK && status != reqwest::StatusCode::CREATED {
            let body_text = response.text().await.unwrap_or_default();
            return Err(Error::RecordWriteFailed {
                status: status.as_u16(),
                body: body_text,
            });
        }

        let created: CreateRecordResponse =
            response.json().await.map_err(|e| Error::RecordWriteFailed {
                status: status.as_u16(),
                body: format!("レスポンスの解析に失敗: {}", e),
            })?;

        log::info!("試行レコードを作成: {}", created.id);
        Ok(RecordId::new(created.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ElicitationMode, Outcome};

    #[test]
    fn test_attempt_fields_wire_names() {
        let record = AttemptRecord {
            target: RecordId::new("recCRXiLOgFkl1kqr"),
            mode: ElicitationMode::Imitated,
            transcription: "pi".to_string(),
            outcome: Outcome::Partial,
            notes: "2回目".to_string(),
            recording_url: Some("https://example.com/signed".to_string()),
        };

        let body = CreateRecordBody {
            fields: AttemptFields::from_record(&record),
        };
        let json: serde_json::Value = serde_json::to_value(&body).unwrap();

        // リンクフィールドはID配列
        assert_eq!(
            json["fields"]["Target Word"],
            serde_json::json!(["recCRXiLOgFkl1kqr"])
        );
        assert_eq!(json["fields"]["Elicited or Imitated"], "Imitated");
        assert_eq!(json["fields"]["Child's Version"], "pi");
        assert_eq!(json["fields"]["Outcome"], "Partial");
        assert_eq!(json["fields"]["Comments"], "2回目");
        // 添付フィールドは {url} の配列
        assert_eq!(
            json["fields"]["Recording"],
            serde_json::json!([{"url": "https://example.com/signed"}])
        );
    }

    #[test]
    fn test_attempt_fields_without_recording_omits_attachment() {
        let record = AttemptRecord {
            target: RecordId::new("rec001"),
            mode: ElicitationMode::Elicited,
            transcription: String::new(),
            outcome: Outcome::NoAttempt,
            notes: String::new(),
            recording_url: None,
        };

        let body = CreateRecordBody {
            fields: AttemptFields::from_record(&record),
        };
        let json: serde_json::Value = serde_json::to_value(&body).unwrap();

        assert_eq!(json["fields"]["Outcome"], "No Attempt");
        assert!(json["fields"].get("Recording").is_none());
    }

    #[test]
    fn test_list_response_parsing_with_missing_fields() {
        // Airtableは空のフィールドをレスポンスから省略する
        let raw = r#"{
            "records": [
                {"id": "rec1", "fields": {"Word": "pig", "Sound Class": "Stops (P/B)"}},
                {"id": "rec2", "fields": {"Sound Class": "Stops (T/D)"}},
                {"id": "rec3", "fields": {}}
            ],
            "offset": "itrNEXT"
        }"#;

        let page: ListRecordsResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(page.records.len(), 3);
        assert_eq!(page.offset.as_deref(), Some("itrNEXT"));
        assert_eq!(page.records[0].fields.word.as_deref(), Some("pig"));
        assert!(page.records[1].fields.word.is_none());
        assert!(page.records[2].fields.sound_class.is_none());
    }

    #[test]
    fn test_new_requires_base_id() {
        let config = AirtableConfig {
            token: "patTEST".to_string(),
            ..AirtableConfig::default()
        };
        assert!(AirtableClient::new(&config).is_err());
    }
}

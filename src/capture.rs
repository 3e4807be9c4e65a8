use crate::config::CaptureConfig;
use crate::mic::MicInput;
use crate::silence::SilenceCutoff;
use crate::types::SampleI16;
use anyhow::{Context, Result};
use std::io::Cursor;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};

/// 収録セグメントのPCMフレーム蓄積バッファ
///
/// 収録中に届いたフレームを追記のみで蓄積し、送信直前に一括で
/// WAVコンテナへ変換する。バッファは現在のドラフトが専有し、
/// セッション間で共有されない。
#[derive(Clone, Debug)]
pub struct CaptureBuffer {
    sample_rate: u32,
    samples: Vec<SampleI16>,
}

impl CaptureBuffer {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            samples: Vec::new(),
        }
    }

    /// フレームを追記
    pub fn push_frame(&mut self, frame: &[SampleI16]) {
        self.samples.extend_from_slice(frame);
    }

    /// 蓄積済みサンプル数
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// 蓄積済みデータの時間（秒）
    pub fn duration_seconds(&self) -> f64 {
        self.samples.len() as f64 / self.sample_rate as f64
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// 蓄積した全フレームを一括でWAV (PCM16 モノラル) にエンコード
    ///
    /// ストリーミング変換ではなく、蓄積済みの全サンプルに対する
    /// 一回きりの変換。
    ///
    /// # Errors
    ///
    /// WAVコンテナの書き込みに失敗した場合にエラーを返す。
    pub fn encode_wav(&self) -> Result<Vec<u8>> {
        let spec = hound::WavSpec {
            channels: 1,
            sample_rate: self.sample_rate,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };

        let mut cursor = Cursor::new(Vec::new());
        {
            let mut writer =
                hound::WavWriter::new(&mut cursor, spec).context("WAVライター作成失敗")?;

            for &sample in &self.samples {
                writer.write_sample(sample).context("WAV書き込み失敗")?;
            }

            writer.finalize().context("WAV finalize失敗")?;
        }

        Ok(cursor.into_inner())
    }
}

/// 音声の取得経路
///
/// ファイルアップロードとマイク収録を同じ抽象で扱う。
/// 送信側はどちらの経路かを区別せず、送信直前に
/// [`AudioSource::to_payload`] でペイロードへ変換するだけでよい。
#[derive(Clone, Debug)]
pub enum AudioSource {
    /// アップロードされたファイル
    ///
    /// 宣言された拡張子を信頼する不透明なバイト列。
    /// コンテナ形式の検証は行わない。
    FileUpload { bytes: Vec<u8>, extension: String },

    /// マイク収録のバッファ (送信時にWAVへ一括変換)
    BufferedStream(CaptureBuffer),
}

/// 送信用に組み立てた音声ペイロード
#[derive(Clone, Debug)]
pub struct AudioPayload {
    pub bytes: Vec<u8>,
    pub extension: String,
    pub content_type: String,
}

impl AudioSource {
    /// 送信直前のペイロード組み立て
    ///
    /// 収録フレームがゼロの場合はエラーではなく「音声なし」(None)
    /// として扱う。音声のない試行も記録自体は送信できる。
    pub fn to_payload(&self) -> Result<Option<AudioPayload>> {
        match self {
            AudioSource::FileUpload { bytes, extension } => Ok(Some(AudioPayload {
                bytes: bytes.clone(),
                extension: extension.clone(),
                content_type: content_type_for(extension).to_string(),
            })),
            AudioSource::BufferedStream(buffer) => {
                if buffer.is_empty() {
                    log::warn!("収録フレームがありません。音声なしとして送信します");
                    return Ok(None);
                }
                Ok(Some(AudioPayload {
                    bytes: buffer.encode_wav()?,
                    extension: "wav".to_string(),
                    content_type: "audio/wav".to_string(),
                }))
            }
        }
    }
}

/// 拡張子からContent-Typeを決定
///
/// アップロードで想定している形式 (wav / mp3 / m4a) 以外は
/// 不透明なバイナリとして扱う。
pub fn content_type_for(extension: &str) -> &'static str {
    match extension.to_ascii_lowercase().as_str() {
        "wav" => "audio/wav",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        _ => "application/octet-stream",
    }
}

/// マイクから1セグメントを収録
///
/// 無音カットオフか最大収録時間、または停止シグナルまで
/// フレームを蓄積して返す。
///
/// # Arguments
///
/// * `mic` - マイク入力
/// * `config` - カットオフと最大時間の設定
/// * `sample_rate` - サンプリングレート (Hz)
/// * `running` - 停止シグナル (falseで収録中断)
pub async fn record_segment(
    mic: &mut MicInput,
    config: &CaptureConfig,
    sample_rate: u32,
    running: &AtomicBool,
) -> Result<CaptureBuffer> {
    let (tx, mut rx) = mpsc::channel::<Vec<SampleI16>>(1024);

    let mut buffer = CaptureBuffer::new(sample_rate);
    let mut cutoff = SilenceCutoff::new(config, sample_rate);
    let max_samples = (config.max_duration_secs * sample_rate as u64) as usize;

    mic.start(tx)?;
    log::info!(
        "収録を開始しました (無音 {} ms で自動終了、最大 {} 秒)",
        config.trailing_silence_ms,
        config.max_duration_secs
    );

    loop {
        if !running.load(Ordering::SeqCst) {
            log::info!("停止シグナルにより収録を中断します");
            break;
        }

        match timeout(Duration::from_millis(200), rx.recv()).await {
            Ok(Some(frame)) => {
                buffer.push_frame(&frame);

                if cutoff.feed(&frame) {
                    log::info!(
                        "無音区間を検出。収録を終了します ({:.2}秒)",
                        buffer.duration_seconds()
                    );
                    break;
                }

                if buffer.len() >= max_samples {
                    log::warn!("最大収録時間 {} 秒に達しました", config.max_duration_secs);
                    break;
                }
            }
            Ok(None) => break,
            Err(_) => {
                // タイムアウト: 停止シグナル確認のためループ継続
            }
        }
    }

    mic.stop();
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_capture_buffer_accumulates_frames() {
        let mut buffer = CaptureBuffer::new(16000);
        assert!(buffer.is_empty());

        buffer.push_frame(&[1, 2, 3]);
        buffer.push_frame(&[4, 5]);

        assert_eq!(buffer.len(), 5);
        assert!((buffer.duration_seconds() - 5.0 / 16000.0).abs() < 1e-9);
    }

    #[test]
    fn test_encode_wav_roundtrip() {
        let mut buffer = CaptureBuffer::new(16000);
        let samples: Vec<i16> = (0..1600)
            .map(|i| ((i as f32 * 0.1).sin() * 10000.0) as i16)
            .collect();
        buffer.push_frame(&samples);

        let wav = buffer.encode_wav().unwrap();

        // 生成したコンテナを読み戻して中身を検証
        let mut reader = hound::WavReader::new(Cursor::new(wav)).unwrap();
        let spec = reader.spec();
        assert_eq!(spec.channels, 1);
        assert_eq!(spec.sample_rate, 16000);
        assert_eq!(spec.bits_per_sample, 16);

        let decoded: Vec<i16> = reader.samples::<i16>().map(|s| s.unwrap()).collect();
        assert_eq!(decoded, samples);
    }

    #[test]
    fn test_empty_buffer_yields_no_payload() {
        let source = AudioSource::BufferedStream(CaptureBuffer::new(16000));
        // 空の収録はエラーではなく「音声なし」
        assert!(source.to_payload().unwrap().is_none());
    }

    #[test]
    fn test_buffered_payload_is_wav() {
        let mut buffer = CaptureBuffer::new(16000);
        buffer.push_frame(&[100, -100, 200]);
        let source = AudioSource::BufferedStream(buffer);

        let payload = source.to_payload().unwrap().unwrap();
        assert_eq!(payload.extension, "wav");
        assert_eq!(payload.content_type, "audio/wav");
        // RIFFヘッダで始まるWAVコンテナであること
        assert_eq!(&payload.bytes[0..4], b"RIFF");
    }

    #[test]
    fn test_file_upload_payload_trusts_declared_extension() {
        let source = AudioSource::FileUpload {
            bytes: vec![0xFF, 0xFB, 0x00],
            extension: "mp3".to_string(),
        };
        let payload = source.to_payload().unwrap().unwrap();
        assert_eq!(payload.bytes, vec![0xFF, 0xFB, 0x00]);
        assert_eq!(payload.content_type, "audio/mpeg");
    }

    #[test]
    fn test_content_type_mapping() {
        assert_eq!(content_type_for("wav"), "audio/wav");
        assert_eq!(content_type_for("WAV"), "audio/wav");
        assert_eq!(content_type_for("mp3"), "audio/mpeg");
        assert_eq!(content_type_for("m4a"), "audio/mp4");
        assert_eq!(content_type_for("ogg"), "application/octet-stream");
    }
}

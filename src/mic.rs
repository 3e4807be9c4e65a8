use crate::config::AudioConfig;
use crate::types::SampleI16;
use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Sample, SizedSample};
use regex_lite::Regex;
use tokio::sync::mpsc;

/// マイクからのモノラル音声入力
///
/// デバイスのチャンネル数に関係なく、フレーム単位でミックスダウン
/// したモノラルのPCMサンプルを送出する。
pub struct MicInput {
    device: cpal::Device,
    config: cpal::StreamConfig,
    stream: Option<cpal::Stream>,
}

impl MicInput {
    /// 新しいMicInputを作成
    pub fn new(config: &AudioConfig) -> Result<Self> {
        let host = cpal::default_host();

        // デバイスを取得
        let device = if config.device_id == "default" {
            host.default_input_device()
                .context("デフォルト入力デバイスが見つかりません")?
        } else {
            // デバイスIDが指定されている場合は、デバイス一覧から検索
            Self::input_devices()?
                .into_iter()
                .find(|d| d.name().ok().as_deref() == Some(&config.device_id))
                .with_context(|| format!("デバイスが見つかりません: {}", config.device_id))?
        };

        log::info!("入力デバイス: {:?}", device.name());

        // デバイスの設定を取得
        let default_config = device
            .default_input_config()
            .context("デフォルト入力設定が取得できません")?;

        log::info!(
            "デバイス設定: {:?}, {}Hz, {}ch",
            default_config.sample_format(),
            default_config.sample_rate().0,
            default_config.channels()
        );

        // ストリーム設定を作成 (チャンネル数はデバイスに従い、後段でモノラル化)
        let stream_config = cpal::StreamConfig {
            channels: default_config.channels(),
            sample_rate: cpal::SampleRate(config.sample_rate),
            buffer_size: cpal::BufferSize::Fixed(4096),
        };

        Ok(Self {
            device,
            config: stream_config,
            stream: None,
        })
    }

    /// ストリームを開始
    ///
    /// # Arguments
    /// * `tx` - モノラル化したフレームの送信チャンネル
    pub fn start(&mut self, tx: mpsc::Sender<Vec<SampleI16>>) -> Result<()> {
        let num_channels = self.config.channels;

        // デバイスのデフォルトフォーマットを取得
        let default_config = self.device.default_input_config()?;

        let stream = match default_config.sample_format() {
            cpal::SampleFormat::F32 => self.build_stream::<f32>(tx, num_channels)?,
            cpal::SampleFormat::I16 => self.build_stream::<i16>(tx, num_channels)?,
            cpal::SampleFormat::U16 => self.build_stream::<u16>(tx, num_channels)?,
            cpal::SampleFormat::I32 => self.build_stream::<i32>(tx, num_channels)?,
            _ => anyhow::bail!("サポートされていないサンプルフォーマット"),
        };

        stream.play().context("ストリームの再生開始に失敗")?;
        self.stream = Some(stream);

        log::info!("音声入力ストリームを開始しました");

        Ok(())
    }

    /// ストリームを構築
    fn build_stream<T>(
        &self,
        tx: mpsc::Sender<Vec<SampleI16>>,
        num_channels: u16,
    ) -> Result<cpal::Stream>
    where
        T: SizedSample + Sample + Send + 'static,
        <T as Sample>::Float: Into<f32>,
    {
        let data_callback = move |data: &[T], _info: &cpal::InputCallbackInfo| {
            let channels = num_channels.max(1) as usize;
            let frames = data.len() / channels;

            // インターリーブされた全チャンネルを平均してモノラル化
            let mut mono = Vec::with_capacity(frames);
            for frame in 0..frames {
                let mut acc = 0.0f32;
                for ch in 0..channels {
                    let sample = data[frame * channels + ch];
                    let f: f32 = sample.to_float_sample().into();
                    acc += f;
                }
                let mixed = (acc / channels as f32).clamp(-1.0, 1.0);
                mono.push((mixed * i16::MAX as f32) as SampleI16);
            }

            match tx.try_send(mono) {
                Ok(_) => {
                    // 成功時はログ出力しない（パフォーマンス重視）
                }
                Err(mpsc::error::TrySendError::Full(_)) => {
                    log::warn!("収録フレームの送信失敗: バッファ満杯");
                }
                Err(mpsc::error::TrySendError::Closed(_)) => {
                    // 受信側が収録を終了済み
                }
            }
        };

        let error_callback = move |err| {
            log::error!("ストリームエラー: {}", err);
        };

        let stream = self
            .device
            .build_input_stream(&self.config, data_callback, error_callback, None)
            .context("入力ストリームの構築に失敗")?;

        Ok(stream)
    }

    /// ストリームを停止
    pub fn stop(&mut self) {
        if let Some(stream) = self.stream.take() {
            drop(stream);
            log::info!("音声入力ストリームを停止しました");
        }
    }

    /// デバイス一覧を表示
    pub fn list_devices() -> Result<()> {
        println!("利用可能な入力デバイス:");
        println!();

        for (idx, device) in Self::input_devices()?.into_iter().enumerate() {
            let name = device.name()?;
            println!("  [{}] {}", idx, name);

            device.supported_input_configs()?.for_each(|config_range| {
                println!(
                    "      フォーマット: {:?}, {}-{}Hz, {}ch",
                    config_range.sample_format(),
                    config_range.min_sample_rate().0,
                    config_range.max_sample_rate().0,
                    config_range.channels()
                );
            });
            println!();
        }

        Ok(())
    }

    /// 内蔵マイク・WebCam など、収録に使うべきでないデバイスを除外した一覧を取得
    fn input_devices() -> Result<Vec<cpal::Device>> {
        let host = cpal::default_host();
        let devices = host
            .input_devices()?
            .filter(|device| {
                if let Ok(name) = device.name() {
                    // 除外するデバイス名のリスト
                    let excluded_names_regex = Regex::new(
                        "AirPods|iPhone|Webcam|Background|Microsoft Teams|ZoomAudioDevice",
                    )
                    .unwrap();
                    if excluded_names_regex.is_match(&name) {
                        return false;
                    }
                    true
                } else {
                    true
                }
            })
            .collect();
        Ok(devices)
    }
}

impl Drop for MicInput {
    fn drop(&mut self) {
        self.stop();
    }
}

use crate::config::CaptureConfig;
use crate::types::SampleI16;

/// 無音ベースの収録終了判定
///
/// RMS (Root Mean Square) をデシベルに変換して閾値と比較し、
/// 一度でも音声を検出した後に規定時間の無音が続いたら
/// 収録セグメントの終了と判定する。
///
/// # アルゴリズム
///
/// 1. 各サンプルを正規化 (-1.0 ~ 1.0)
/// 2. RMS (二乗平均平方根) を計算
/// 3. デシベル (dB) に変換: `20 * log10(rms)`
/// 4. 閾値を超えたら音声とみなし、無音カウンタをリセット
/// 5. 音声検出後、無音が規定時間続いた時点でセグメント終了
///
/// 収録開始直後の無音 (発話前の間) ではセグメントを終了しない。
///
/// # Examples
///
/// ```
/// # use kotoba_log::silence::SilenceCutoff;
/// # use kotoba_log::config::CaptureConfig;
/// let config = CaptureConfig {
///     silence_threshold_db: -40.0,
///     trailing_silence_ms: 500,
///     max_duration_secs: 15,
/// };
/// let mut cutoff = SilenceCutoff::new(&config, 16000);
///
/// // 発話前の無音では終了しない
/// let silence = vec![0i16; 1600];
/// assert!(!cutoff.feed(&silence));
/// ```
pub struct SilenceCutoff {
    /// 音声判定の閾値 (dB)
    threshold_db: f32,

    /// セグメント終了とみなす無音の長さ (ミリ秒)
    trailing_silence_ms: u32,

    /// 直近の連続無音時間 (ミリ秒)
    silence_elapsed_ms: u32,

    /// このセグメントで一度でも音声を検出したか
    voice_heard: bool,

    /// サンプリングレート (Hz)
    sample_rate: u32,
}

impl SilenceCutoff {
    pub fn new(config: &CaptureConfig, sample_rate: u32) -> Self {
        Self {
            threshold_db: config.silence_threshold_db,
            trailing_silence_ms: config.trailing_silence_ms,
            silence_elapsed_ms: 0,
            voice_heard: false,
            sample_rate,
        }
    }

    /// フレームを処理し、収録セグメントが終了したかを判定
    ///
    /// # Arguments
    /// * `samples` - 音声サンプル配列
    ///
    /// # Returns
    /// * `true` - セグメント終了 (音声検出後に規定時間の無音)
    /// * `false` - 収録継続
    pub fn feed(&mut self, samples: &[SampleI16]) -> bool {
        if samples.is_empty() {
            return false;
        }

        let rms = self.calculate_rms(samples);
        let db = self.rms_to_db(rms);

        // サンプル数から経過時間を計算（ミリ秒）
        let duration_ms = (samples.len() as f64 / self.sample_rate as f64 * 1000.0) as u32;

        if db > self.threshold_db {
            if !self.voice_heard {
                log::debug!("音声開始を検出 (RMS: {:.2} dB)", db);
            }
            self.voice_heard = true;
            self.silence_elapsed_ms = 0;
            return false;
        }

        if !self.voice_heard {
            // 発話前の無音はカウントしない
            return false;
        }

        self.silence_elapsed_ms += duration_ms;
        if self.silence_elapsed_ms >= self.trailing_silence_ms {
            log::debug!(
                "無音 {} ms を検出。セグメント終了",
                self.silence_elapsed_ms
            );
            return true;
        }
        false
    }

    /// このセグメントで音声を検出したか
    pub fn voice_heard(&self) -> bool {
        self.voice_heard
    }

    /// RMS (Root Mean Square) を計算
    fn calculate_rms(&self, samples: &[SampleI16]) -> f32 {
        if samples.is_empty() {
            return 0.0;
        }

        let sum_of_squares: f64 = samples
            .iter()
            .map(|&s| {
                let normalized = s as f64 / i16::MAX as f64;
                normalized * normalized
            })
            .sum();

        let mean_square = sum_of_squares / samples.len() as f64;
        mean_square.sqrt() as f32
    }

    /// RMSをデシベル (dB) に変換
    fn rms_to_db(&self, rms: f32) -> f32 {
        if rms <= 0.0 {
            return -100.0; // 無音の場合の最小値
        }
        20.0 * rms.log10()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CaptureConfig {
        CaptureConfig {
            silence_threshold_db: -40.0,
            trailing_silence_ms: 500,
            max_duration_secs: 15,
        }
    }

    fn voice_frame(len: usize) -> Vec<i16> {
        (0..len)
            .map(|i| ((i as f32 * 0.1).sin() * 10000.0) as i16)
            .collect()
    }

    #[test]
    fn test_leading_silence_never_ends_segment() {
        let mut cutoff = SilenceCutoff::new(&test_config(), 16000);

        // 発話前の無音がどれだけ続いても終了しない
        let silence = vec![0i16; 1600]; // 100ms分
        for _ in 0..50 {
            assert!(!cutoff.feed(&silence));
        }
        assert!(!cutoff.voice_heard());
    }

    #[test]
    fn test_ends_after_trailing_silence() {
        let mut cutoff = SilenceCutoff::new(&test_config(), 16000);

        // 音声を検出
        assert!(!cutoff.feed(&voice_frame(1600)));
        assert!(cutoff.voice_heard());

        // 無音400ms: まだ継続
        let silence = vec![0i16; 1600]; // 100ms分
        for _ in 0..4 {
            assert!(!cutoff.feed(&silence));
        }

        // 合計500msで終了
        assert!(cutoff.feed(&silence));
    }

    #[test]
    fn test_voice_resets_silence_counter() {
        let mut cutoff = SilenceCutoff::new(&test_config(), 16000);
        let silence = vec![0i16; 1600]; // 100ms分

        assert!(!cutoff.feed(&voice_frame(1600)));

        // 無音400ms → 音声 → 無音カウンタはリセットされる
        for _ in 0..4 {
            assert!(!cutoff.feed(&silence));
        }
        assert!(!cutoff.feed(&voice_frame(1600)));

        // もう一度400msの無音ではまだ終了しない
        for _ in 0..4 {
            assert!(!cutoff.feed(&silence));
        }
        assert!(cutoff.feed(&silence));
    }

    #[test]
    fn test_low_amplitude_counts_as_silence() {
        let mut cutoff = SilenceCutoff::new(&test_config(), 16000);

        assert!(!cutoff.feed(&voice_frame(1600)));

        // 閾値以下の小さな振幅は無音とみなす
        let low: Vec<i16> = (0..1600)
            .map(|i| ((i as f32 * 0.1).sin() * 100.0) as i16)
            .collect();
        for _ in 0..4 {
            assert!(!cutoff.feed(&low));
        }
        assert!(cutoff.feed(&low));
    }
}

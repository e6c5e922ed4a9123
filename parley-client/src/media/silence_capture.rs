use crate::media::AudioSource;
use bytes::Bytes;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::debug;
use webrtc::api::media_engine::MIME_TYPE_OPUS;
use webrtc::media::Sample;
use webrtc::rtp_transceiver::rtp_codec::RTCRtpCodecCapability;
use webrtc::track::track_local::track_local_static_sample::TrackLocalStaticSample;

const FRAME_DURATION: Duration = Duration::from_millis(20);

/// One Opus frame of digital silence.
const OPUS_SILENCE: [u8; 3] = [0xf8, 0xff, 0xfe];

/// Capture stand-in for headless use: an Opus track that emits silence every
/// 20 ms while enabled.
pub struct SilenceCapture {
    track: Arc<TrackLocalStaticSample>,
    enabled: Arc<AtomicBool>,
    writer: JoinHandle<()>,
}

impl SilenceCapture {
    /// Must be called from within a tokio runtime.
    pub fn start() -> Self {
        let track = Arc::new(TrackLocalStaticSample::new(
            RTCRtpCodecCapability {
                mime_type: MIME_TYPE_OPUS.to_owned(),
                clock_rate: 48_000,
                channels: 2,
                sdp_fmtp_line: "minptime=10;useinbandfec=1".to_owned(),
                ..Default::default()
            },
            "audio".to_owned(),
            "parley".to_owned(),
        ));
        let enabled = Arc::new(AtomicBool::new(true));

        let writer = tokio::spawn({
            let track = track.clone();
            let enabled = enabled.clone();

            async move {
                let mut ticker = tokio::time::interval(FRAME_DURATION);
                loop {
                    ticker.tick().await;
                    if !enabled.load(Ordering::Relaxed) {
                        continue;
                    }

                    let sample = Sample {
                        data: Bytes::from_static(&OPUS_SILENCE),
                        duration: FRAME_DURATION,
                        ..Default::default()
                    };
                    if let Err(e) = track.write_sample(&sample).await {
                        debug!("Silence frame not written: {}", e);
                    }
                }
            }
        });

        Self {
            track,
            enabled,
            writer,
        }
    }

    pub fn track(&self) -> Arc<TrackLocalStaticSample> {
        self.track.clone()
    }
}

impl AudioSource for SilenceCapture {
    fn set_enabled(&self, enabled: bool) {
        self.enabled.store(enabled, Ordering::Relaxed);
    }

    fn stop(&self) {
        self.enabled.store(false, Ordering::Relaxed);
        self.writer.abort();
    }
}

impl Drop for SilenceCapture {
    fn drop(&mut self) {
        self.writer.abort();
    }
}

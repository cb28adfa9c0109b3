//! Duration alignment between a scene's visual, its narration and its
//! planned time budget.

use serde::{Deserialize, Serialize};

/// Largest speed-up or slow-down applied to fit the time budget.
pub const MAX_SPEED_FACTOR: f64 = 1.5;

/// Shortest and longest clip made from a still image, in seconds.
pub const STILL_DURATION_RANGE: (f64, f64) = (4.0, 12.0);

/// How to stretch a visual and pad its narration before muxing.
///
/// # Examples
///
/// ```
/// use reel_core::Alignment;
///
/// // 12s clip, 8s budget, 5s narration: speed up by 1.5, pad audio to 8s.
/// let a = Alignment::compute(12.0, 5.0, 8.0);
/// assert_eq!(a.video_speed, 1.5);
/// assert_eq!(a.output_duration, 8.0);
/// assert_eq!(a.pad_audio_to, Some(8.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Alignment {
    /// Playback speed multiplier applied to the visual (>1 is faster)
    pub video_speed: f64,
    /// Duration of the muxed segment
    pub output_duration: f64,
    /// Pad the narration with silence up to this many seconds
    pub pad_audio_to: Option<f64>,
}

impl Alignment {
    /// Plans the alignment of a `video`-second visual and `audio`-second
    /// narration to a `target`-second budget.
    ///
    /// The visual is sped up or slowed down toward the budget, never by more
    /// than [`MAX_SPEED_FACTOR`]. Narration longer than the result slows the
    /// visual further so nothing is cut; shorter narration is padded.
    pub fn compute(video: f64, audio: f64, target: f64) -> Self {
        let target = if target > 0.0 { target } else { crate::DEFAULT_TIME_BUDGET_SECS };
        if video <= 0.0 {
            return Self {
                video_speed: 1.0,
                output_duration: audio.max(0.0),
                pad_audio_to: None,
            };
        }
        let ratio = video / target;
        let mut speed = if video > target {
            ratio.min(MAX_SPEED_FACTOR)
        } else {
            ratio.max(1.0 / MAX_SPEED_FACTOR)
        };
        let fitted = video / speed;
        if audio > fitted {
            speed *= fitted / audio;
            Self {
                video_speed: speed,
                output_duration: audio,
                pad_audio_to: None,
            }
        } else {
            Self {
                video_speed: speed,
                output_duration: fitted,
                pad_audio_to: Some(fitted),
            }
        }
    }
}

/// Clamps a still image's display time to [`STILL_DURATION_RANGE`].
pub fn clamp_still_duration(seconds: f64) -> f64 {
    seconds.clamp(STILL_DURATION_RANGE.0, STILL_DURATION_RANGE.1)
}

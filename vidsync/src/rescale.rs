/*!
    Video frame conversion to the display format and size.
*/

use ffmpeg_types::{PixelFormat, VideoFrame};
use tracing::debug;

use crate::backend::{RescaleKey, ScaleBackend, ScaleContext};
use crate::error::RescaleError;

/**
    Converts decoded frames to one output pixel format at a requested
    size, keeping the conversion context for as long as the source and
    target geometry stay the same.
*/
pub struct FrameRescaler {
    backend: Box<dyn ScaleBackend>,
    output_format: PixelFormat,
    cached: Option<(RescaleKey, Box<dyn ScaleContext>)>,
    contexts_created: u64,
}

impl FrameRescaler {
    pub fn new(backend: Box<dyn ScaleBackend>, output_format: PixelFormat) -> Self {
        Self {
            backend,
            output_format,
            cached: None,
            contexts_created: 0,
        }
    }

    pub fn output_format(&self) -> PixelFormat {
        self.output_format
    }

    /// Number of conversion contexts built so far.
    pub fn contexts_created(&self) -> u64 {
        self.contexts_created
    }

    /**
        Replace `frame` with a copy in the output format at `width` x
        `height`, carrying its timestamps over.

        On error `frame` is left untouched. A frame already in the target
        geometry is not copied.
    */
    pub fn rescale(
        &mut self,
        frame: &mut VideoFrame,
        width: u32,
        height: u32,
    ) -> Result<(), RescaleError> {
        let key = RescaleKey::for_frame(frame, self.output_format, width, height);
        if key.is_identity() {
            return Ok(());
        }

        let size = self
            .output_format
            .frame_size(width, height)
            .ok_or(RescaleError::AllocError { width, height })?;

        if self.cached.as_ref().is_none_or(|(cached, _)| *cached != key) {
            self.cached = None;
            let context = self
                .backend
                .create_context(&key)
                .map_err(|e| RescaleError::ContextError(e.to_string()))?;
            self.contexts_created += 1;
            debug!(
                src_width = key.src_width,
                src_height = key.src_height,
                width,
                height,
                format = ?self.output_format,
                "created rescale context"
            );
            self.cached = Some((key, context));
        }

        let mut data = Vec::new();
        data.try_reserve_exact(size)
            .map_err(|_| RescaleError::AllocError { width, height })?;
        data.resize(size, 0);

        let Some((_, context)) = self.cached.as_mut() else {
            return Err(RescaleError::ContextError("no conversion context".into()));
        };
        if let Err(e) = context.scale(frame, &mut data) {
            self.cached = None;
            return Err(RescaleError::ContextError(e.to_string()));
        }

        *frame = VideoFrame::new(data, width, height, self.output_format, frame.time_base)
            .with_timestamps(frame.pts, frame.dts);
        Ok(())
    }
}

impl std::fmt::Debug for FrameRescaler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameRescaler")
            .field("output_format", &self.output_format)
            .field("cached", &self.cached.as_ref().map(|(key, _)| key))
            .field("contexts_created", &self.contexts_created)
            .finish()
    }
}

/**
    A rectangle on the display surface.
*/
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/**
    Largest rectangle with the video's aspect ratio that fits in `bounds`,
    centered in it.

    With `true_size` the video is never enlarged past its native size, only
    shrunk when it does not fit.
*/
pub fn fit_rect(video_width: u32, video_height: u32, bounds: Rect, true_size: bool) -> Rect {
    if video_width == 0 || video_height == 0 || bounds.width == 0 || bounds.height == 0 {
        return Rect::new(bounds.x, bounds.y, 0, 0);
    }

    let aspect = video_width as f64 / video_height as f64;
    let (limit_w, limit_h) = (bounds.width as f64, bounds.height as f64);
    let (mut w, mut h) = if true_size {
        (video_width as f64, video_height as f64)
    } else {
        (limit_w, limit_w / aspect)
    };
    if w > limit_w {
        w = limit_w;
        h = w / aspect;
    }
    if h > limit_h {
        h = limit_h;
        w = h * aspect;
    }

    let (width, height) = (w as u32, h as u32);
    Rect {
        x: bounds.x + ((bounds.width - width) / 2) as i32,
        y: bounds.y + ((bounds.height - height) / 2) as i32,
        width,
        height,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use ffmpeg_types::{Pts, Rational};

    use super::*;
    use crate::test_support::CountingScaler;

    fn source_frame(pts: i64) -> VideoFrame {
        let size = PixelFormat::Yuv420p.frame_size(64, 36).unwrap();
        VideoFrame::new(vec![7; size], 64, 36, PixelFormat::Yuv420p, Rational::new(1, 30))
            .with_timestamps(Some(Pts(pts)), Some(Pts(pts - 1)))
    }

    fn rescaler() -> (FrameRescaler, CountingScaler) {
        let scaler = CountingScaler::default();
        let rescaler = FrameRescaler::new(Box::new(scaler.clone()), PixelFormat::Rgba);
        (rescaler, scaler)
    }

    #[test]
    fn context_is_reused_for_same_size() {
        let (mut rescaler, scaler) = rescaler();

        rescaler.rescale(&mut source_frame(1), 32, 18).unwrap();
        rescaler.rescale(&mut source_frame(2), 32, 18).unwrap();
        assert_eq!(scaler.contexts.load(Ordering::SeqCst), 1);

        rescaler.rescale(&mut source_frame(3), 128, 72).unwrap();
        assert_eq!(scaler.contexts.load(Ordering::SeqCst), 2);
        assert_eq!(rescaler.contexts_created(), 2);
    }

    #[test]
    fn timestamps_survive_conversion() {
        let (mut rescaler, _) = rescaler();
        let mut frame = source_frame(42);

        rescaler.rescale(&mut frame, 32, 18).unwrap();

        assert_eq!(frame.pts, Some(Pts(42)));
        assert_eq!(frame.dts, Some(Pts(41)));
        assert_eq!(frame.time_base, Rational::new(1, 30));
        assert_eq!((frame.width, frame.height, frame.format), (32, 18, PixelFormat::Rgba));
        assert_eq!(frame.data.len(), 32 * 18 * 4);
        assert!(frame.data.iter().all(|&b| b == 7));
    }

    #[test]
    fn matching_frame_is_left_alone() {
        let mut rescaler = FrameRescaler::new(Box::new(CountingScaler::default()), PixelFormat::Yuv420p);
        let mut frame = source_frame(1);
        rescaler.rescale(&mut frame, 64, 36).unwrap();
        assert_eq!(rescaler.contexts_created(), 0);
    }

    #[test]
    fn context_failure_keeps_frame() {
        let (mut rescaler, scaler) = rescaler();
        scaler.fail_create.store(true, Ordering::SeqCst);
        let mut frame = source_frame(5);

        let result = rescaler.rescale(&mut frame, 32, 18);
        assert!(matches!(result, Err(RescaleError::ContextError(_))));
        assert_eq!((frame.width, frame.format), (64, PixelFormat::Yuv420p));

        scaler.fail_create.store(false, Ordering::SeqCst);
        assert!(rescaler.rescale(&mut frame, 32, 18).is_ok());
    }

    #[test]
    fn oversized_target_is_alloc_error() {
        let (mut rescaler, scaler) = rescaler();
        let result = rescaler.rescale(&mut source_frame(1), u32::MAX, u32::MAX);
        assert_eq!(
            result,
            Err(RescaleError::AllocError {
                width: u32::MAX,
                height: u32::MAX
            })
        );
        assert_eq!(scaler.contexts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn fit_wide_video() {
        let rect = fit_rect(1920, 1080, Rect::new(0, 0, 800, 800), false);
        assert_eq!(rect, Rect::new(0, 175, 800, 450));
    }

    #[test]
    fn fit_tall_video() {
        let rect = fit_rect(1080, 1920, Rect::new(10, 20, 800, 600), false);
        assert_eq!(rect, Rect::new(10 + 231, 20, 337, 600));
    }

    #[test]
    fn fit_true_size_does_not_enlarge() {
        let rect = fit_rect(640, 360, Rect::new(0, 0, 800, 800), true);
        assert_eq!(rect, Rect::new(80, 220, 640, 360));

        let rect = fit_rect(1920, 1080, Rect::new(0, 0, 960, 960), true);
        assert_eq!(rect, Rect::new(0, 210, 960, 540));
    }

    #[test]
    fn fit_degenerate_sizes() {
        assert_eq!(fit_rect(0, 1080, Rect::new(5, 5, 800, 600), false), Rect::new(5, 5, 0, 0));
    }
}

//! Heartbeat icon frames
//!
//! The heart icon is a looping sequence of images. The monitor only tracks
//! which frame is current; loading and drawing the images is the host's job
//! through an [`ImageProvider`].

use crate::settings::Settings;
use std::path::{Path, PathBuf};

/// Number of frames in the shipped heartbeat animation
pub const HEARTBEAT_FRAME_COUNT: usize = 20;

/// The icon is never drawn taller than this before `image_size` scaling
pub const MAX_IMAGE_HEIGHT: f32 = 80.0;

/// Horizontal space the host window keeps free around the icon
pub const WINDOW_MARGIN: f32 = 55.0;

/// A drawable frame as resolved by the host
#[derive(Debug, Clone, PartialEq)]
pub struct FrameImage<H> {
    pub handle: H,
    pub width: u32,
    pub height: u32,
}

/// Resolves frame indices to drawable images
pub trait ImageProvider {
    type Handle;

    fn frame_count(&self) -> usize;

    /// `None` when the image is missing or still loading; the host skips
    /// drawing the icon for that tick
    fn frame(&self, index: usize) -> Option<FrameImage<Self::Handle>>;
}

/// File paths of the shipped frames: `<dir>/0.png` .. `<dir>/{count-1}.png`
pub fn frame_paths(dir: impl AsRef<Path>, count: usize) -> Vec<PathBuf> {
    (0..count)
        .map(|i| dir.as_ref().join(format!("{}.png", i)))
        .collect()
}

/// On-screen size and opacity of the heart icon
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImageLayout {
    pub width: f32,
    pub height: f32,
    pub alpha: f32,
}

impl ImageLayout {
    /// Fits an image into the window, keeping its aspect ratio
    ///
    /// The icon fills the window width minus [`WINDOW_MARGIN`] unless that
    /// would make it taller than [`MAX_IMAGE_HEIGHT`]; the result is then
    /// scaled by `image_size`. Returns `None` for degenerate images.
    pub fn fit(image_width: u32, image_height: u32, window_width: f32, settings: &Settings) -> Option<Self> {
        if image_width == 0 || image_height == 0 {
            return None;
        }

        let aspect_ratio = image_width as f32 / image_height as f32;
        let mut width = window_width - WINDOW_MARGIN;
        let mut height = width / aspect_ratio;

        if height > MAX_IMAGE_HEIGHT {
            height = MAX_IMAGE_HEIGHT;
            width = height * aspect_ratio;
        }

        Some(ImageLayout {
            width: width * settings.image_size,
            height: height * settings.image_size,
            alpha: settings.image_transparency,
        })
    }
}

/// Resolves the current frame and its layout in one go
pub fn heartbeat_image<P: ImageProvider>(
    provider: &P,
    frame_index: usize,
    window_width: f32,
    settings: &Settings,
) -> Option<(FrameImage<P::Handle>, ImageLayout)> {
    let image = provider.frame(frame_index)?;
    let layout = ImageLayout::fit(image.width, image.height, window_width, settings)?;
    Some((image, layout))
}

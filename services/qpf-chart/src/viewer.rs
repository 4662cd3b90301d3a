//! Shows charts with the desktop's default image viewer.

use std::io::Write;
use std::path::PathBuf;
use std::process::Command;

use chart_common::{ChartError, ChartResult};
use image::RgbaImage;
use renderer::animation::encode_gif;
use renderer::png::encode_png;
use renderer::Viewer;
use tracing::{info, warn};

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

/// Writes each chart to a kept temporary file and opens it.
pub struct SystemViewer {
    dpi: u32,
}

impl SystemViewer {
    pub fn new(dpi: u32) -> Self {
        Self { dpi }
    }

    fn open(&self, bytes: &[u8], suffix: &str) -> ChartResult<PathBuf> {
        let mut file = tempfile::Builder::new()
            .prefix("qpf-chart-")
            .suffix(suffix)
            .tempfile()?;
        file.write_all(bytes)?;
        let (_, path) = file.keep().map_err(|e| ChartError::Io(e.error))?;

        match Command::new(OPENER).arg(&path).spawn() {
            Ok(_) => info!(path = %path.display(), "Opened chart in viewer"),
            Err(e) => warn!(
                path = %path.display(),
                error = %e,
                "Could not launch {}, chart left on disk", OPENER
            ),
        }
        Ok(path)
    }
}

impl Viewer for SystemViewer {
    fn show_image(&mut self, image: &RgbaImage, title: &str) -> ChartResult<()> {
        let png = encode_png(
            image.as_raw(),
            image.width() as usize,
            image.height() as usize,
            self.dpi,
        )?;
        info!(title, "Showing chart");
        self.open(&png, ".png").map(|_| ())
    }

    fn show_animation(
        &mut self,
        frames: &[RgbaImage],
        delay_ms: u32,
        title: &str,
    ) -> ChartResult<()> {
        let gif = encode_gif(frames, delay_ms)?;
        info!(title, frames = frames.len(), "Showing animation");
        self.open(&gif, ".gif").map(|_| ())
    }
}

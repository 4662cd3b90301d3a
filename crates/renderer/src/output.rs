//! Where a finished chart goes: a file in an output directory, or a viewer.

use std::path::{Path, PathBuf};

use chart_common::{ChartResult, DateStyle, ForecastTime};
use image::RgbaImage;
use tracing::info;

use crate::animation::encode_gif;
use crate::png::encode_png;

/// The chart products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChartKind {
    GhRain,
    MslpRainSnow,
    RainEvo,
    CumulatedPrecipEvo,
}

impl ChartKind {
    /// Name used in logs and metrics labels.
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::GhRain => "gh_rain",
            ChartKind::MslpRainSnow => "mslp_rain_snow",
            ChartKind::RainEvo => "rain_evo",
            ChartKind::CumulatedPrecipEvo => "cumulated_precip_evo",
        }
    }

    pub fn filename_prefix(&self) -> &'static str {
        match self {
            ChartKind::GhRain => "高度场_降水_预报",
            ChartKind::MslpRainSnow => "海平面气压_降水_预报",
            ChartKind::RainEvo => "降水范围演变_预报",
            ChartKind::CumulatedPrecipEvo => "累积降水演变_预报",
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ChartKind::CumulatedPrecipEvo => "gif",
            _ => "png",
        }
    }
}

/// `<prefix>_起报时间_<reference time>预报时效_<lead>小时.<ext>`
pub fn chart_filename(chart: ChartKind, forecast: &ForecastTime, style: &DateStyle) -> String {
    format!(
        "{}_起报时间_{}预报时效_{}小时.{}",
        chart.filename_prefix(),
        style.format_filename(&forecast.reference_time),
        forecast.lead_whole_hours(),
        chart.extension()
    )
}

/// Interactive display of finished charts.
pub trait Viewer {
    fn show_image(&mut self, image: &RgbaImage, title: &str) -> ChartResult<()>;

    fn show_animation(&mut self, frames: &[RgbaImage], delay_ms: u32, title: &str) -> ChartResult<()>;
}

/// Destination of one render call.
pub enum Output<'a> {
    /// Write a file into this directory (created if missing)
    Directory(PathBuf),
    /// Hand the image to a viewer; nothing is written
    Display(&'a mut dyn Viewer),
}

impl std::fmt::Debug for Output<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Output::Directory(dir) => f.debug_tuple("Directory").field(dir).finish(),
            Output::Display(_) => f.write_str("Display"),
        }
    }
}

/// What a render call did with its chart.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartOutcome {
    Saved(PathBuf),
    Displayed,
}

fn write_file(dir: &Path, filename: &str, bytes: &[u8]) -> ChartResult<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Save or show a static chart.
pub fn deliver_image(
    output: Output<'_>,
    chart: ChartKind,
    forecast: &ForecastTime,
    style: &DateStyle,
    image: &RgbaImage,
    dpi: u32,
) -> ChartResult<ChartOutcome> {
    let filename = chart_filename(chart, forecast, style);
    match output {
        Output::Directory(dir) => {
            let png = encode_png(
                image.as_raw(),
                image.width() as usize,
                image.height() as usize,
                dpi,
            )?;
            let path = write_file(&dir, &filename, &png)?;
            info!(chart = chart.name(), path = %path.display(), bytes = png.len(), "Saved chart");
            Ok(ChartOutcome::Saved(path))
        }
        Output::Display(viewer) => {
            viewer.show_image(image, &filename)?;
            info!(chart = chart.name(), "Displayed chart");
            Ok(ChartOutcome::Displayed)
        }
    }
}

/// Save or show an animated chart.
pub fn deliver_animation(
    output: Output<'_>,
    chart: ChartKind,
    forecast: &ForecastTime,
    style: &DateStyle,
    frames: &[RgbaImage],
    delay_ms: u32,
) -> ChartResult<ChartOutcome> {
    let filename = chart_filename(chart, forecast, style);
    match output {
        Output::Directory(dir) => {
            let gif = encode_gif(frames, delay_ms)?;
            let path = write_file(&dir, &filename, &gif)?;
            info!(
                chart = chart.name(),
                path = %path.display(),
                frames = frames.len(),
                bytes = gif.len(),
                "Saved animation"
            );
            Ok(ChartOutcome::Saved(path))
        }
        Output::Display(viewer) => {
            viewer.show_animation(frames, delay_ms, &filename)?;
            info!(chart = chart.name(), frames = frames.len(), "Displayed animation");
            Ok(ChartOutcome::Displayed)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_utils::reference_time;

    #[derive(Default)]
    struct CountingViewer {
        images: usize,
        animations: usize,
    }

    impl Viewer for CountingViewer {
        fn show_image(&mut self, _image: &RgbaImage, _title: &str) -> ChartResult<()> {
            self.images += 1;
            Ok(())
        }

        fn show_animation(&mut self, _frames: &[RgbaImage], _delay_ms: u32, _title: &str) -> ChartResult<()> {
            self.animations += 1;
            Ok(())
        }
    }

    #[test]
    fn test_chart_filename() {
        let ft = ForecastTime::new(reference_time(), 24.0);
        assert_eq!(
            chart_filename(ChartKind::GhRain, &ft, &DateStyle::Chinese),
            "高度场_降水_预报_起报时间_2024年01月15日08时预报时效_24小时.png"
        );
        assert_eq!(
            chart_filename(ChartKind::CumulatedPrecipEvo, &ft, &DateStyle::Chinese),
            "累积降水演变_预报_起报时间_2024年01月15日08时预报时效_24小时.gif"
        );
    }

    #[test]
    fn test_filename_is_deterministic() {
        let a = ForecastTime::new(reference_time(), 36.0);
        let b = ForecastTime::new(reference_time(), 36.0);
        for chart in [
            ChartKind::GhRain,
            ChartKind::MslpRainSnow,
            ChartKind::RainEvo,
            ChartKind::CumulatedPrecipEvo,
        ] {
            assert_eq!(
                chart_filename(chart, &a, &DateStyle::Chinese),
                chart_filename(chart, &b, &DateStyle::Chinese)
            );
        }
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes: std::collections::HashSet<_> = [
            ChartKind::GhRain,
            ChartKind::MslpRainSnow,
            ChartKind::RainEvo,
            ChartKind::CumulatedPrecipEvo,
        ]
        .iter()
        .map(|c| c.filename_prefix())
        .collect();
        assert_eq!(prefixes.len(), 4);
    }

    #[test]
    fn test_directory_output_writes_file_only() {
        let dir = test_utils::temp_test_dir();
        let out_dir = dir.path().join("charts");
        let image = RgbaImage::from_pixel(4, 4, image::Rgba([255, 255, 255, 255]));
        let ft = ForecastTime::new(reference_time(), 24.0);

        let outcome = deliver_image(
            Output::Directory(out_dir.clone()),
            ChartKind::MslpRainSnow,
            &ft,
            &DateStyle::Chinese,
            &image,
            200,
        )
        .unwrap();

        let expected = out_dir.join(chart_filename(ChartKind::MslpRainSnow, &ft, &DateStyle::Chinese));
        assert_eq!(outcome, ChartOutcome::Saved(expected.clone()));
        assert!(expected.exists());
    }

    #[test]
    fn test_display_output_calls_viewer_only() {
        let dir = test_utils::temp_test_dir();
        let image = RgbaImage::new(4, 4);
        let ft = ForecastTime::new(reference_time(), 24.0);
        let mut viewer = CountingViewer::default();

        let outcome = deliver_image(
            Output::Display(&mut viewer),
            ChartKind::GhRain,
            &ft,
            &DateStyle::Chinese,
            &image,
            200,
        )
        .unwrap();

        assert_eq!(outcome, ChartOutcome::Displayed);
        assert_eq!(viewer.images, 1);
        assert_eq!(viewer.animations, 0);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn test_animation_display() {
        let frames = vec![RgbaImage::new(4, 4); 4];
        let ft = ForecastTime::new(reference_time(), 6.0);
        let mut viewer = CountingViewer::default();
        let outcome = deliver_animation(
            Output::Display(&mut viewer),
            ChartKind::CumulatedPrecipEvo,
            &ft,
            &DateStyle::Chinese,
            &frames,
            1000,
        )
        .unwrap();
        assert_eq!(outcome, ChartOutcome::Displayed);
        assert_eq!(viewer.animations, 1);
    }
}

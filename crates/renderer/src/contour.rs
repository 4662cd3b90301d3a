//! Contour line (isoline) generation and drawing using marching squares.
//!
//! Contours are traced in grid index space, joined into polylines and
//! smoothed, then converted to lon/lat so they can be projected onto any map.
//! Drawing happens in pixel space with inline numeric labels.

use chart_common::GriddedField;
use projection::Viewport;
use tiny_skia::{FillRule, LineCap, LineJoin, Mask, Paint, PathBuilder, Pixmap, Stroke, Transform};
use tracing::debug;

use crate::figure::project_path;
use crate::text::{TextRenderer, TextStyle};

/// A point in 2D space (grid indices or pixel coordinates)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// A line segment between two points
#[derive(Debug, Clone)]
pub struct Segment {
    pub start: Point,
    pub end: Point,
}

/// A complete contour line (polyline)
#[derive(Debug, Clone)]
pub struct Contour {
    pub level: f32,
    pub points: Vec<Point>,
    pub closed: bool,
}

/// A contour line in geographic coordinates (lon, lat).
#[derive(Debug, Clone, PartialEq)]
pub struct GeoContour {
    pub level: f32,
    pub points: Vec<(f64, f64)>,
    pub closed: bool,
}

/// Configuration for contour rendering
#[derive(Debug, Clone)]
pub struct ContourConfig {
    /// Contour levels to draw
    pub levels: Vec<f32>,
    /// Line width in pixels
    pub line_width: f32,
    /// Line color [R, G, B, A]
    pub line_color: [u8; 4],
    /// Number of smoothing passes (0 = no smoothing)
    pub smoothing_passes: u32,
    /// Whether to draw labels on contour lines
    pub labels_enabled: bool,
    /// Font size for labels (pixels)
    pub label_font_size: f32,
    /// Minimum spacing between labels (in pixels)
    pub label_spacing: f32,
}

impl Default for ContourConfig {
    fn default() -> Self {
        Self {
            levels: vec![],
            line_width: 2.0,
            line_color: [0, 0, 0, 255],
            smoothing_passes: 1,
            labels_enabled: false,
            label_font_size: 10.0,
            label_spacing: 150.0,
        }
    }
}

impl ContourConfig {
    /// Label text for a level, formatted as an integer.
    pub fn get_level_label(&self, level: f32) -> String {
        format!("{:.0}", level)
    }
}

// ============================================================================
// Level schedules
// ============================================================================

/// Levels `start, start + step, ...` strictly below `stop`.
pub fn stepped_levels(start: f64, stop: f64, step: f64) -> Vec<f32> {
    if step <= 0.0 || stop <= start {
        return vec![];
    }
    let count = ((stop - start) / step).ceil() as usize;
    (0..count)
        .map(|i| (start + i as f64 * step) as f32)
        .collect()
}

/// Concatenate level schedules, then sort and drop duplicates.
pub fn merge_levels(schedules: &[Vec<f32>]) -> Vec<f32> {
    let mut levels: Vec<f32> = schedules.iter().flatten().copied().collect();
    levels.sort_by(f32::total_cmp);
    levels.dedup();
    levels
}

/// Geopotential height levels (dagpm), overlapping ranges kept as published.
pub fn geopotential_height_levels() -> Vec<f32> {
    merge_levels(&[
        stepped_levels(0.0, 480.0, 4.0),
        stepped_levels(480.0, 584.0, 8.0),
        stepped_levels(580.0, 604.0, 4.0),
        stepped_levels(604.0, 2000.0, 8.0),
    ])
}

/// Sea-level pressure levels (hPa).
pub fn sea_level_pressure_levels() -> Vec<f32> {
    stepped_levels(900.0, 1100.0, 2.5)
}

// ============================================================================
// Marching squares
// ============================================================================

/// Marching squares algorithm to generate contour lines
///
/// # Arguments
/// * `data` - Grid data in row-major order
/// * `width` - Grid width
/// * `height` - Grid height
/// * `level` - Contour level to extract
///
/// # Returns
/// Vector of line segments representing the contour
pub fn march_squares(data: &[f32], width: usize, height: usize, level: f32) -> Vec<Segment> {
    if width < 2 || height < 2 || data.len() != width * height {
        return vec![];
    }

    let mut segments = Vec::new();

    for y in 0..(height - 1) {
        for x in 0..(width - 1) {
            let tl = data[y * width + x];
            let tr = data[y * width + x + 1];
            let bl = data[(y + 1) * width + x];
            let br = data[(y + 1) * width + x + 1];

            // Skip cells with NaN values
            if tl.is_nan() || tr.is_nan() || bl.is_nan() || br.is_nan() {
                continue;
            }

            let mut cell_index = 0;
            if tl >= level {
                cell_index |= 1;
            }
            if tr >= level {
                cell_index |= 2;
            }
            if br >= level {
                cell_index |= 4;
            }
            if bl >= level {
                cell_index |= 8;
            }

            segments.extend(get_cell_segments(
                cell_index, x as f32, y as f32, [tl, tr, br, bl], level,
            ));
        }
    }

    segments
}

/// Get line segments for a marching squares cell
///
/// Uses linear interpolation to find where the contour crosses cell edges.
/// `corners` is `[tl, tr, br, bl]`.
fn get_cell_segments(cell_index: u8, x: f32, y: f32, corners: [f32; 4], level: f32) -> Vec<Segment> {
    let [tl, tr, br, bl] = corners;
    let top = interpolate_edge((x, y), (x + 1.0, y), tl, tr, level);
    let right = interpolate_edge((x + 1.0, y), (x + 1.0, y + 1.0), tr, br, level);
    let bottom = interpolate_edge((x, y + 1.0), (x + 1.0, y + 1.0), bl, br, level);
    let left = interpolate_edge((x, y), (x, y + 1.0), tl, bl, level);

    let seg = |start, end| Segment { start, end };
    match cell_index {
        0 | 15 => vec![],
        1 | 14 => vec![seg(left, top)],
        2 | 13 => vec![seg(top, right)],
        3 | 12 => vec![seg(left, right)],
        4 | 11 => vec![seg(right, bottom)],
        // Saddles: two separate segments
        5 => vec![seg(left, top), seg(right, bottom)],
        6 | 9 => vec![seg(top, bottom)],
        7 | 8 => vec![seg(left, bottom)],
        10 => vec![seg(top, right), seg(left, bottom)],
        _ => vec![],
    }
}

/// Linearly interpolate between two edge points based on data values
fn interpolate_edge(p1: (f32, f32), p2: (f32, f32), val1: f32, val2: f32, level: f32) -> Point {
    if (val2 - val1).abs() < 1e-6 {
        return Point::new((p1.0 + p2.0) / 2.0, (p1.1 + p2.1) / 2.0);
    }

    let t = ((level - val1) / (val2 - val1)).clamp(0.0, 1.0);
    Point::new(p1.0 + t * (p2.0 - p1.0), p1.1 + t * (p2.1 - p1.1))
}

fn distance(a: Point, b: Point) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

/// Connect line segments into continuous polylines
///
/// Takes a collection of unordered segments and tries to connect them
/// into continuous contour lines.
pub fn connect_segments(segments: Vec<Segment>, level: f32) -> Vec<Contour> {
    let mut contours = Vec::new();
    let mut used = vec![false; segments.len()];
    let epsilon = 0.001;

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }

        let mut points = vec![segments[start_idx].start, segments[start_idx].end];
        let mut current_end = segments[start_idx].end;
        used[start_idx] = true;

        let mut changed = true;
        while changed {
            changed = false;
            for (i, seg) in segments.iter().enumerate() {
                if used[i] {
                    continue;
                }
                let next = if distance(seg.start, current_end) < epsilon {
                    seg.end
                } else if distance(seg.end, current_end) < epsilon {
                    seg.start
                } else {
                    continue;
                };
                points.push(next);
                current_end = next;
                used[i] = true;
                changed = true;
                break;
            }
        }

        let closed = distance(points[0], current_end) < epsilon;
        contours.push(Contour {
            level,
            points,
            closed,
        });
    }

    contours
}

/// Apply Chaikin's corner cutting algorithm for smoothing
pub fn smooth_contour(contour: &Contour, iterations: u32) -> Contour {
    if iterations == 0 || contour.points.len() < 3 {
        return contour.clone();
    }

    let mut points = contour.points.clone();

    for _ in 0..iterations {
        let mut new_points = Vec::with_capacity(points.len() * 2 + 2);
        if !contour.closed {
            new_points.push(points[0]);
        }

        let pairs = if contour.closed {
            points.len()
        } else {
            points.len() - 1
        };
        for i in 0..pairs {
            let p1 = points[i];
            let p2 = points[(i + 1) % points.len()];
            // Two new points at 25% and 75% along the segment
            new_points.push(Point::new(0.75 * p1.x + 0.25 * p2.x, 0.75 * p1.y + 0.25 * p2.y));
            new_points.push(Point::new(0.25 * p1.x + 0.75 * p2.x, 0.25 * p1.y + 0.75 * p2.y));
        }

        if !contour.closed {
            new_points.push(points[points.len() - 1]);
        }
        points = new_points;
    }

    Contour {
        level: contour.level,
        points,
        closed: contour.closed,
    }
}

/// Generate all contours for multiple levels, in grid index space.
pub fn generate_all_contours(
    data: &[f32],
    width: usize,
    height: usize,
    config: &ContourConfig,
) -> Vec<Contour> {
    let mut all_contours = Vec::new();

    for &level in &config.levels {
        let segments = march_squares(data, width, height, level);
        for contour in connect_segments(segments, level) {
            all_contours.push(smooth_contour(&contour, config.smoothing_passes));
        }
    }

    all_contours
}

/// Contour `data` (one step laid out on `field`'s grid) and convert the
/// lines to lon/lat.
pub fn contour_field(field: &GriddedField, data: &[f32], config: &ContourConfig) -> Vec<GeoContour> {
    let contours = generate_all_contours(data, field.nx(), field.ny(), config);

    debug!(
        field = field.name(),
        num_levels = config.levels.len(),
        num_contours = contours.len(),
        total_points = contours.iter().map(|c| c.points.len()).sum::<usize>(),
        "Generated contours"
    );

    contours
        .into_iter()
        .map(|c| GeoContour {
            level: c.level,
            points: c
                .points
                .iter()
                .map(|p| field.index_to_lonlat(p.x as f64, p.y as f64))
                .collect(),
            closed: c.closed,
        })
        .collect()
}

/// Project geographic contours to pixel space. Lines leaving the projection's
/// domain or crossing its seam are split.
pub fn project_contours(contours: &[GeoContour], viewport: &Viewport) -> Vec<Contour> {
    let mut projected = Vec::new();
    for contour in contours {
        let parts = project_path(viewport, &contour.points);
        let whole = parts.len() == 1;
        for part in parts {
            projected.push(Contour {
                level: contour.level,
                points: part.into_iter().map(|(x, y)| Point::new(x, y)).collect(),
                closed: contour.closed && whole,
            });
        }
    }
    projected
}

// ============================================================================
// Drawing
// ============================================================================

/// How inline labels are lettered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelGlyphs {
    /// Glyphs from the loaded TrueType font
    Font,
    /// Built-in seven-segment digits, used when no font is loaded
    Segments,
}

impl LabelGlyphs {
    pub fn for_renderer(text: &TextRenderer) -> Self {
        if text.is_enabled() {
            LabelGlyphs::Font
        } else {
            LabelGlyphs::Segments
        }
    }
}

/// Stroke pixel-space contours onto `pixmap`, then draw their labels.
pub fn stroke_contours(
    pixmap: &mut Pixmap,
    contours: &[Contour],
    config: &ContourConfig,
    text: &TextRenderer,
    opacity: f32,
    clip: Option<&Mask>,
) {
    let (width, height) = (pixmap.width() as usize, pixmap.height() as usize);
    let mut label_positions: Vec<LabelPosition> = Vec::new();

    let [r, g, b, a] = config.line_color;
    let mut paint = Paint::default();
    paint.set_color_rgba8(r, g, b, (a as f32 * opacity).round() as u8);
    paint.anti_alias = true;

    let stroke = Stroke {
        width: config.line_width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    for contour in contours {
        if contour.points.len() < 2 {
            continue;
        }

        let mut pb = PathBuilder::new();
        pb.move_to(contour.points[0].x, contour.points[0].y);
        for point in &contour.points[1..] {
            pb.line_to(point.x, point.y);
        }
        if contour.closed {
            pb.close();
        }

        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), clip);
        }

        if config.labels_enabled {
            collect_label_positions(contour, config, &mut label_positions, width, height);
        }
    }

    // Labels go on top of every line
    let glyphs = LabelGlyphs::for_renderer(text);
    for pos in &label_positions {
        draw_text_label(pixmap, pos, config, text, glyphs, clip);
    }
}

/// Position and metadata for a contour label
#[derive(Debug, Clone)]
struct LabelPosition {
    x: f32,
    y: f32,
    /// Rotation angle in radians
    angle: f32,
    text: String,
}

/// Calculate the total length of a contour
fn contour_length(contour: &Contour) -> f32 {
    contour
        .points
        .windows(2)
        .map(|w| distance(w[0], w[1]))
        .sum()
}

/// Collect label positions along a contour line
fn collect_label_positions(
    contour: &Contour,
    config: &ContourConfig,
    positions: &mut Vec<LabelPosition>,
    width: usize,
    height: usize,
) {
    let total_length = contour_length(contour);
    if total_length < config.label_spacing * 0.5 {
        return;
    }

    let label_text = config.get_level_label(contour.level);
    let margin = config.label_font_size * 2.0;

    let num_labels = ((total_length / config.label_spacing).floor() as usize).max(1);
    let spacing = total_length / (num_labels as f32 + 1.0);

    let mut accumulated_length = 0.0;
    let mut next_label_at = spacing;
    let mut label_count = 0;

    for i in 1..contour.points.len() {
        if label_count >= num_labels {
            break;
        }

        let p1 = contour.points[i - 1];
        let p2 = contour.points[i];
        let dx = p2.x - p1.x;
        let dy = p2.y - p1.y;
        let segment_length = (dx * dx + dy * dy).sqrt();

        while accumulated_length + segment_length >= next_label_at && label_count < num_labels {
            let t = (next_label_at - accumulated_length) / segment_length;
            let x = p1.x + t * dx;
            let y = p1.y + t * dy;

            if x > margin && x < (width as f32 - margin) && y > margin && y < (height as f32 - margin) {
                let angle = dy.atan2(dx);
                // Keep text upright
                let angle = if angle.abs() > std::f32::consts::FRAC_PI_2 {
                    angle + std::f32::consts::PI
                } else {
                    angle
                };

                let min_distance = config.label_font_size * 4.0;
                let has_overlap = positions.iter().any(|pos| {
                    let dist_sq = (pos.x - x).powi(2) + (pos.y - y).powi(2);
                    dist_sq < min_distance * min_distance
                });

                if !has_overlap {
                    positions.push(LabelPosition {
                        x,
                        y,
                        angle,
                        text: label_text.clone(),
                    });
                }
            }

            next_label_at += spacing;
            label_count += 1;
        }

        accumulated_length += segment_length;
    }
}

/// Draw a text label at the given position with rotation
fn draw_text_label(
    pixmap: &mut Pixmap,
    pos: &LabelPosition,
    config: &ContourConfig,
    text: &TextRenderer,
    glyphs: LabelGlyphs,
    clip: Option<&Mask>,
) {
    let font_size = config.label_font_size;
    let color = config.line_color;
    let char_width = font_size * 0.6;
    let char_height = font_size;
    let char_spacing = font_size * 0.1;
    let text_width = match glyphs {
        LabelGlyphs::Font => text.measure(&pos.text, font_size).0,
        LabelGlyphs::Segments => {
            pos.text.len() as f32 * (char_width + char_spacing) - char_spacing
        }
    };

    // White background so the label reads "inline"
    let bg_padding = font_size * 0.2;
    let half_w = text_width / 2.0 + bg_padding;
    let half_h = char_height / 2.0 + bg_padding;

    let (sin_a, cos_a) = pos.angle.sin_cos();
    let rotate = |px: f32, py: f32| (px * cos_a - py * sin_a + pos.x, px * sin_a + py * cos_a + pos.y);

    let mut bg_paint = Paint::default();
    bg_paint.set_color_rgba8(255, 255, 255, 220);
    bg_paint.anti_alias = true;

    let mut pb = PathBuilder::new();
    for (i, (cx, cy)) in [(-half_w, -half_h), (half_w, -half_h), (half_w, half_h), (-half_w, half_h)]
        .into_iter()
        .enumerate()
    {
        let (rx, ry) = rotate(cx, cy);
        if i == 0 {
            pb.move_to(rx, ry);
        } else {
            pb.line_to(rx, ry);
        }
    }
    pb.close();
    if let Some(path) = pb.finish() {
        pixmap.fill_path(&path, &bg_paint, FillRule::Winding, Transform::identity(), clip);
    }

    if glyphs == LabelGlyphs::Font {
        let style = TextStyle::new(font_size, color);
        text.draw_rotated(pixmap, &pos.text, pos.x, pos.y, pos.angle, &style, clip);
        return;
    }

    let mut text_paint = Paint::default();
    text_paint.set_color_rgba8(color[0], color[1], color[2], color[3]);
    text_paint.anti_alias = true;

    let start_x = -text_width / 2.0;
    for (i, ch) in pos.text.chars().enumerate() {
        let char_x = start_x + i as f32 * (char_width + char_spacing) + char_width / 2.0;
        let (rx, ry) = rotate(char_x, 0.0);
        draw_character(pixmap, (rx, ry), pos.angle, ch, (char_width, char_height), &text_paint, clip);
    }
}

/// Draw a single character as 7-segment style strokes
fn draw_character(
    pixmap: &mut Pixmap,
    center: (f32, f32),
    angle: f32,
    ch: char,
    size: (f32, f32),
    paint: &Paint,
    clip: Option<&Mask>,
) {
    let (sin_a, cos_a) = angle.sin_cos();
    let half_w = size.0 / 2.0;
    let half_h = size.1 / 2.0;

    let stroke = Stroke {
        width: size.0 * 0.15,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };

    let rotate = |px: f32, py: f32| (px * cos_a - py * sin_a + center.0, px * sin_a + py * cos_a + center.1);

    let top = ((-half_w, -half_h), (half_w, -half_h));
    let bottom = ((half_w, half_h), (-half_w, half_h));
    let middle = ((-half_w, 0.0), (half_w, 0.0));
    let left = ((-half_w, half_h), (-half_w, -half_h));
    let right = ((half_w, -half_h), (half_w, half_h));
    let top_left = ((-half_w, -half_h), (-half_w, 0.0));
    let top_right = ((half_w, -half_h), (half_w, 0.0));
    let bottom_left = ((-half_w, 0.0), (-half_w, half_h));
    let bottom_right = ((half_w, 0.0), (half_w, half_h));

    let segments: Vec<((f32, f32), (f32, f32))> = match ch {
        '0' => vec![top, right, bottom, left],
        '1' => vec![((0.0, -half_h), (0.0, half_h))],
        '2' => vec![top, top_right, middle, bottom_left, bottom],
        '3' => vec![top, right, bottom, middle],
        '4' => vec![top_left, middle, right],
        '5' => vec![top, top_left, middle, bottom_right, bottom],
        '6' => vec![top, left, bottom, bottom_right, middle],
        '7' => vec![top, ((half_w, -half_h), (0.0, half_h))],
        '8' => vec![top, right, bottom, left, middle],
        '9' => vec![middle, top_right, top, top_left, bottom_right],
        '-' => vec![middle],
        '.' => vec![((0.0, half_h * 0.7), (0.0, half_h * 0.8))],
        _ => vec![],
    };

    for ((x1, y1), (x2, y2)) in segments {
        let (rx1, ry1) = rotate(x1, y1);
        let (rx2, ry2) = rotate(x2, y2);

        let mut pb = PathBuilder::new();
        pb.move_to(rx1, ry1);
        pb.line_to(rx2, ry2);

        if let Some(path) = pb.finish() {
            pixmap.stroke_path(&path, paint, &stroke, Transform::identity(), clip);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stepped_levels_half_open() {
        assert_eq!(stepped_levels(0.0, 20.0, 5.0), vec![0.0, 5.0, 10.0, 15.0]);
        assert_eq!(stepped_levels(900.0, 905.0, 2.5), vec![900.0, 902.5]);
        assert!(stepped_levels(5.0, 5.0, 1.0).is_empty());
    }

    #[test]
    fn test_geopotential_height_levels() {
        let levels = geopotential_height_levels();
        assert!(levels.windows(2).all(|w| w[1] > w[0]));
        assert_eq!(levels[0], 0.0);
        assert_eq!(*levels.last().unwrap(), 1996.0);
        // Fine spacing around the 588 line, coarse in the 480-576 band
        assert!(levels.contains(&588.0));
        let overlap: Vec<f32> = levels
            .iter()
            .copied()
            .filter(|l| (576.0..=592.0).contains(l))
            .collect();
        assert_eq!(overlap, vec![576.0, 580.0, 584.0, 588.0, 592.0]);
        assert!(!levels.contains(&484.0));
        assert!(levels.contains(&488.0));
        assert!(!levels.contains(&2000.0));
    }

    #[test]
    fn test_sea_level_pressure_levels() {
        let levels = sea_level_pressure_levels();
        assert_eq!(levels.len(), 80);
        assert_eq!(levels[0], 900.0);
        assert_eq!(levels[1], 902.5);
        assert_eq!(*levels.last().unwrap(), 1097.5);
    }

    #[test]
    fn test_merge_levels_dedups() {
        let merged = merge_levels(&[vec![4.0, 0.0], vec![4.0, 8.0]]);
        assert_eq!(merged, vec![0.0, 4.0, 8.0]);
    }

    #[test]
    fn test_interpolate_edge() {
        let p = interpolate_edge((0.0, 0.0), (1.0, 0.0), 0.0, 10.0, 5.0);
        assert!((p.x - 0.5).abs() < 0.01);
        assert!((p.y - 0.0).abs() < 0.01);
    }

    #[test]
    fn test_march_squares_flat() {
        let data = vec![5.0; 9];
        let segments = march_squares(&data, 3, 3, 5.0);
        assert_eq!(segments.len(), 0);
    }

    #[test]
    fn test_peak_gives_closed_contour() {
        #[rustfmt::skip]
        let data = vec![
            0.0, 0.0, 0.0,
            0.0, 10.0, 0.0,
            0.0, 0.0, 0.0,
        ];
        let segments = march_squares(&data, 3, 3, 5.0);
        assert_eq!(segments.len(), 4);
        let contours = connect_segments(segments, 5.0);
        assert_eq!(contours.len(), 1);
        assert!(contours[0].closed);
        assert_eq!(contours[0].level, 5.0);
    }

    #[test]
    fn test_smooth_open_contour_keeps_endpoints() {
        let contour = Contour {
            level: 1.0,
            points: vec![Point::new(0.0, 0.0), Point::new(1.0, 1.0), Point::new(2.0, 0.0)],
            closed: false,
        };
        let smoothed = smooth_contour(&contour, 1);
        assert_eq!(smoothed.points.first(), Some(&Point::new(0.0, 0.0)));
        assert_eq!(smoothed.points.last(), Some(&Point::new(2.0, 0.0)));
        assert_eq!(smoothed.points.len(), 6);
    }

    #[test]
    fn test_stroke_contours_draws_pixels() {
        let mut pixmap = Pixmap::new(64, 64).unwrap();
        let contour = Contour {
            level: 588.0,
            points: vec![Point::new(4.0, 32.0), Point::new(60.0, 32.0)],
            closed: false,
        };
        let config = ContourConfig {
            line_width: 3.0,
            ..ContourConfig::default()
        };
        stroke_contours(&mut pixmap, &[contour], &config, &TextRenderer::disabled(), 1.0, None);
        let idx = (32 * 64 + 30) as usize;
        assert!(pixmap.pixels()[idx].alpha() > 200);
        assert_eq!(pixmap.pixels()[0].alpha(), 0);
    }

    fn labelled_line() -> (Contour, ContourConfig) {
        let contour = Contour {
            level: 588.0,
            points: vec![Point::new(10.0, 100.0), Point::new(390.0, 100.0)],
            closed: false,
        };
        let config = ContourConfig {
            line_width: 1.0,
            labels_enabled: true,
            label_font_size: 16.0,
            label_spacing: 300.0,
            ..ContourConfig::default()
        };
        (contour, config)
    }

    #[test]
    fn test_label_glyphs_follow_font() {
        assert_eq!(LabelGlyphs::for_renderer(&TextRenderer::disabled()), LabelGlyphs::Segments);

        let font_path = test_utils::require_font!();
        let text = TextRenderer::from_file(&font_path).unwrap();
        assert_eq!(LabelGlyphs::for_renderer(&text), LabelGlyphs::Font);
    }

    #[test]
    fn test_font_labels_differ_from_segment_labels() {
        let font_path = test_utils::require_font!();
        let font = TextRenderer::from_file(&font_path).unwrap();
        let (contour, config) = labelled_line();

        let mut with_font = Pixmap::new(400, 200).unwrap();
        stroke_contours(&mut with_font, &[contour.clone()], &config, &font, 1.0, None);
        let mut with_segments = Pixmap::new(400, 200).unwrap();
        stroke_contours(
            &mut with_segments,
            &[contour],
            &config,
            &TextRenderer::disabled(),
            1.0,
            None,
        );

        assert_ne!(with_font.data(), with_segments.data());
    }

    #[test]
    fn test_segment_labels_drawn_without_font() {
        let (contour, config) = labelled_line();
        let mut labelled = Pixmap::new(400, 200).unwrap();
        stroke_contours(&mut labelled, &[contour.clone()], &config, &TextRenderer::disabled(), 1.0, None);
        let mut plain = Pixmap::new(400, 200).unwrap();
        let unlabelled = ContourConfig {
            labels_enabled: false,
            ..config
        };
        stroke_contours(&mut plain, &[contour], &unlabelled, &TextRenderer::disabled(), 1.0, None);

        assert_ne!(labelled.data(), plain.data());
    }
}

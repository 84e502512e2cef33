//! Software rasteriser used when no suitable GL context exists. The scene is
//! drawn into a premultiplied RGBA buffer and uploaded as one texture.

use std::ops::RangeInclusive;

use eframe::egui::{
    Color32, ColorImage, Context, Pos2, Rect, TextureHandle, TextureOptions, Ui, Vec2, pos2, vec2,
};

use super::super::scene::SceneIntent;
use super::{BackendKind, SceneRenderer, paint_text_layers};

/// Premultiplied RGBA8 pixel buffer with source-over blending.
#[derive(Default)]
pub struct Raster {
    width: usize,
    height: usize,
    pixels: Vec<u8>,
}

impl Raster {
    pub fn new(width: usize, height: usize) -> Self {
        let mut raster = Self::default();
        raster.resize(width, height);
        raster
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
        self.pixels.resize(width * height * 4, 0);
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn bytes(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: usize, y: usize) -> Color32 {
        let offset = (y * self.width + x) * 4;
        Color32::from_rgba_premultiplied(
            self.pixels[offset],
            self.pixels[offset + 1],
            self.pixels[offset + 2],
            self.pixels[offset + 3],
        )
    }

    pub fn clear(&mut self, color: Color32) {
        for chunk in self.pixels.chunks_exact_mut(4) {
            chunk.copy_from_slice(&color.to_array());
        }
    }

    pub fn release(&mut self) {
        self.width = 0;
        self.height = 0;
        self.pixels = Vec::new();
    }

    /// Source-over blend of `color` scaled by `coverage` in [0, 1].
    pub fn blend(&mut self, x: i64, y: i64, color: Color32, coverage: f32) {
        if x < 0 || y < 0 || x as usize >= self.width || y as usize >= self.height {
            return;
        }
        let coverage = coverage.clamp(0.0, 1.0);
        if coverage <= 0.0 {
            return;
        }

        let offset = (y as usize * self.width + x as usize) * 4;
        let src = color.to_array().map(|channel| channel as f32 * coverage);
        let inverse = 1.0 - src[3] / 255.0;
        for (channel, source) in self.pixels[offset..offset + 4].iter_mut().zip(src) {
            *channel = (source + *channel as f32 * inverse).round().clamp(0.0, 255.0) as u8;
        }
    }

    /// Pixel columns and rows touched by `[min, max]`, limited to the buffer.
    fn pixel_span(&self, min: Pos2, max: Pos2) -> (RangeInclusive<i64>, RangeInclusive<i64>) {
        let clamp = |value: f32, len: usize| (value as i64).clamp(-1, len as i64);
        let xs = clamp(min.x.floor(), self.width)..=clamp(max.x.ceil(), self.width);
        let ys = clamp(min.y.floor(), self.height)..=clamp(max.y.ceil(), self.height);
        (xs, ys)
    }

    pub fn fill_disk(&mut self, center: Pos2, radius: f32, color: Color32) {
        let reach = Vec2::splat(radius + 1.0);
        let (xs, ys) = self.pixel_span(center - reach, center + reach);

        for y in ys {
            for x in xs.clone() {
                let distance = pos2(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                self.blend(x, y, color, radius + 0.5 - distance);
            }
        }
    }

    pub fn stroke_ring(&mut self, center: Pos2, radius: f32, width: f32, color: Color32) {
        let reach = Vec2::splat(radius + width + 1.0);
        let (xs, ys) = self.pixel_span(center - reach, center + reach);
        let half = width * 0.5;

        for y in ys {
            for x in xs.clone() {
                let distance = pos2(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                self.blend(x, y, color, half + 0.5 - (distance - radius).abs());
            }
        }
    }

    /// Hairlines use Wu's algorithm; wider lines use distance coverage.
    pub fn draw_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32) {
        let bounds = Rect::from_min_size(Pos2::ZERO, vec2(self.width as f32, self.height as f32))
            .expand(width * 0.5 + 2.0);
        let Some((from, to)) = clip_segment(from, to, bounds) else {
            return;
        };
        if width <= 1.5 {
            self.wu_line(from, to, color, width.clamp(0.3, 1.0));
        } else {
            self.thick_line(from, to, width, color);
        }
    }

    fn wu_line(&mut self, from: Pos2, to: Pos2, color: Color32, intensity: f32) {
        let steep = (to.y - from.y).abs() > (to.x - from.x).abs();
        let (mut a, mut b) = if steep {
            (pos2(from.y, from.x), pos2(to.y, to.x))
        } else {
            (from, to)
        };
        if a.x > b.x {
            std::mem::swap(&mut a, &mut b);
        }

        let dx = b.x - a.x;
        let gradient = if dx.abs() <= f32::EPSILON {
            1.0
        } else {
            (b.y - a.y) / dx
        };

        let major_len = (if steep { self.height } else { self.width }) as i64;
        let mut plot = |major: i64, minor: i64, coverage: f32| {
            if steep {
                self.blend(minor, major, color, coverage * intensity);
            } else {
                self.blend(major, minor, color, coverage * intensity);
            }
        };

        let start = (a.x.round() as i64).max(-1);
        let end = (b.x.round() as i64).min(major_len);
        let mut y = a.y + gradient * (start as f32 - a.x);
        for x in start..=end {
            let base = y.floor();
            let fraction = y - base;
            plot(x, base as i64, 1.0 - fraction);
            plot(x, base as i64 + 1, fraction);
            y += gradient;
        }
    }

    fn thick_line(&mut self, from: Pos2, to: Pos2, width: f32, color: Color32) {
        let half = width * 0.5;
        let reach = Vec2::splat(half + 1.0);
        let (xs, ys) = self.pixel_span(from.min(to) - reach, from.max(to) + reach);
        let segment = to - from;
        let length_sq = segment.length_sq().max(f32::EPSILON);

        for y in ys {
            for x in xs.clone() {
                let point = pos2(x as f32 + 0.5, y as f32 + 0.5);
                let t = ((point - from).dot(segment) / length_sq).clamp(0.0, 1.0);
                let distance = point.distance(from + segment * t);
                self.blend(x, y, color, half + 0.5 - distance);
            }
        }
    }
}

/// Liang-Barsky clip of `from..to` against `bounds`.
fn clip_segment(from: Pos2, to: Pos2, bounds: Rect) -> Option<(Pos2, Pos2)> {
    if !from.x.is_finite() || !from.y.is_finite() || !to.x.is_finite() || !to.y.is_finite() {
        return None;
    }
    let delta = to - from;
    let (mut enter, mut exit) = (0.0f32, 1.0f32);
    for (p, q) in [
        (-delta.x, from.x - bounds.min.x),
        (delta.x, bounds.max.x - from.x),
        (-delta.y, from.y - bounds.min.y),
        (delta.y, bounds.max.y - from.y),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let t = q / p;
        if p < 0.0 {
            enter = enter.max(t);
        } else {
            exit = exit.min(t);
        }
        if enter > exit {
            return None;
        }
    }
    Some((from + delta * enter, from + delta * exit))
}

pub(super) fn rasterize(raster: &mut Raster, scene: &SceneIntent, origin: Pos2, scale: f32) {
    let to_pixels = |position: Pos2| pos2((position.x - origin.x) * scale, (position.y - origin.y) * scale);

    raster.clear(scene.background);
    for cluster in &scene.clusters {
        raster.fill_disk(to_pixels(cluster.position), cluster.radius * scale, cluster.fill);
    }
    for edge in &scene.edges {
        raster.draw_line(to_pixels(edge.from), to_pixels(edge.to), edge.width * scale, edge.color);
    }
    for node in &scene.nodes {
        let center = to_pixels(node.position);
        raster.fill_disk(center, node.radius * scale, node.fill);
        if let Some(outline) = node.outline {
            raster.stroke_ring(center, (node.radius + 1.5) * scale, 1.5 * scale, outline);
        }
    }
}

#[derive(Default)]
pub struct CanvasRenderer {
    raster: Raster,
    texture: Option<TextureHandle>,
}

impl SceneRenderer for CanvasRenderer {
    fn kind(&self) -> BackendKind {
        BackendKind::Canvas
    }

    fn paint(&mut self, ui: &mut Ui, rect: Rect, scene: &SceneIntent) {
        let scale = ui.ctx().pixels_per_point();
        let size = (rect.size() * scale).round().max(Vec2::splat(1.0));
        self.raster.resize(size.x as usize, size.y as usize);
        rasterize(&mut self.raster, scene, rect.min, scale);

        let image = ColorImage::from_rgba_premultiplied(
            [self.raster.width(), self.raster.height()],
            self.raster.bytes(),
        );
        if let Some(texture) = &mut self.texture {
            texture.set(image, TextureOptions::LINEAR);
        } else {
            self.texture = Some(ui.ctx().load_texture("scene-canvas", image, TextureOptions::LINEAR));
        }
        let Some(texture) = &self.texture else {
            return;
        };

        let painter = ui.painter_at(rect);
        painter.image(
            texture.id(),
            rect,
            Rect::from_min_max(pos2(0.0, 0.0), pos2(1.0, 1.0)),
            Color32::WHITE,
        );
        paint_text_layers(&painter, rect, scene);
    }

    fn release(&mut self, _ctx: &Context) {
        // Dropping the handle frees the texture.
        self.texture = None;
        self.raster.release();
    }
}

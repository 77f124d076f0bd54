// Copyright 2026 Hypermesh Foundation. All rights reserved.
// Neural Backdrop - Drawing Surfaces

use crate::color::Hsla;
use crate::error::SurfaceError;
use crate::types::Vec2;

/// A 2D raster target of known pixel size.
pub trait Surface {
    /// Current size in pixels as `(width, height)`.
    fn size(&self) -> (f64, f64);

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError>;

    fn fill_rect(
        &mut self,
        origin: Vec2,
        width: f64,
        height: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError>;

    fn stroke_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        width: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError>;

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Hsla) -> Result<(), SurfaceError>;
}

// ─── Raster ──────────────────────────────────────────────────────────────────

/// Software RGBA8 surface with source-over blending.
#[derive(Debug, Clone)]
pub struct Raster {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Raster {
    /// A transparent raster. Falls back to an empty 0x0 raster when the
    /// buffer size does not fit in `usize`.
    pub fn new(width: u32, height: u32) -> Self {
        match Self::byte_len(width, height) {
            Some(len) => Self {
                width,
                height,
                pixels: vec![0; len],
            },
            None => Self {
                width: 0,
                height: 0,
                pixels: Vec::new(),
            },
        }
    }

    fn byte_len(width: u32, height: u32) -> Option<usize> {
        (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(4))
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major RGBA8 bytes.
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = self.index(x, y);
        Some([
            self.pixels[i],
            self.pixels[i + 1],
            self.pixels[i + 2],
            self.pixels[i + 3],
        ])
    }

    #[cfg(feature = "cli")]
    pub fn to_image(&self) -> Option<image::RgbaImage> {
        image::RgbaImage::from_raw(self.width, self.height, self.pixels.clone())
    }

    fn index(&self, x: u32, y: u32) -> usize {
        ((y as usize) * (self.width as usize) + x as usize) * 4
    }

    fn blend(&mut self, x: u32, y: u32, rgba: [f64; 4], coverage: f64) {
        let alpha = (rgba[3] * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let i = self.index(x, y);
        for c in 0..3 {
            let dst = self.pixels[i + c] as f64 / 255.0;
            let out = rgba[c] * alpha + dst * (1.0 - alpha);
            self.pixels[i + c] = (out * 255.0).round() as u8;
        }
        let dst_a = self.pixels[i + 3] as f64 / 255.0;
        self.pixels[i + 3] = ((alpha + dst_a * (1.0 - alpha)) * 255.0).round() as u8;
    }

    /// Pixel span covering `[lo, hi]` on an axis of `extent` pixels.
    fn span(lo: f64, hi: f64, extent: u32) -> Option<(u32, u32)> {
        if extent == 0 || hi < 0.0 || lo >= extent as f64 || !lo.is_finite() || !hi.is_finite() {
            return None;
        }
        let start = lo.max(0.0).floor() as u32;
        let end = (hi.ceil().max(0.0) as u32).min(extent - 1);
        (start <= end).then_some((start, end))
    }
}

impl Surface for Raster {
    fn size(&self) -> (f64, f64) {
        (self.width as f64, self.height as f64)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if Self::byte_len(width, height).is_none() {
            return Err(SurfaceError::Backend(format!(
                "{width}x{height} raster does not fit in memory"
            )));
        }
        *self = Raster::new(width, height);
        Ok(())
    }

    fn fill_rect(
        &mut self,
        origin: Vec2,
        width: f64,
        height: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError> {
        let rgba = color.to_rgba();
        let (Some((x0, x1)), Some((y0, y1))) = (
            Self::span(origin.x, origin.x + width - 1.0, self.width),
            Self::span(origin.y, origin.y + height - 1.0, self.height),
        ) else {
            return Ok(());
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                self.blend(x, y, rgba, 1.0);
            }
        }
        Ok(())
    }

    fn stroke_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        width: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError> {
        let rgba = color.to_rgba();
        let half = (width / 2.0).max(0.5);
        let (Some((x0, x1)), Some((y0, y1))) = (
            Self::span(from.x.min(to.x) - half, from.x.max(to.x) + half, self.width),
            Self::span(from.y.min(to.y) - half, from.y.max(to.y) + half, self.height),
        ) else {
            return Ok(());
        };
        // Thin strokes keep their sub-pixel weight through coverage.
        let weight = width.clamp(0.0, 1.0);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let c = Vec2::new(x as f64 + 0.5, y as f64 + 0.5);
                let d = distance_to_segment(c, from, to);
                let coverage = (half + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, rgba, coverage * weight);
                }
            }
        }
        Ok(())
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Hsla) -> Result<(), SurfaceError> {
        if radius <= 0.0 {
            return Ok(());
        }
        let rgba = color.to_rgba();
        let (Some((x0, x1)), Some((y0, y1))) = (
            Self::span(center.x - radius, center.x + radius, self.width),
            Self::span(center.y - radius, center.y + radius, self.height),
        ) else {
            return Ok(());
        };
        for y in y0..=y1 {
            for x in x0..=x1 {
                let d = Vec2::new(x as f64 + 0.5, y as f64 + 0.5).distance(center);
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                self.blend(x, y, rgba, coverage);
            }
        }
        Ok(())
    }
}

fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f64 {
    let abx = b.x - a.x;
    let aby = b.y - a.y;
    let len_sq = abx * abx + aby * aby;
    if len_sq == 0.0 {
        return p.distance(a);
    }
    let t = (((p.x - a.x) * abx + (p.y - a.y) * aby) / len_sq).clamp(0.0, 1.0);
    p.distance(a.lerp(b, t))
}

// ─── Recorder ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        origin: Vec2,
        width: f64,
        height: f64,
        color: Hsla,
    },
    Line {
        from: Vec2,
        to: Vec2,
        width: f64,
        color: Hsla,
    },
    Circle {
        center: Vec2,
        radius: f64,
        color: Hsla,
    },
}

/// Surface that keeps a log of draw calls instead of pixels.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    width: u32,
    height: u32,
    commands: Vec<DrawCommand>,
    /// When set, every draw call fails with this error.
    fail_with: Option<SurfaceError>,
}

impl Recorder {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// A recorder whose draw calls all fail, for exercising error paths.
    pub fn failing(width: u32, height: u32, error: SurfaceError) -> Self {
        Self {
            fail_with: Some(error),
            ..Self::new(width, height)
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    pub fn take(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn set_failing(&mut self, error: Option<SurfaceError>) {
        self.fail_with = error;
    }

    fn record(&mut self, command: DrawCommand) -> Result<(), SurfaceError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.commands.push(command);
        Ok(())
    }
}

impl Surface for Recorder {
    fn size(&self) -> (f64, f64) {
        (self.width as f64, self.height as f64)
    }

    fn resize(&mut self, width: u32, height: u32) -> Result<(), SurfaceError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        self.width = width;
        self.height = height;
        Ok(())
    }

    fn fill_rect(
        &mut self,
        origin: Vec2,
        width: f64,
        height: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Rect {
            origin,
            width,
            height,
            color,
        })
    }

    fn stroke_line(
        &mut self,
        from: Vec2,
        to: Vec2,
        width: f64,
        color: Hsla,
    ) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Line {
            from,
            to,
            width,
            color,
        })
    }

    fn fill_circle(&mut self, center: Vec2, radius: f64, color: Hsla) -> Result<(), SurfaceError> {
        self.record(DrawCommand::Circle {
            center,
            radius,
            color,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

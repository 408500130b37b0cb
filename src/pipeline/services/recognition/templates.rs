use super::font;
use crate::error::TemplateError;
use image::{GrayImage, Luma};
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Templates whose pixel spread falls below this carry no shape to match.
const MIN_TEMPLATE_NORM: f64 = 1.0;

/// Which template set a line is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GlyphScale {
    Normal,
    /// Glyphs drawn twice as tall, used by big text boxes.
    Stretched,
}

/// One glyph bitmap with the statistics needed for normalized correlation.
#[derive(Debug, Clone)]
pub struct CharacterTemplate {
    glyph: char,
    bitmap: GrayImage,
    width: u32,
    is_stretched: bool,
    ink_offset: Option<u32>,
    centered: Vec<f64>,
    norm: f64,
}

impl CharacterTemplate {
    /// Builds a template. Bitmaps narrower than the declared font width are
    /// padded with background on the right.
    pub fn new(glyph: char, bitmap: GrayImage, is_stretched: bool, darkness: u8) -> Self {
        let declared = font::glyph_width(glyph);
        let bitmap = if bitmap.width() < declared {
            pad_right(&bitmap, declared)
        } else {
            bitmap
        };
        let width = bitmap.width();
        let ink_offset = (0..width).find(|&x| {
            (0..bitmap.height()).any(|y| bitmap.get_pixel(x, y).0[0] < darkness)
        });

        let count = (bitmap.width() * bitmap.height()) as f64;
        let mean = if count > 0.0 {
            bitmap.pixels().map(|p| f64::from(p.0[0])).sum::<f64>() / count
        } else {
            0.0
        };
        let centered: Vec<f64> = bitmap.pixels().map(|p| f64::from(p.0[0]) - mean).collect();
        let norm = centered.iter().map(|v| v * v).sum::<f64>().sqrt();

        Self {
            glyph,
            bitmap,
            width,
            is_stretched,
            ink_offset,
            centered,
            norm,
        }
    }

    /// Derives the big text variant by doubling every row.
    pub fn stretched(&self, darkness: u8) -> Self {
        let source = &self.bitmap;
        let doubled = GrayImage::from_fn(source.width(), source.height() * 2, |x, y| {
            *source.get_pixel(x, y / 2)
        });
        Self::new(self.glyph, doubled, true, darkness)
    }

    pub fn glyph(&self) -> char {
        self.glyph
    }

    pub fn bitmap(&self) -> &GrayImage {
        &self.bitmap
    }

    /// Advance in native pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.bitmap.height()
    }

    pub fn is_stretched(&self) -> bool {
        self.is_stretched
    }

    /// First column that contains ink.
    pub fn ink_offset(&self) -> Option<u32> {
        self.ink_offset
    }

    /// Templates without ink, such as the space, never take part in matching.
    pub fn is_matchable(&self) -> bool {
        self.ink_offset.is_some() && self.norm >= MIN_TEMPLATE_NORM
    }

    /// Normalized cross-correlation of the template against `line` with its
    /// left edge at `left`. Pixels outside the line read as background.
    pub fn correlate(&self, line: &GrayImage, left: i64) -> f32 {
        if !self.is_matchable() {
            return 0.0;
        }
        let (tw, th) = self.bitmap.dimensions();
        let count = f64::from(tw * th);
        let sample = |x: u32, y: u32| -> f64 {
            let lx = left + i64::from(x);
            if lx < 0 {
                return 255.0;
            }
            line.get_pixel_checked(lx as u32, y)
                .map(|p| f64::from(p.0[0]))
                .unwrap_or(255.0)
        };

        let mut sum = 0.0;
        for y in 0..th {
            for x in 0..tw {
                sum += sample(x, y);
            }
        }
        let mean = sum / count;

        let mut dot = 0.0;
        let mut energy = 0.0;
        let mut i = 0;
        for y in 0..th {
            for x in 0..tw {
                let v = sample(x, y) - mean;
                dot += v * self.centered[i];
                energy += v * v;
                i += 1;
            }
        }
        if energy <= f64::EPSILON {
            return 0.0;
        }
        (dot / (energy.sqrt() * self.norm)) as f32
    }
}

fn pad_right(bitmap: &GrayImage, width: u32) -> GrayImage {
    GrayImage::from_fn(width, bitmap.height(), |x, y| {
        bitmap
            .get_pixel_checked(x, y)
            .copied()
            .unwrap_or(Luma([255]))
    })
}

#[derive(Debug, Clone)]
pub struct TemplateEntry {
    pub normal: CharacterTemplate,
    pub stretched: CharacterTemplate,
}

impl TemplateEntry {
    pub fn get(&self, scale: GlyphScale) -> &CharacterTemplate {
        match scale {
            GlyphScale::Normal => &self.normal,
            GlyphScale::Stretched => &self.stretched,
        }
    }
}

/// Glyph catalog keyed by template name, in load order.
#[derive(Debug, Clone)]
pub struct TemplateLibrary {
    entries: IndexMap<String, TemplateEntry>,
    darkness: u8,
}

impl TemplateLibrary {
    pub fn new(darkness: u8) -> Self {
        Self {
            entries: IndexMap::new(),
            darkness,
        }
    }

    /// Adds a glyph under `name`. A missing stretched bitmap is derived by row doubling.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        glyph: char,
        bitmap: GrayImage,
        stretched: Option<GrayImage>,
    ) -> Result<(), TemplateError> {
        let normal = CharacterTemplate::new(glyph, bitmap, false, self.darkness);
        let stretched = match stretched {
            Some(big) => {
                let expected = normal.height() * 2;
                if big.height() != expected {
                    return Err(TemplateError::StretchedSize {
                        glyph,
                        expected,
                        actual: big.height(),
                    });
                }
                CharacterTemplate::new(glyph, big, true, self.darkness)
            }
            None => normal.stretched(self.darkness),
        };
        self.entries
            .insert(name.into(), TemplateEntry { normal, stretched });
        Ok(())
    }

    /// Builds a library from in-memory bitmaps, one per glyph.
    pub fn from_bitmaps(
        bitmaps: impl IntoIterator<Item = (char, GrayImage)>,
        darkness: u8,
    ) -> Result<Self, TemplateError> {
        let mut library = Self::new(darkness);
        for (glyph, bitmap) in bitmaps {
            library.insert(glyph.to_string(), glyph, bitmap, None)?;
        }
        if library.is_empty() {
            return Err(TemplateError::EmptyCatalog);
        }
        Ok(library)
    }

    /// Loads every `<stem>.png` in `dir`, pairing `<stem>_big.png` stretched variants.
    pub fn load_dir(dir: &Path, darkness: u8) -> Result<Self, TemplateError> {
        if !dir.is_dir() {
            return Err(TemplateError::DirectoryNotFound(dir.to_path_buf()));
        }
        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
            .map_err(|e| TemplateError::ReadDirectory(e, dir.to_path_buf()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let mut normals: IndexMap<String, (char, PathBuf)> = IndexMap::new();
        let mut bigs: IndexMap<String, PathBuf> = IndexMap::new();
        for path in paths {
            let Some(stem) = path.file_stem().and_then(|s| s.to_str()).map(str::to_string) else {
                continue;
            };
            if let Some(base) = font::stretched_base_stem(&stem) {
                bigs.insert(base.to_string(), path);
            } else if let Some(glyph) = font::glyph_for_stem(&stem) {
                normals.insert(stem, (glyph, path));
            } else {
                warn!("Skipping template with unrecognized name: {}", path.display());
            }
        }

        let mut library = Self::new(darkness);
        for (stem, (glyph, path)) in normals {
            let bitmap = load_gray(&path)?;
            let stretched = match bigs.get(&stem) {
                Some(big_path) => Some(load_gray(big_path)?),
                None => None,
            };
            library.insert(stem, glyph, bitmap, stretched)?;
        }
        if library.is_empty() {
            return Err(TemplateError::Empty(dir.to_path_buf()));
        }
        info!(
            "Loaded {} glyph templates from {}",
            library.len(),
            dir.display()
        );
        debug!("Glyphs: {}", library.glyphs().collect::<String>());
        Ok(library)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn darkness(&self) -> u8 {
        self.darkness
    }

    pub fn glyphs(&self) -> impl Iterator<Item = char> + '_ {
        self.entries.values().map(|entry| entry.normal.glyph())
    }

    /// First entry depicting `glyph`.
    pub fn entry_for(&self, glyph: char) -> Option<&TemplateEntry> {
        self.entries
            .values()
            .find(|entry| entry.normal.glyph() == glyph)
    }

    pub fn templates(&self, scale: GlyphScale) -> impl Iterator<Item = &CharacterTemplate> + '_ {
        self.entries.values().map(move |entry| entry.get(scale))
    }

    /// Narrowest advance among templates that can be matched.
    pub fn narrowest_width(&self, scale: GlyphScale) -> u32 {
        self.templates(scale)
            .filter(|t| t.is_matchable())
            .map(CharacterTemplate::width)
            .min()
            .unwrap_or(font::DEFAULT_WIDTH)
    }

    /// Advance of a space, from its template when present.
    pub fn space_width(&self) -> u32 {
        self.entry_for(' ')
            .map(|entry| entry.normal.width())
            .unwrap_or_else(|| font::glyph_width(' '))
    }
}

fn load_gray(path: &Path) -> Result<GrayImage, TemplateError> {
    image::open(path)
        .map(|img| img.to_luma8())
        .map_err(|e| TemplateError::Load(e, path.to_path_buf()))
}

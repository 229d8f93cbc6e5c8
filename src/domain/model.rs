use image::RgbaImage;
use serde::{Deserialize, Serialize};

/// Pixel sizes for sheets and card presets are expressed at this scale.
pub const REFERENCE_DPI: u32 = 300;

/// One card reference found in a TTS Saved Object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardObject {
    pub nickname: String,
    pub card_id: i64,
}

impl CardObject {
    /// `CardID` encodes the deck id in the upper digits: `deck_id * 100 + index`.
    pub fn deck_key(&self) -> String {
        (self.card_id / 100).to_string()
    }

    pub fn sprite_index(&self) -> u32 {
        self.card_id.rem_euclid(100) as u32
    }
}

/// Sprite sheet metadata from a `CustomDeck` table entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomDeck {
    #[serde(rename = "FaceURL", default)]
    pub face_url: String,
    #[serde(rename = "BackURL", default)]
    pub back_url: String,
    #[serde(rename = "NumWidth", default = "default_grid_dim")]
    pub num_width: u32,
    #[serde(rename = "NumHeight", default = "default_grid_dim")]
    pub num_height: u32,
    #[serde(rename = "UniqueBack", default)]
    pub unique_back: bool,
}

fn default_grid_dim() -> u32 {
    1
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardSide {
    Face,
    Back,
}

impl CardSide {
    pub fn as_str(self) -> &'static str {
        match self {
            CardSide::Face => "face",
            CardSide::Back => "back",
        }
    }
}

/// Face and back images of a single card. Either side may be missing when a
/// URL is blacklisted or excluded.
#[derive(Debug, Clone, Default)]
pub struct CardImages {
    pub face: Option<RgbaImage>,
    pub back: Option<RgbaImage>,
}

impl CardImages {
    pub fn is_double_sided(&self) -> bool {
        self.face.is_some() && self.back.is_some()
    }

    pub fn is_single_sided(&self) -> bool {
        self.face.is_some() != self.back.is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.face.is_none() && self.back.is_none()
    }

    /// Present sides in face-then-back order.
    pub fn sides(&self) -> impl Iterator<Item = (CardSide, &RgbaImage)> {
        self.face
            .iter()
            .map(|image| (CardSide::Face, image))
            .chain(self.back.iter().map(|image| (CardSide::Back, image)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum SheetSizePreset {
    A4,
    Letter,
    Legal,
}

impl SheetSizePreset {
    /// Width and height in pixels at [`REFERENCE_DPI`].
    pub fn size_px(self) -> (u32, u32) {
        match self {
            SheetSizePreset::A4 => (2480, 3508),
            SheetSizePreset::Letter => (2550, 3300),
            SheetSizePreset::Legal => (2550, 4200),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum CardSizePreset {
    Standard,
    Mini,
}

impl CardSizePreset {
    /// Width and height in pixels at [`REFERENCE_DPI`].
    pub fn size_px(self) -> (u32, u32) {
        match self {
            CardSizePreset::Standard => (734, 1045),
            CardSizePreset::Mini => (500, 734),
        }
    }

    /// Long edge of the card, the anchor for layout scaling.
    pub fn length_px(self) -> u32 {
        self.size_px().1
    }
}

/// Millimetres to pixels at [`REFERENCE_DPI`], truncating.
pub fn mm_to_reference_px(mm: f64) -> u32 {
    (mm / 25.4 * f64::from(REFERENCE_DPI)) as u32
}

/// A custom length of 0 mm means "use the preset".
pub fn resolve_card_length_px(preset: CardSizePreset, custom_mm: f64) -> u32 {
    if custom_mm == 0.0 {
        preset.length_px()
    } else {
        mm_to_reference_px(custom_mm)
    }
}

/// Both custom dimensions must be set to override the preset.
pub fn resolve_sheet_px(preset: SheetSizePreset, width_mm: f64, length_mm: f64) -> (u32, u32) {
    if width_mm == 0.0 || length_mm == 0.0 {
        preset.size_px()
    } else {
        (mm_to_reference_px(width_mm), mm_to_reference_px(length_mm))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ExtractOptions {
    pub exclude_card_urls: bool,
    pub exclude_card_backs: bool,
    pub exclude_card_faces: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderOptions {
    /// Sheet size in pixels at [`REFERENCE_DPI`].
    pub sheet_px: (u32, u32),
    /// Card length in pixels at [`REFERENCE_DPI`].
    pub card_length_px: u32,
    pub gutter_margin_mm: f64,
    pub dpi: u32,
    pub generate_bleed: bool,
    pub bleed_width_mm: f64,
    pub sharpen_text: bool,
    pub draw_cut_lines: bool,
    pub line_width: u32,
    pub cut_lines_on_margin_only: bool,
    pub no_cut_lines_on_last_sheet: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            sheet_px: SheetSizePreset::Letter.size_px(),
            card_length_px: CardSizePreset::Standard.length_px(),
            gutter_margin_mm: 3.175,
            dpi: 360,
            generate_bleed: false,
            bleed_width_mm: 3.0,
            sharpen_text: false,
            draw_cut_lines: false,
            line_width: 1,
            cut_lines_on_margin_only: false,
            no_cut_lines_on_last_sheet: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub split_double_and_single: bool,
    pub double_only: bool,
    pub single_only: bool,
    pub save_images: bool,
    pub skip_pdf_generation: bool,
}

/// Assembled sheets destined for one PDF file.
#[derive(Debug, Clone)]
pub struct SheetDocument {
    pub filename: String,
    pub sheets: Vec<RgbaImage>,
}

/// A single card side queued for export as an image file.
#[derive(Debug, Clone)]
pub struct CardExport {
    pub path: String,
    pub image: RgbaImage,
}

#[derive(Debug, Clone, Default)]
pub struct RenderResult {
    pub documents: Vec<SheetDocument>,
    pub exports: Vec<CardExport>,
}

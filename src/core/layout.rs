use crate::core::image_ops;
use crate::domain::model::{RenderOptions, REFERENCE_DPI};
use crate::utils::error::{CardsError, Result};
use image::{imageops, imageops::FilterType, Pixel, Rgba, RgbaImage};

const CUT_LINE_COLOR: Rgba<u8> = Rgba([0, 0, 0, 128]);
/// Cut lines stop this many pixels short of the sheet edge.
const SHEET_EDGE_MARGIN: u32 = 5;

/// Geometry of one sheet: a centered grid of card cells separated by gutters.
/// All fields are pixels at the target dpi. A cell is the trimmed card plus
/// bleed on both sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SheetLayout {
    pub sheet_w: u32,
    pub sheet_h: u32,
    pub card_w: u32,
    pub card_h: u32,
    pub cell_w: u32,
    pub cell_h: u32,
    pub gutter_px: u32,
    pub bleed_px: u32,
    pub cols: u32,
    pub rows: u32,
    pub start_x: u32,
    pub start_y: u32,
}

impl SheetLayout {
    /// Scale everything to the target dpi and fit the grid. The card width
    /// follows the aspect ratio of the first card; every card on the sheet is
    /// forced to the same cell size.
    pub fn compute(opts: &RenderOptions, first_card: (u32, u32)) -> Result<Self> {
        let (first_w, first_h) = first_card;
        if first_w == 0 || first_h == 0 {
            return Err(CardsError::LayoutError {
                message: "first card image has zero size".to_string(),
            });
        }

        let card_h = scale_to_dpi(opts.card_length_px, opts.dpi);
        let sheet_w = scale_to_dpi(opts.sheet_px.0, opts.dpi);
        let sheet_h = scale_to_dpi(opts.sheet_px.1, opts.dpi);
        let gutter_px = mm_to_px(opts.gutter_margin_mm, opts.dpi);
        let card_w = (u64::from(card_h) * u64::from(first_w) / u64::from(first_h)) as u32;

        let bleed_px = if opts.generate_bleed {
            mm_to_px(opts.bleed_width_mm, opts.dpi)
        } else {
            0
        };
        let cell_w = card_w + 2 * bleed_px;
        let cell_h = card_h + 2 * bleed_px;
        if cell_w == 0 || cell_h == 0 {
            return Err(CardsError::LayoutError {
                message: "card size scales to zero pixels at this dpi".to_string(),
            });
        }

        let cols = sheet_w.saturating_sub(2 * gutter_px) / cell_w;
        let rows = sheet_h.saturating_sub(2 * gutter_px) / cell_h;
        if cols == 0 || rows == 0 {
            return Err(CardsError::LayoutError {
                message: format!(
                    "a {}x{}px card cell does not fit on a {}x{}px sheet with a {}px gutter",
                    cell_w, cell_h, sheet_w, sheet_h, gutter_px
                ),
            });
        }

        // 卡片網格置中
        let grid_w = cols * cell_w + 2 * gutter_px;
        let grid_h = rows * cell_h + 2 * gutter_px;
        let start_x = (sheet_w - grid_w) / 2;
        let start_y = (sheet_h - grid_h) / 2;

        Ok(Self {
            sheet_w,
            sheet_h,
            card_w,
            card_h,
            cell_w,
            cell_h,
            gutter_px,
            bleed_px,
            cols,
            rows,
            start_x,
            start_y,
        })
    }

    pub fn per_sheet(&self) -> usize {
        (self.cols * self.rows) as usize
    }

    pub fn sheets_needed(&self, image_count: usize) -> usize {
        image_count.div_ceil(self.per_sheet())
    }

    /// Top-left corner of a cell, by slot index in row-major order.
    pub fn cell_origin(&self, slot: usize) -> (i64, i64) {
        let col = slot as u32 % self.cols;
        let row = slot as u32 / self.cols;
        (
            i64::from(self.start_x) + i64::from(col) * i64::from(self.cell_w + self.gutter_px),
            i64::from(self.start_y) + i64::from(row) * i64::from(self.cell_h + self.gutter_px),
        )
    }
}

fn scale_to_dpi(px_at_reference: u32, dpi: u32) -> u32 {
    (u64::from(px_at_reference) * u64::from(dpi) / u64::from(REFERENCE_DPI)) as u32
}

fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    (mm * f64::from(dpi) / 25.4) as u32
}

/// Arrange card images into white sheets according to the render options.
/// Cards are resized to the first card's cell, optionally sharpened and given
/// bleed, then pasted row by row.
pub fn assemble(images: &[&RgbaImage], opts: &RenderOptions) -> Result<Vec<RgbaImage>> {
    let Some(first) = images.first() else {
        return Err(CardsError::LayoutError {
            message: "no images to arrange".to_string(),
        });
    };
    let layout = SheetLayout::compute(opts, first.dimensions())?;
    let sheets_needed = layout.sheets_needed(images.len());
    tracing::debug!(
        "Sheet grid: {}x{} cards per sheet, {} sheet(s) for {} image(s)",
        layout.cols,
        layout.rows,
        sheets_needed,
        images.len()
    );

    let mut sheets = Vec::with_capacity(sheets_needed);
    for sheet_index in 0..sheets_needed {
        let mut sheet =
            RgbaImage::from_pixel(layout.sheet_w, layout.sheet_h, Rgba([255, 255, 255, 255]));
        let cut_lines_here = opts.draw_cut_lines
            && (!opts.no_cut_lines_on_last_sheet || sheet_index + 1 < sheets_needed);

        // 邊緣模式:先畫線,卡片蓋在線上
        if cut_lines_here && opts.cut_lines_on_margin_only {
            draw_cut_lines(&mut sheet, &layout, opts.line_width);
        }

        for slot in 0..layout.per_sheet() {
            let Some(card) = images.get(sheet_index * layout.per_sheet() + slot) else {
                break;
            };
            let mut card = imageops::resize(*card, layout.card_w, layout.card_h, FilterType::Lanczos3);
            if opts.sharpen_text {
                card = image_ops::sharpen_text(&card);
            }
            if layout.bleed_px > 0 {
                card = image_ops::generate_bleed(&card, layout.bleed_px);
            }
            let (x, y) = layout.cell_origin(slot);
            imageops::overlay(&mut sheet, &card, x, y);
        }

        if cut_lines_here && !opts.cut_lines_on_margin_only {
            draw_cut_lines(&mut sheet, &layout, opts.line_width);
        }

        sheets.push(sheet);
    }

    Ok(sheets)
}

/// Draw semi-transparent trim lines along every card edge. With bleed enabled
/// the lines sit inside the cell, on the trimmed card boundary.
pub fn draw_cut_lines(sheet: &mut RgbaImage, layout: &SheetLayout, line_width: u32) {
    let bleed = i64::from(layout.bleed_px);
    let row_stride = i64::from(layout.cell_h + layout.gutter_px);
    let col_stride = i64::from(layout.cell_w + layout.gutter_px);

    for row in 0..layout.rows {
        let top = i64::from(layout.start_y) + bleed + i64::from(row) * row_stride;
        draw_hline(sheet, top, line_width);
        draw_hline(sheet, top + i64::from(layout.card_h), line_width);
    }

    for col in 0..layout.cols {
        let left = i64::from(layout.start_x) + bleed + i64::from(col) * col_stride;
        draw_vline(sheet, left, line_width);
        draw_vline(sheet, left + i64::from(layout.card_w), line_width);
    }
}

fn draw_hline(sheet: &mut RgbaImage, y: i64, line_width: u32) {
    let (w, h) = sheet.dimensions();
    let y0 = y - i64::from(line_width) / 2;
    for dy in 0..i64::from(line_width.max(1)) {
        let yy = y0 + dy;
        if yy < 0 || yy >= i64::from(h) {
            continue;
        }
        for x in SHEET_EDGE_MARGIN..w.saturating_sub(SHEET_EDGE_MARGIN) {
            sheet.get_pixel_mut(x, yy as u32).blend(&CUT_LINE_COLOR);
        }
    }
}

fn draw_vline(sheet: &mut RgbaImage, x: i64, line_width: u32) {
    let (w, h) = sheet.dimensions();
    let x0 = x - i64::from(line_width) / 2;
    for dx in 0..i64::from(line_width.max(1)) {
        let xx = x0 + dx;
        if xx < 0 || xx >= i64::from(w) {
            continue;
        }
        for y in SHEET_EDGE_MARGIN..h.saturating_sub(SHEET_EDGE_MARGIN) {
            sheet.get_pixel_mut(xx as u32, y).blend(&CUT_LINE_COLOR);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

    #[test]
    fn test_compute_default_letter_layout() {
        // letter sheet and standard cards at 360 dpi
        let opts = RenderOptions::default();
        let layout = SheetLayout::compute(&opts, (734, 1045)).unwrap();

        assert_eq!(layout.sheet_w, 3060);
        assert_eq!(layout.sheet_h, 3960);
        assert_eq!(layout.card_h, 1254);
        assert_eq!(layout.card_w, 880);
        assert_eq!(layout.gutter_px, 45);
        assert_eq!(layout.bleed_px, 0);
        assert_eq!(layout.cols, 3);
        assert_eq!(layout.rows, 3);
        assert_eq!(layout.start_x, 165);
        assert_eq!(layout.start_y, 54);
        assert_eq!(layout.per_sheet(), 9);
    }

    #[test]
    fn test_compute_with_bleed_shrinks_grid() {
        let opts = RenderOptions {
            generate_bleed: true,
            ..Default::default()
        };
        let layout = SheetLayout::compute(&opts, (734, 1045)).unwrap();

        // 3.0 mm at 360 dpi
        assert_eq!(layout.bleed_px, 42);
        assert_eq!(layout.cell_w, 964);
        assert_eq!(layout.cell_h, 1338);
        assert_eq!(layout.cols, 3);
        assert_eq!(layout.rows, 2);
        assert_eq!(layout.per_sheet(), 6);
    }

    #[test]
    fn test_compute_sheets_needed() {
        let layout = SheetLayout::compute(&RenderOptions::default(), (734, 1045)).unwrap();
        assert_eq!(layout.sheets_needed(1), 1);
        assert_eq!(layout.sheets_needed(9), 1);
        assert_eq!(layout.sheets_needed(10), 2);
        assert_eq!(layout.sheets_needed(19), 3);
    }

    #[test]
    fn test_cell_origin_row_major() {
        let layout = SheetLayout::compute(&RenderOptions::default(), (734, 1045)).unwrap();
        assert_eq!(layout.cell_origin(0), (165, 54));
        // slot 4 is column 1, row 1
        assert_eq!(layout.cell_origin(4), (165 + 925, 54 + 1299));
    }

    #[test]
    fn test_compute_rejects_oversized_card() {
        let opts = RenderOptions {
            card_length_px: 4000,
            dpi: 300,
            ..Default::default()
        };
        let err = SheetLayout::compute(&opts, (734, 1045)).unwrap_err();
        assert!(matches!(err, CardsError::LayoutError { .. }));
    }

    #[test]
    fn test_compute_rejects_zero_sized_first_card() {
        let err = SheetLayout::compute(&RenderOptions::default(), (0, 10)).unwrap_err();
        assert!(matches!(err, CardsError::LayoutError { .. }));
    }

    fn small_opts() -> RenderOptions {
        RenderOptions {
            sheet_px: (600, 900),
            card_length_px: 200,
            gutter_margin_mm: 0.0,
            dpi: 300,
            ..Default::default()
        }
    }

    #[test]
    fn test_assemble_fills_sheets_in_order() {
        // square cards: 3 columns x 4 rows of 200px cells on a 600x900 sheet
        let cards: Vec<RgbaImage> = (0..14)
            .map(|i| RgbaImage::from_pixel(100, 100, Rgba([i as u8 + 1, 0, 0, 255])))
            .collect();
        let refs: Vec<&RgbaImage> = cards.iter().collect();

        let sheets = assemble(&refs, &small_opts()).unwrap();
        assert_eq!(sheets.len(), 2);
        assert_eq!(sheets[0].dimensions(), (600, 900));

        let layout = SheetLayout::compute(&small_opts(), (100, 100)).unwrap();
        assert_eq!(layout.per_sheet(), 12);

        // first card sits at the first cell of sheet 0
        let (x, y) = layout.cell_origin(0);
        assert_eq!(
            *sheets[0].get_pixel(x as u32 + 50, y as u32 + 50),
            Rgba([1, 0, 0, 255])
        );
        // thirteenth card wraps onto sheet 1
        assert_eq!(
            *sheets[1].get_pixel(x as u32 + 50, y as u32 + 50),
            Rgba([13, 0, 0, 255])
        );
        // unused cells on the last sheet stay white
        let (x2, y2) = layout.cell_origin(11);
        assert_eq!(*sheets[1].get_pixel(x2 as u32 + 50, y2 as u32 + 50), WHITE);
    }

    #[test]
    fn test_assemble_rejects_empty_input() {
        let err = assemble(&[], &small_opts()).unwrap_err();
        assert!(matches!(err, CardsError::LayoutError { .. }));
    }

    #[test]
    fn test_cut_lines_darken_card_edges() {
        let opts = RenderOptions {
            draw_cut_lines: true,
            ..small_opts()
        };
        let card = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let plain = assemble(&[&card], &small_opts()).unwrap();
        let lined = assemble(&[&card], &opts).unwrap();
        assert_ne!(plain[0], lined[0]);

        let layout = SheetLayout::compute(&opts, (100, 100)).unwrap();
        let (x, y) = layout.cell_origin(0);
        // a blended line pixel is half-dark gray on the white sheet
        let on_line = *lined[0].get_pixel((x as u32) + 20, y as u32);
        assert!(on_line.0[0] < 200);
        // pixels clear of any line stay white
        let off = *lined[0].get_pixel(x as u32 + 20, y as u32 + 20);
        assert_eq!(off, WHITE);
    }

    #[test]
    fn test_cut_lines_respect_edge_margin() {
        let opts = RenderOptions {
            draw_cut_lines: true,
            ..small_opts()
        };
        let card = RgbaImage::from_pixel(100, 100, Rgba([255, 255, 255, 255]));
        let sheets = assemble(&[&card], &opts).unwrap();
        let layout = SheetLayout::compute(&opts, (100, 100)).unwrap();
        let (_, y) = layout.cell_origin(0);
        // the horizontal line stops short of both sheet edges; x = 0 is
        // excluded because the first vertical line runs there
        assert_eq!(*sheets[0].get_pixel(2, y as u32), WHITE);
        assert_eq!(*sheets[0].get_pixel(layout.sheet_w - 3, y as u32), WHITE);
        assert!(sheets[0].get_pixel(7, y as u32).0[0] < 200);
    }

    #[test]
    fn test_no_cut_lines_on_last_sheet() {
        let opts = RenderOptions {
            draw_cut_lines: true,
            no_cut_lines_on_last_sheet: true,
            ..small_opts()
        };
        let cards: Vec<RgbaImage> = (0..13)
            .map(|_| RgbaImage::from_pixel(100, 100, Rgba([200, 0, 0, 255])))
            .collect();
        let refs: Vec<&RgbaImage> = cards.iter().collect();
        let sheets = assemble(&refs, &opts).unwrap();
        assert_eq!(sheets.len(), 2);

        let layout = SheetLayout::compute(&opts, (100, 100)).unwrap();
        let (x, y) = layout.cell_origin(0);
        // sheet 0 carries lines over the first card
        assert!(sheets[0].get_pixel(x as u32 + 20, y as u32).0[0] < 200);
        // the final sheet holds one card and no lines: an empty cell that
        // would carry a line stays white
        let (x2, _) = layout.cell_origin(2);
        assert_eq!(*sheets[1].get_pixel(x2 as u32 + 20, y as u32), WHITE);
    }

    #[test]
    fn test_margin_only_lines_hide_under_cards() {
        let opts = RenderOptions {
            draw_cut_lines: true,
            cut_lines_on_margin_only: true,
            ..small_opts()
        };
        let card = RgbaImage::from_pixel(100, 100, Rgba([250, 250, 250, 255]));
        let sheets = assemble(&[&card], &opts).unwrap();
        let layout = SheetLayout::compute(&opts, (100, 100)).unwrap();
        let (x, y) = layout.cell_origin(0);

        // the card covers the line inside its cell
        assert_eq!(
            *sheets[0].get_pixel(x as u32 + 20, y as u32),
            Rgba([250, 250, 250, 255])
        );
        // above the grid no card covers the second vertical line, so it stays
        // visible in the top margin
        let second_line_x = x as u32 + layout.cell_w + layout.gutter_px;
        assert!(sheets[0].get_pixel(second_line_x, 20).0[0] < 200);
    }
}

use crate::utils::error::{CardsError, Result};
use image::{DynamicImage, RgbaImage};
use printpdf::{Image as PdfImage, ImageTransform, Mm, PdfDocument};

/// Physical page size in millimetres for a raster sheet at the given dpi.
fn page_size_mm(px: u32, dpi: u32) -> f64 {
    f64::from(px) / f64::from(dpi) * 25.4
}

/// Encode assembled sheets as a PDF, one full-page image per sheet. The page
/// size is derived from the pixel size and dpi so the cards print at true
/// physical scale.
pub fn render_pdf(sheets: &[RgbaImage], dpi: u32, title: &str) -> Result<Vec<u8>> {
    let Some(first) = sheets.first() else {
        return Err(CardsError::PdfError {
            message: "no sheets to write".to_string(),
        });
    };

    let page_w = Mm(page_size_mm(first.width(), dpi) as f32);
    let page_h = Mm(page_size_mm(first.height(), dpi) as f32);
    let (doc, first_page, first_layer) = PdfDocument::new(title, page_w, page_h, "sheet");

    let mut layer = doc.get_page(first_page).get_layer(first_layer);
    for (index, sheet) in sheets.iter().enumerate() {
        if index > 0 {
            let w = Mm(page_size_mm(sheet.width(), dpi) as f32);
            let h = Mm(page_size_mm(sheet.height(), dpi) as f32);
            let (page, page_layer) = doc.add_page(w, h, "sheet");
            layer = doc.get_page(page).get_layer(page_layer);
        }

        // 攤平為 RGB,像素級嵌入頁面
        let flattened = DynamicImage::ImageRgba8(sheet.clone()).to_rgb8();
        let pdf_image = PdfImage::from_dynamic_image(&DynamicImage::ImageRgb8(flattened));
        pdf_image.add_to_layer(
            layer.clone(),
            ImageTransform {
                translate_x: Some(Mm(0.0)),
                translate_y: Some(Mm(0.0)),
                dpi: Some(dpi as f32),
                ..Default::default()
            },
        );
    }

    doc.save_to_bytes().map_err(|e| CardsError::PdfError {
        message: e.to_string(),
    })
}

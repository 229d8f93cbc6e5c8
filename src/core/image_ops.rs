use image::{imageops, Rgba, RgbaImage};

const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Unsharp mask settings. The threshold keeps flat colour areas untouched so
/// only text and art edges gain contrast after the downscale to print size.
const SHARPEN_SIGMA: f32 = 1.0;
const SHARPEN_THRESHOLD: i32 = 6;

/// Cut one cell out of a sprite sheet. Cell size is the sheet size divided by
/// the grid dimensions; sprites are numbered left to right, top to bottom.
pub fn crop_from_sprite_sheet(
    sheet: &RgbaImage,
    num_width: u32,
    num_height: u32,
    sprite_index: u32,
) -> RgbaImage {
    let num_width = num_width.max(1);
    let num_height = num_height.max(1);
    let cell_w = sheet.width() / num_width;
    let cell_h = sheet.height() / num_height;
    let column = sprite_index % num_width;
    let row = sprite_index / num_width;
    imageops::crop_imm(sheet, column * cell_w, row * cell_h, cell_w, cell_h).to_image()
}

/// Extend a card by mirrored edge strips on all four sides. Corners stay
/// white, which disappears in the rounded corner cut.
pub fn generate_bleed(image: &RgbaImage, bleed_px: u32) -> RgbaImage {
    if bleed_px == 0 {
        return image.clone();
    }

    let (w, h) = image.dimensions();
    let b = bleed_px;

    let left = imageops::crop_imm(image, 0, 0, b, h).to_image();
    let right = imageops::crop_imm(image, w.saturating_sub(b), 0, b, h).to_image();
    let top = imageops::crop_imm(image, 0, 0, w, b).to_image();
    let bottom = imageops::crop_imm(image, 0, h.saturating_sub(b), w, b).to_image();

    let mut out = RgbaImage::from_pixel(w + 2 * b, h + 2 * b, WHITE);
    imageops::replace(&mut out, image, i64::from(b), i64::from(b));
    imageops::replace(&mut out, &imageops::flip_horizontal(&left), 0, i64::from(b));
    imageops::replace(
        &mut out,
        &imageops::flip_horizontal(&right),
        i64::from(w + b),
        i64::from(b),
    );
    imageops::replace(&mut out, &imageops::flip_vertical(&top), i64::from(b), 0);
    imageops::replace(
        &mut out,
        &imageops::flip_vertical(&bottom),
        i64::from(b),
        i64::from(h + b),
    );
    out
}

/// Thresholded unsharp mask. Keeps the image size unchanged.
pub fn sharpen_text(image: &RgbaImage) -> RgbaImage {
    imageops::unsharpen(image, SHARPEN_SIGMA, SHARPEN_THRESHOLD)
}

use tempfile::TempDir;
use ttscards::core::Pipeline;
use ttscards::{CardPipeline, CardsError, CliConfig, ConversionEngine, LocalStorage};

fn write_card_png(dir: &std::path::Path, name: &str, value: u8) {
    let card = image::RgbaImage::from_pixel(40, 60, image::Rgba([value, 0, 0, 255]));
    card.save(dir.join(name)).unwrap();
}

fn small_sheet_config(path: String, output_path: String, cache_path: String) -> CliConfig {
    CliConfig {
        path,
        output_path,
        cache_path,
        sheet_width_mm: 50.8,
        sheet_length_mm: 76.2,
        card_length_mm: 16.9,
        dpi: 300,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_extract_pairs_faces_and_backs_by_index() {
    let input_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();

    write_card_png(input_dir.path(), "card_0_face.png", 10);
    write_card_png(input_dir.path(), "card_0_back.png", 20);
    write_card_png(input_dir.path(), "card_2_face.png", 30);
    write_card_png(input_dir.path(), "card_10_face.png", 40);
    write_card_png(input_dir.path(), "extra.png", 50);

    let config = small_sheet_config(
        input_dir.path().to_str().unwrap().to_string(),
        "unused_output".to_string(),
        cache_dir.path().to_str().unwrap().to_string(),
    );

    let pipeline = CardPipeline::new(LocalStorage::new("unused_output"), config);
    let cards = pipeline.extract().await.unwrap();

    assert_eq!(cards.len(), 4);

    // card_0 pairs its face and back into one double-sided card
    assert!(cards[0].is_double_sided());
    assert_eq!(cards[0].face.as_ref().unwrap().get_pixel(0, 0)[0], 10);
    assert_eq!(cards[0].back.as_ref().unwrap().get_pixel(0, 0)[0], 20);

    // natural sort puts card_2 before card_10
    assert_eq!(cards[1].face.as_ref().unwrap().get_pixel(0, 0)[0], 30);
    assert_eq!(cards[2].face.as_ref().unwrap().get_pixel(0, 0)[0], 40);
    assert!(cards[1].is_single_sided());

    // files outside the card_<n>_<side> scheme become face-only cards
    assert_eq!(cards[3].face.as_ref().unwrap().get_pixel(0, 0)[0], 50);
    assert!(cards[3].back.is_none());
}

#[tokio::test]
async fn test_directory_run_produces_pdf() {
    let input_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    write_card_png(input_dir.path(), "card_0_face.png", 10);
    write_card_png(input_dir.path(), "card_0_back.png", 20);
    write_card_png(input_dir.path(), "card_1_face.png", 30);

    let config = small_sheet_config(
        input_dir.path().to_str().unwrap().to_string(),
        output_path.clone(),
        cache_dir.path().to_str().unwrap().to_string(),
    );

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = CardPipeline::new(storage, config);
    let engine = ConversionEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_ok());

    let pdf_path = output_dir.path().join("pdf/output.pdf");
    assert!(pdf_path.exists());
    assert!(std::fs::read(pdf_path).unwrap().starts_with(b"%PDF"));
}

#[tokio::test]
async fn test_directory_run_with_split_outputs() {
    let input_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    write_card_png(input_dir.path(), "card_0_face.png", 10);
    write_card_png(input_dir.path(), "card_0_back.png", 20);
    write_card_png(input_dir.path(), "card_1_face.png", 30);

    let mut config = small_sheet_config(
        input_dir.path().to_str().unwrap().to_string(),
        output_path.clone(),
        cache_dir.path().to_str().unwrap().to_string(),
    );
    config.split_double_and_single = true;

    let storage = LocalStorage::new(output_path);
    let pipeline = CardPipeline::new(storage, config);
    let engine = ConversionEngine::new(pipeline);

    assert!(engine.run().await.is_ok());
    assert!(output_dir.path().join("pdf/output_single.pdf").exists());
    assert!(output_dir.path().join("pdf/output_double.pdf").exists());
}

#[tokio::test]
async fn test_empty_directory_fails() {
    let input_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let output_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    // a text file is not an image input
    std::fs::write(input_dir.path().join("notes.txt"), "not an image").unwrap();

    let config = small_sheet_config(
        input_dir.path().to_str().unwrap().to_string(),
        output_path.clone(),
        cache_dir.path().to_str().unwrap().to_string(),
    );

    let storage = LocalStorage::new(output_path);
    let pipeline = CardPipeline::new(storage, config);
    let engine = ConversionEngine::new(pipeline);

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, CardsError::ImageFilesNotFound));
}

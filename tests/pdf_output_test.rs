use httpmock::prelude::*;
use tempfile::TempDir;
use ttscards::{CardPipeline, CardsError, CliConfig, ConversionEngine, LocalStorage};

fn sprite_sheet_png(cols: u32, rows: u32) -> Vec<u8> {
    let cell = 40u32;
    let sheet = image::RgbaImage::from_fn(cols * cell, rows * cell, |x, y| {
        let col = (x / cell) as u8;
        let row = (y / cell) as u8;
        image::Rgba([10 + col * 40, 10 + row * 40, 200, 255])
    });
    let mut bytes = std::io::Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(sheet)
        .write_to(&mut bytes, image::ImageOutputFormat::Png)
        .unwrap();
    bytes.into_inner()
}

fn save_object_json(face_url: &str, back_url: &str, ids: &[i64]) -> String {
    serde_json::json!({
        "ObjectStates": [{
            "Name": "Deck",
            "ContainedObjects": ids.iter().map(|id| serde_json::json!({
                "Name": "Card",
                "Nickname": format!("Card {}", id),
                "CardID": id
            })).collect::<Vec<_>>(),
            "CustomDeck": {
                "1": {
                    "FaceURL": face_url,
                    "BackURL": back_url,
                    "NumWidth": 2,
                    "NumHeight": 2,
                    "UniqueBack": false
                }
            }
        }]
    })
    .to_string()
}

// Small sheet so the tests stay fast: 600x900 px with ~199 px cards
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
async fn test_end_to_end_saved_object_to_pdf() {
    let output_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let input_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let face_mock = server.mock(|when, then| {
        when.method(GET).path("/face.png");
        then.status(200).body(sprite_sheet_png(2, 2));
    });
    let back_mock = server.mock(|when, then| {
        when.method(GET).path("/back.png");
        then.status(200).body(sprite_sheet_png(1, 1));
    });

    let input_path = input_dir.path().join("deck.json");
    std::fs::write(
        &input_path,
        save_object_json(
            &server.url("/face.png"),
            &server.url("/back.png"),
            &[100, 101, 102, 103],
        ),
    )
    .unwrap();

    let config = small_sheet_config(
        input_path.to_str().unwrap().to_string(),
        output_path.clone(),
        cache_dir.path().to_str().unwrap().to_string(),
    );

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = CardPipeline::new(storage, config);
    let engine = ConversionEngine::new(pipeline);

    let result = engine.run().await;
    assert!(result.is_ok());
    assert_eq!(result.unwrap(), output_path);

    // one download per sprite sheet URL, not per card
    face_mock.assert_hits(1);
    back_mock.assert_hits(1);

    let pdf_path = output_dir.path().join("pdf/output.pdf");
    assert!(pdf_path.exists());
    let pdf_bytes = std::fs::read(&pdf_path).unwrap();
    assert!(pdf_bytes.starts_with(b"%PDF"));
    assert!(pdf_bytes.len() > 1000);
}

#[tokio::test]
async fn test_save_images_exports_each_side() {
    let output_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let input_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/face.png");
        then.status(200).body(sprite_sheet_png(2, 2));
    });
    server.mock(|when, then| {
        when.method(GET).path("/back.png");
        then.status(200).body(sprite_sheet_png(1, 1));
    });

    let input_path = input_dir.path().join("deck.json");
    std::fs::write(
        &input_path,
        save_object_json(&server.url("/face.png"), &server.url("/back.png"), &[100, 101]),
    )
    .unwrap();

    let mut config = small_sheet_config(
        input_path.to_str().unwrap().to_string(),
        output_path.clone(),
        cache_dir.path().to_str().unwrap().to_string(),
    );
    config.save_images = true;
    config.skip_pdf_generation = true;

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = CardPipeline::new(storage, config);
    let engine = ConversionEngine::new(pipeline);

    assert!(engine.run().await.is_ok());

    for name in [
        "img/card_0_face.png",
        "img/card_0_back.png",
        "img/card_1_face.png",
        "img/card_1_back.png",
    ] {
        let path = output_dir.path().join(name);
        assert!(path.exists(), "missing {}", name);
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(&[0x89, b'P', b'N', b'G']));
    }

    // PDF generation was skipped
    assert!(!output_dir.path().join("pdf").exists());

    // exported faces keep the sprite cell size
    let face = image::open(output_dir.path().join("img/card_0_face.png")).unwrap();
    assert_eq!(face.to_rgba8().dimensions(), (40, 40));
}

#[tokio::test]
async fn test_run_fails_when_save_has_no_cards() {
    let output_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let input_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    let input_path = input_dir.path().join("empty.json");
    std::fs::write(
        &input_path,
        r#"{"ObjectStates": [{"Name": "Notecard", "Nickname": "memo"}]}"#,
    )
    .unwrap();

    let config = small_sheet_config(
        input_path.to_str().unwrap().to_string(),
        output_path.clone(),
        cache_dir.path().to_str().unwrap().to_string(),
    );

    let storage = LocalStorage::new(output_path);
    let pipeline = CardPipeline::new(storage, config);
    let engine = ConversionEngine::new(pipeline);

    let err = engine.run().await.unwrap_err();
    assert!(matches!(err, CardsError::CardsNotFound));
    assert!(!output_dir.path().join("pdf").exists());
}

#[tokio::test]
async fn test_end_to_end_with_monitoring() {
    let output_dir = TempDir::new().unwrap();
    let cache_dir = TempDir::new().unwrap();
    let input_dir = TempDir::new().unwrap();
    let output_path = output_dir.path().to_str().unwrap().to_string();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(GET).path("/face.png");
        then.status(200).body(sprite_sheet_png(2, 2));
    });

    let input_path = input_dir.path().join("deck.json");
    std::fs::write(
        &input_path,
        save_object_json(&server.url("/face.png"), "", &[100]),
    )
    .unwrap();

    let config = small_sheet_config(
        input_path.to_str().unwrap().to_string(),
        output_path.clone(),
        cache_dir.path().to_str().unwrap().to_string(),
    );

    let storage = LocalStorage::new(output_path.clone());
    let pipeline = CardPipeline::new(storage, config);
    let engine = ConversionEngine::new_with_monitoring(pipeline, true);

    let result = engine.run().await;
    assert!(result.is_ok());
    api_mock.assert();
    assert!(output_dir.path().join("pdf/output.pdf").exists());
}

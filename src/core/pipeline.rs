use crate::core::fetcher::ImageFetcher;
use crate::core::{image_ops, layout, pdf, tts};
use crate::domain::model::{
    CardExport, CardImages, CardObject, CustomDeck, ExtractOptions, OutputOptions, RenderResult,
    SheetDocument,
};
use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
use crate::utils::error::{CardsError, Result};
use image::RgbaImage;
use regex::Regex;
use std::collections::HashMap;
use std::path::Path;

/// Per-output-directory blacklist of sprite sheet URLs to skip.
const BLACKLIST_FILE: &str = "image_blacklist.txt";

pub struct CardPipeline<S: Storage, C: ConfigProvider> {
    storage: S,
    config: C,
    fetcher: ImageFetcher,
}

impl<S: Storage, C: ConfigProvider> CardPipeline<S, C> {
    pub fn new(storage: S, config: C) -> Self {
        let fetcher = ImageFetcher::new(config.cache_path());
        Self {
            storage,
            config,
            fetcher,
        }
    }

    /// The blacklist only applies when URL exclusion is switched on. A missing
    /// file means an empty list.
    async fn load_blacklist(&self) -> Vec<String> {
        if !self.config.extract_options().exclude_card_urls {
            return Vec::new();
        }
        match self.storage.read_file(BLACKLIST_FILE).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes)
                .lines()
                .map(|line| line.trim().to_string())
                .filter(|line| !line.is_empty())
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    async fn cards_from_save_file(&self, path: &Path) -> Result<Vec<CardImages>> {
        let raw = tokio::fs::read_to_string(path).await?;
        let save: serde_json::Value = serde_json::from_str(&raw)?;

        tracing::info!("Loading images from URLs in TTS Saved Object");
        let card_objects = tts::find_cards(&save);
        if card_objects.is_empty() {
            return Err(CardsError::CardsNotFound);
        }
        let decks = tts::find_custom_decks(&save);
        let blacklist = self.load_blacklist().await;
        let opts = self.config.extract_options();

        let mut cards = Vec::with_capacity(card_objects.len());
        for card in &card_objects {
            cards.push(self.process_card(card, &decks, &blacklist, opts).await?);
        }
        tracing::info!("Successfully loaded {} cards", cards.len());
        Ok(cards)
    }

    /// Download the deck's sprite sheets and cut this card's face and back out
    /// of them. A shared back uses the whole back sheet; a unique back uses
    /// the card's own cell.
    async fn process_card(
        &self,
        card: &CardObject,
        decks: &HashMap<String, CustomDeck>,
        blacklist: &[String],
        opts: ExtractOptions,
    ) -> Result<CardImages> {
        let Some(deck) = decks.get(&card.deck_key()) else {
            tracing::warn!(
                "No CustomDeck entry {} for card '{}' (id {}); skipping",
                card.deck_key(),
                card.nickname,
                card.card_id
            );
            return Ok(CardImages::default());
        };

        let mut images = CardImages::default();

        if !deck.face_url.is_empty() && !opts.exclude_card_faces {
            if let Some(sheet) = self.fetcher.fetch(&deck.face_url, blacklist).await? {
                images.face = Some(image_ops::crop_from_sprite_sheet(
                    &sheet,
                    deck.num_width,
                    deck.num_height,
                    card.sprite_index(),
                ));
            }
        }

        if !deck.back_url.is_empty() && !opts.exclude_card_backs {
            if let Some(sheet) = self.fetcher.fetch(&deck.back_url, blacklist).await? {
                images.back = Some(if deck.unique_back {
                    image_ops::crop_from_sprite_sheet(
                        &sheet,
                        deck.num_width,
                        deck.num_height,
                        card.sprite_index(),
                    )
                } else {
                    sheet
                });
            }
        }

        tracing::info!("Processed card: {}", card.nickname);
        Ok(images)
    }
}

/// Load card images from a directory instead of a Saved Object. Files named
/// `card_<n>_face.png` / `card_<n>_back.png` are paired into one card; any
/// other .png/.jpg file becomes a face-only card. Natural sort order, so
/// card_2 comes before card_10.
fn cards_from_directory(dir: &Path) -> Result<Vec<CardImages>> {
    tracing::info!("Loading images from directory");
    let mut files: Vec<String> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| name.ends_with(".png") || name.ends_with(".jpg"))
        .collect();
    files.sort_by(|a, b| natural_key(a).cmp(&natural_key(b)));

    let side_pattern = Regex::new(r"^card_(\d+)_(face|back)\.png$").unwrap();
    let mut order: Vec<String> = Vec::new();
    let mut table: HashMap<String, CardImages> = HashMap::new();

    for name in &files {
        let image = image::open(dir.join(name))?.to_rgba8();
        if let Some(caps) = side_pattern.captures(name) {
            let key = caps[1].to_string();
            if !table.contains_key(&key) {
                order.push(key.clone());
            }
            let entry = table.entry(key).or_default();
            if &caps[2] == "face" {
                entry.face = Some(image);
            } else {
                entry.back = Some(image);
            }
        } else {
            order.push(name.clone());
            table.insert(
                name.clone(),
                CardImages {
                    face: Some(image),
                    back: None,
                },
            );
        }
    }

    if order.is_empty() {
        return Err(CardsError::ImageFilesNotFound);
    }
    tracing::info!("Successfully loaded {} images from directory", order.len());
    Ok(order
        .into_iter()
        .filter_map(|key| table.remove(&key))
        .collect())
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord)]
enum NaturalPart {
    Number(u64),
    Text(String),
}

/// Split a filename into digit runs and text runs so numeric parts compare as
/// numbers.
fn natural_key(name: &str) -> Vec<NaturalPart> {
    let mut parts = Vec::new();
    let mut text = String::new();
    let mut digits = String::new();

    let flush_digits = |digits: &mut String, parts: &mut Vec<NaturalPart>| {
        if !digits.is_empty() {
            let run = std::mem::take(digits);
            match run.parse::<u64>() {
                Ok(n) => parts.push(NaturalPart::Number(n)),
                Err(_) => parts.push(NaturalPart::Text(run)),
            }
        }
    };

    for ch in name.chars() {
        if ch.is_ascii_digit() {
            if !text.is_empty() {
                parts.push(NaturalPart::Text(std::mem::take(&mut text)));
            }
            digits.push(ch);
        } else {
            flush_digits(&mut digits, &mut parts);
            text.push(ch);
        }
    }
    flush_digits(&mut digits, &mut parts);
    if !text.is_empty() {
        parts.push(NaturalPart::Text(text));
    }
    parts
}

struct DocumentSelection<'a> {
    filename: &'static str,
    images: Vec<&'a RgbaImage>,
}

fn side_images<'a, I>(cards: I) -> Vec<&'a RgbaImage>
where
    I: Iterator<Item = &'a CardImages>,
{
    cards
        .flat_map(|card| card.sides().map(|(_, image)| image))
        .collect()
}

/// Decide which PDF documents to produce and which card sides go into each.
fn select_documents(cards: &[CardImages], output: OutputOptions) -> Vec<DocumentSelection<'_>> {
    if !output.split_double_and_single {
        return vec![DocumentSelection {
            filename: "output.pdf",
            images: side_images(cards.iter()),
        }];
    }

    let double = DocumentSelection {
        filename: "output_double.pdf",
        images: side_images(cards.iter().filter(|card| card.is_double_sided())),
    };
    let single = DocumentSelection {
        filename: "output_single.pdf",
        images: side_images(cards.iter().filter(|card| card.is_single_sided())),
    };

    if output.double_only {
        vec![double]
    } else if output.single_only {
        vec![single]
    } else {
        vec![single, double]
    }
}

fn encode_png(image: &RgbaImage) -> Result<Vec<u8>> {
    let mut bytes = std::io::Cursor::new(Vec::new());
    image.write_to(&mut bytes, image::ImageOutputFormat::Png)?;
    Ok(bytes.into_inner())
}

#[async_trait::async_trait]
impl<S: Storage, C: ConfigProvider> Pipeline for CardPipeline<S, C> {
    async fn extract(&self) -> Result<Vec<CardImages>> {
        let path = Path::new(self.config.input_path());
        if path.is_dir() {
            cards_from_directory(path)
        } else if path.is_file() {
            self.cards_from_save_file(path).await
        } else {
            Err(CardsError::ProcessingError {
                message: format!("Invalid path: {}", path.display()),
            })
        }
    }

    async fn transform(&self, cards: Vec<CardImages>) -> Result<RenderResult> {
        let output = self.config.output_options();
        let render = self.config.render_options();
        let mut result = RenderResult::default();

        if output.save_images {
            for (index, card) in cards.iter().enumerate() {
                for (side, image) in card.sides() {
                    result.exports.push(CardExport {
                        path: format!("img/card_{}_{}.png", index, side.as_str()),
                        image: image.clone(),
                    });
                }
            }
        }

        if output.skip_pdf_generation {
            if result.exports.is_empty() {
                tracing::warn!("PDF generation skipped and no image exports requested; nothing to produce");
            }
            return Ok(result);
        }

        for selection in select_documents(&cards, output) {
            if selection.images.is_empty() {
                tracing::warn!("No card sides for {}; skipping", selection.filename);
                continue;
            }
            tracing::info!(
                "Arranging {} images into {}",
                selection.images.len(),
                selection.filename
            );
            let sheets = layout::assemble(&selection.images, &render)?;
            result.documents.push(SheetDocument {
                filename: selection.filename.to_string(),
                sheets,
            });
        }

        if result.documents.is_empty() && result.exports.is_empty() {
            return Err(CardsError::ProcessingError {
                message: "no card sides available to arrange into a PDF".to_string(),
            });
        }
        Ok(result)
    }

    async fn load(&self, result: RenderResult) -> Result<String> {
        for export in &result.exports {
            let bytes = encode_png(&export.image)?;
            self.storage.write_file(&export.path, &bytes).await?;
        }
        if !result.exports.is_empty() {
            tracing::info!(
                "Images saved to {}/img",
                self.config.output_path()
            );
        }

        let dpi = self.config.render_options().dpi;
        for document in &result.documents {
            let bytes = pdf::render_pdf(&document.sheets, dpi, &document.filename)?;
            let relative = format!("pdf/{}", document.filename);
            self.storage.write_file(&relative, &bytes).await?;
            tracing::info!(
                "PDF file saved to {}/{}",
                self.config.output_path(),
                relative
            );
        }

        Ok(self.config.output_path().to_string())
    }
}

pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
mod cli_config {
    use crate::core::ConfigProvider;
    use crate::domain::model::{
        resolve_card_length_px, resolve_sheet_px, CardSizePreset, ExtractOptions, OutputOptions,
        RenderOptions, SheetSizePreset,
    };
    use crate::utils::error::{CardsError, Result};
    use crate::utils::validation::{self, Validate};
    use clap::Parser;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, Serialize, Deserialize, Parser)]
    #[command(name = "ttscards")]
    #[command(about = "Convert Tabletop Simulator Saved Objects into printable card sheet PDFs")]
    pub struct CliConfig {
        /// TTS Saved Object JSON file, or a directory of card images
        #[arg(long)]
        pub path: String,

        #[arg(long, default_value = "./output")]
        pub output_path: String,

        #[arg(long, default_value = "./cache")]
        pub cache_path: String,

        #[arg(long, value_enum, default_value = "standard")]
        pub card_size: CardSizePreset,

        /// Card long edge in mm; 0 keeps the preset size
        #[arg(long, default_value = "0.0")]
        pub card_length_mm: f64,

        #[arg(long, value_enum, default_value = "letter")]
        pub sheet_size: SheetSizePreset,

        #[arg(long, default_value = "0.0")]
        pub sheet_width_mm: f64,

        #[arg(long, default_value = "0.0")]
        pub sheet_length_mm: f64,

        #[arg(long, default_value = "3.175")]
        pub gutter_margin_mm: f64,

        #[arg(long, default_value = "360")]
        pub dpi: u32,

        #[arg(long, help = "Enable verbose output")]
        pub verbose: bool,

        #[arg(long, help = "Skip sprite sheet URLs listed in image_blacklist.txt")]
        pub exclude_card_urls: bool,

        #[arg(long)]
        pub exclude_card_backs: bool,

        #[arg(long)]
        pub exclude_card_faces: bool,

        /// Extend each card with mirrored edges for edge-to-edge cutting
        #[arg(long)]
        pub generate_bleed: bool,

        #[arg(long, default_value = "3.0")]
        pub bleed_width_mm: f64,

        #[arg(long)]
        pub sharpen_text: bool,

        #[arg(long)]
        pub draw_cut_lines: bool,

        #[arg(long, default_value = "1")]
        pub line_width: u32,

        #[arg(long)]
        pub cut_lines_on_margin_only: bool,

        #[arg(long)]
        pub no_cut_lines_on_last_sheet: bool,

        /// Write single-sided and double-sided cards into separate PDFs
        #[arg(long)]
        pub split_double_and_single: bool,

        #[arg(long)]
        pub double_only: bool,

        #[arg(long)]
        pub single_only: bool,

        #[arg(long, help = "Save each card side as a PNG file")]
        pub save_images: bool,

        #[arg(long)]
        pub skip_pdf_generation: bool,

        #[arg(long, help = "Log CPU and memory usage per phase")]
        pub monitor: bool,
    }

    impl Default for CliConfig {
        fn default() -> Self {
            Self {
                path: String::new(),
                output_path: "./output".to_string(),
                cache_path: "./cache".to_string(),
                card_size: CardSizePreset::Standard,
                card_length_mm: 0.0,
                sheet_size: SheetSizePreset::Letter,
                sheet_width_mm: 0.0,
                sheet_length_mm: 0.0,
                gutter_margin_mm: 3.175,
                dpi: 360,
                verbose: false,
                exclude_card_urls: false,
                exclude_card_backs: false,
                exclude_card_faces: false,
                generate_bleed: false,
                bleed_width_mm: 3.0,
                sharpen_text: false,
                draw_cut_lines: false,
                line_width: 1,
                cut_lines_on_margin_only: false,
                no_cut_lines_on_last_sheet: false,
                split_double_and_single: false,
                double_only: false,
                single_only: false,
                save_images: false,
                skip_pdf_generation: false,
                monitor: false,
            }
        }
    }

    impl ConfigProvider for CliConfig {
        fn input_path(&self) -> &str {
            &self.path
        }

        fn output_path(&self) -> &str {
            &self.output_path
        }

        fn cache_path(&self) -> &str {
            &self.cache_path
        }

        fn extract_options(&self) -> ExtractOptions {
            ExtractOptions {
                exclude_card_urls: self.exclude_card_urls,
                exclude_card_backs: self.exclude_card_backs,
                exclude_card_faces: self.exclude_card_faces,
            }
        }

        fn render_options(&self) -> RenderOptions {
            RenderOptions {
                sheet_px: resolve_sheet_px(self.sheet_size, self.sheet_width_mm, self.sheet_length_mm),
                card_length_px: resolve_card_length_px(self.card_size, self.card_length_mm),
                gutter_margin_mm: self.gutter_margin_mm,
                dpi: self.dpi,
                generate_bleed: self.generate_bleed,
                bleed_width_mm: self.bleed_width_mm,
                sharpen_text: self.sharpen_text,
                draw_cut_lines: self.draw_cut_lines,
                line_width: self.line_width,
                cut_lines_on_margin_only: self.cut_lines_on_margin_only,
                no_cut_lines_on_last_sheet: self.no_cut_lines_on_last_sheet,
            }
        }

        fn output_options(&self) -> OutputOptions {
            OutputOptions {
                split_double_and_single: self.split_double_and_single,
                double_only: self.double_only,
                single_only: self.single_only,
                save_images: self.save_images,
                skip_pdf_generation: self.skip_pdf_generation,
            }
        }
    }

    impl Validate for CliConfig {
        fn validate(&self) -> Result<()> {
            validation::validate_path("path", &self.path)?;
            validation::validate_path("output_path", &self.output_path)?;
            validation::validate_path("cache_path", &self.cache_path)?;
            validation::validate_range("dpi", self.dpi, 72, 1200)?;
            validation::validate_positive_number("line_width", self.line_width as usize, 1)?;
            validation::validate_non_negative("card_length_mm", self.card_length_mm)?;
            validation::validate_non_negative("sheet_width_mm", self.sheet_width_mm)?;
            validation::validate_non_negative("sheet_length_mm", self.sheet_length_mm)?;
            validation::validate_non_negative("gutter_margin_mm", self.gutter_margin_mm)?;
            validation::validate_non_negative("bleed_width_mm", self.bleed_width_mm)?;

            if self.double_only && self.single_only {
                return Err(CardsError::ConfigValidationError {
                    field: "double_only".to_string(),
                    message: "--double-only and --single-only are mutually exclusive".to_string(),
                });
            }
            if (self.double_only || self.single_only) && !self.split_double_and_single {
                return Err(CardsError::ConfigValidationError {
                    field: "split_double_and_single".to_string(),
                    message: "--double-only and --single-only require --split-double-and-single"
                        .to_string(),
                });
            }

            Ok(())
        }
    }

}

#[cfg(feature = "cli")]
pub use cli_config::CliConfig;

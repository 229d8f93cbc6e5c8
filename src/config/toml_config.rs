use crate::core::ConfigProvider;
use crate::domain::model::{
    resolve_card_length_px, resolve_sheet_px, CardSizePreset, ExtractOptions, OutputOptions,
    RenderOptions, SheetSizePreset,
};
use crate::utils::error::{CardsError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A conversion job described in a TOML file. Only `[job]`, `[source]` and
/// `[output]` are required; layout and render settings fall back to the same
/// defaults the CLI uses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub job: JobSection,
    pub source: SourceSection,
    #[serde(default)]
    pub layout: LayoutSection,
    #[serde(default)]
    pub render: RenderSection,
    pub output: OutputSection,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceSection {
    pub path: String,
    pub cache_path: Option<String>,
    pub exclude_card_urls: Option<bool>,
    pub exclude_card_backs: Option<bool>,
    pub exclude_card_faces: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LayoutSection {
    pub sheet_size: Option<SheetSizePreset>,
    pub sheet_width_mm: Option<f64>,
    pub sheet_length_mm: Option<f64>,
    pub card_size: Option<CardSizePreset>,
    pub card_length_mm: Option<f64>,
    pub gutter_margin_mm: Option<f64>,
    pub dpi: Option<u32>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenderSection {
    pub generate_bleed: Option<bool>,
    pub bleed_width_mm: Option<f64>,
    pub sharpen_text: Option<bool>,
    pub draw_cut_lines: Option<bool>,
    pub line_width: Option<u32>,
    pub cut_lines_on_margin_only: Option<bool>,
    pub no_cut_lines_on_last_sheet: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSection {
    pub path: String,
    pub split_double_and_single: Option<bool>,
    pub double_only: Option<bool>,
    pub single_only: Option<bool>,
    pub save_images: Option<bool>,
    pub skip_pdf_generation: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
}

impl JobConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(CardsError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        // 處理環境變數替換
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| CardsError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${DECKS_DIR})
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        // 使用正規表達式匹配 ${VAR_NAME} 格式
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("job.name", &self.job.name)?;
        validation::validate_path("source.path", &self.source.path)?;
        validation::validate_path("output.path", &self.output.path)?;

        if let Some(cache_path) = &self.source.cache_path {
            validation::validate_path("source.cache_path", cache_path)?;
        }
        if let Some(dpi) = self.layout.dpi {
            validation::validate_range("layout.dpi", dpi, 72, 1200)?;
        }
        if let Some(line_width) = self.render.line_width {
            validation::validate_positive_number("render.line_width", line_width as usize, 1)?;
        }
        if let Some(mm) = self.layout.card_length_mm {
            validation::validate_non_negative("layout.card_length_mm", mm)?;
        }
        if let Some(mm) = self.layout.sheet_width_mm {
            validation::validate_non_negative("layout.sheet_width_mm", mm)?;
        }
        if let Some(mm) = self.layout.sheet_length_mm {
            validation::validate_non_negative("layout.sheet_length_mm", mm)?;
        }
        if let Some(mm) = self.layout.gutter_margin_mm {
            validation::validate_non_negative("layout.gutter_margin_mm", mm)?;
        }
        if let Some(mm) = self.render.bleed_width_mm {
            validation::validate_non_negative("render.bleed_width_mm", mm)?;
        }

        let double_only = self.output.double_only.unwrap_or(false);
        let single_only = self.output.single_only.unwrap_or(false);
        let split = self.output.split_double_and_single.unwrap_or(false);
        if double_only && single_only {
            return Err(CardsError::ConfigValidationError {
                field: "output.double_only".to_string(),
                message: "double_only and single_only are mutually exclusive".to_string(),
            });
        }
        if (double_only || single_only) && !split {
            return Err(CardsError::ConfigValidationError {
                field: "output.split_double_and_single".to_string(),
                message: "double_only and single_only require split_double_and_single".to_string(),
            });
        }

        Ok(())
    }

    /// 取得監控設定
    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

impl ConfigProvider for JobConfig {
    fn input_path(&self) -> &str {
        &self.source.path
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn cache_path(&self) -> &str {
        self.source.cache_path.as_deref().unwrap_or("./cache")
    }

    fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            exclude_card_urls: self.source.exclude_card_urls.unwrap_or(false),
            exclude_card_backs: self.source.exclude_card_backs.unwrap_or(false),
            exclude_card_faces: self.source.exclude_card_faces.unwrap_or(false),
        }
    }

    fn render_options(&self) -> RenderOptions {
        let sheet_size = self.layout.sheet_size.unwrap_or(SheetSizePreset::Letter);
        let card_size = self.layout.card_size.unwrap_or(CardSizePreset::Standard);
        RenderOptions {
            sheet_px: resolve_sheet_px(
                sheet_size,
                self.layout.sheet_width_mm.unwrap_or(0.0),
                self.layout.sheet_length_mm.unwrap_or(0.0),
            ),
            card_length_px: resolve_card_length_px(
                card_size,
                self.layout.card_length_mm.unwrap_or(0.0),
            ),
            gutter_margin_mm: self.layout.gutter_margin_mm.unwrap_or(3.175),
            dpi: self.layout.dpi.unwrap_or(360),
            generate_bleed: self.render.generate_bleed.unwrap_or(false),
            bleed_width_mm: self.render.bleed_width_mm.unwrap_or(3.0),
            sharpen_text: self.render.sharpen_text.unwrap_or(false),
            draw_cut_lines: self.render.draw_cut_lines.unwrap_or(false),
            line_width: self.render.line_width.unwrap_or(1),
            cut_lines_on_margin_only: self.render.cut_lines_on_margin_only.unwrap_or(false),
            no_cut_lines_on_last_sheet: self.render.no_cut_lines_on_last_sheet.unwrap_or(false),
        }
    }

    fn output_options(&self) -> OutputOptions {
        OutputOptions {
            split_double_and_single: self.output.split_double_and_single.unwrap_or(false),
            double_only: self.output.double_only.unwrap_or(false),
            single_only: self.output.single_only.unwrap_or(false),
            save_images: self.output.save_images.unwrap_or(false),
            skip_pdf_generation: self.output.skip_pdf_generation.unwrap_or(false),
        }
    }
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

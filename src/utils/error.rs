use thiserror::Error;

#[derive(Error, Debug)]
pub enum CardsError {
    #[error("Image download failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Saved Object parsing error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("Image processing error: {0}")]
    ImageError(#[from] image::ImageError),

    #[error("PDF generation error: {message}")]
    PdfError { message: String },

    #[error("Sheet layout error: {message}")]
    LayoutError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("No cards were found in the TTS Saved Object data. No output was generated.")]
    CardsNotFound,

    #[error("No image files were found in the specified directory. No output was generated.")]
    ImageFilesNotFound,

    #[error("Configuration error: missing required field '{field}'")]
    MissingConfigError { field: String },

    #[error("Configuration error: {field}='{value}' is invalid: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },
}

/// 錯誤嚴重程度，決定 CLI 的退出碼
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Io,
    Data,
    Config,
    Render,
}

impl CardsError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 網絡錯誤通常可以重試
            CardsError::HttpError(_) => ErrorSeverity::Medium,
            CardsError::IoError(_) => ErrorSeverity::Critical,
            CardsError::JsonError(_)
            | CardsError::ImageError(_)
            | CardsError::PdfError { .. }
            | CardsError::LayoutError { .. }
            | CardsError::ProcessingError { .. }
            | CardsError::CardsNotFound
            | CardsError::ImageFilesNotFound => ErrorSeverity::High,
            CardsError::MissingConfigError { .. }
            | CardsError::InvalidConfigValueError { .. }
            | CardsError::ConfigValidationError { .. } => ErrorSeverity::High,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            CardsError::HttpError(_) => ErrorCategory::Network,
            CardsError::IoError(_) => ErrorCategory::Io,
            CardsError::JsonError(_)
            | CardsError::ProcessingError { .. }
            | CardsError::CardsNotFound
            | CardsError::ImageFilesNotFound => ErrorCategory::Data,
            CardsError::ImageError(_)
            | CardsError::PdfError { .. }
            | CardsError::LayoutError { .. } => ErrorCategory::Render,
            CardsError::MissingConfigError { .. }
            | CardsError::InvalidConfigValueError { .. }
            | CardsError::ConfigValidationError { .. } => ErrorCategory::Config,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            CardsError::HttpError(_) => {
                "Check your network connection and verify the image URLs in the Saved Object are still reachable. Cloud-hosted TTS images sometimes expire.".to_string()
            }
            CardsError::IoError(_) => {
                "Check file permissions and available disk space for the output and cache directories.".to_string()
            }
            CardsError::JsonError(_) => {
                "Verify the input file is a TTS Saved Object exported as JSON, not a workshop .bin file.".to_string()
            }
            CardsError::ImageError(_) => {
                "One of the downloaded sprite sheets could not be decoded. Add its URL to image_blacklist.txt and rerun with --exclude-card-urls.".to_string()
            }
            CardsError::PdfError { .. } => {
                "Try a lower --dpi value; very large sheets can exceed memory limits during PDF encoding.".to_string()
            }
            CardsError::LayoutError { .. } => {
                "Reduce the card size, bleed or gutter margin, or pick a larger sheet size so at least one card fits.".to_string()
            }
            CardsError::ProcessingError { .. } => {
                "Check the input path and the card data in the Saved Object.".to_string()
            }
            CardsError::CardsNotFound => {
                "Make sure the Saved Object actually contains Card or CardCustom objects (decks, bags and tables are searched recursively).".to_string()
            }
            CardsError::ImageFilesNotFound => {
                "Place .png or .jpg files in the input directory, optionally named card_<n>_face.png / card_<n>_back.png to pair sides.".to_string()
            }
            CardsError::MissingConfigError { field } => {
                format!("Add the required field '{}' to your configuration.", field)
            }
            CardsError::InvalidConfigValueError { field, .. } => {
                format!("Correct the value of '{}' and try again.", field)
            }
            CardsError::ConfigValidationError { field, .. } => {
                format!("Review the '{}' setting in your configuration.", field)
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            CardsError::HttpError(_) => "An image download failed.".to_string(),
            CardsError::IoError(_) => "A file could not be read or written.".to_string(),
            CardsError::JsonError(_) => "The input file is not valid Saved Object JSON.".to_string(),
            CardsError::ImageError(_) => "An image could not be decoded or encoded.".to_string(),
            CardsError::PdfError { .. } => "The PDF file could not be generated.".to_string(),
            CardsError::LayoutError { .. } => {
                "The cards do not fit on the selected sheet.".to_string()
            }
            CardsError::CardsNotFound | CardsError::ImageFilesNotFound => self.to_string(),
            CardsError::ProcessingError { message } => message.clone(),
            CardsError::MissingConfigError { .. }
            | CardsError::InvalidConfigValueError { .. }
            | CardsError::ConfigValidationError { .. } => self.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CardsError>;

pub mod engine;
pub mod fetcher;
pub mod image_ops;
pub mod layout;
pub mod pdf;
pub mod pipeline;
pub mod tts;

pub use crate::domain::model::{CardImages, RenderResult};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;

use crate::domain::model::{CardImages, ExtractOptions, OutputOptions, RenderOptions, RenderResult};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_path(&self) -> &str;
    fn output_path(&self) -> &str;
    fn cache_path(&self) -> &str;
    fn extract_options(&self) -> ExtractOptions;
    fn render_options(&self) -> RenderOptions;
    fn output_options(&self) -> OutputOptions;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<CardImages>>;
    async fn transform(&self, cards: Vec<CardImages>) -> Result<RenderResult>;
    async fn load(&self, result: RenderResult) -> Result<String>;
}

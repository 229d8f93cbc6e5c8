use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::ResourceMonitor;

pub struct ConversionEngine<P: Pipeline> {
    pipeline: P,
    monitor: ResourceMonitor,
}

impl<P: Pipeline> ConversionEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self::new_with_monitoring(pipeline, false)
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        println!("Starting conversion...");

        // Extract
        println!("Extracting card images...");
        let cards = self.pipeline.extract().await?;
        println!("Extracted {} cards", cards.len());
        self.monitor.log_phase("Extract");

        // Transform
        println!("Arranging sheets...");
        let result = self.pipeline.transform(cards).await?;
        println!(
            "Prepared {} PDF document(s) and {} image export(s)",
            result.documents.len(),
            result.exports.len()
        );
        self.monitor.log_phase("Transform");

        // Load
        println!("Writing output...");
        let output_path = self.pipeline.load(result).await?;
        println!("Output saved to: {}", output_path);
        self.monitor.log_phase("Load");

        self.monitor.log_summary();

        Ok(output_path)
    }
}

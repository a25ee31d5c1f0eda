use anyhow::Result;
use smart_grid_generator::{
    config::AppConfig,
    metrics_server,
    observability,
    pipeline::{partition_zip_codes, BatchPipeline},
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    observability::init_tracing();

    // Load configuration
    let cfg = AppConfig::load()?;

    // Start metrics server if configured
    if let Some(metrics_cfg) = &cfg.metrics {
        metrics_server::init(&metrics_cfg.bind_addr)?;
    }

    let params = &cfg.params;
    let batches = partition_zip_codes(&params.zip_codes(), params.num_of_batches);
    if batches.is_empty() {
        tracing::info!("no zip codes configured, nothing to generate");
        return Ok(());
    }

    let dl = &cfg.data_lake;
    tracing::info!(
        account = %dl.account_name,
        container = %dl.container,
        folder = %dl.folder,
        "connecting to data lake"
    );
    let fs = dl.connect()?;

    let pipeline = BatchPipeline::new(
        fs,
        dl.folder.as_str(),
        params.meter_ids(),
        params.num_of_meter_reading,
        params.max_sleep_timer,
    );

    let batch_count = batches.len();
    let outcomes = pipeline.run(batches).await;
    let written = outcomes.iter().filter(|o| o.is_ok()).count();
    tracing::info!(batches = batch_count, written, "smart grid generation finished");

    Ok(())
}

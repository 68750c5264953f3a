use anyhow::Result;
use pumpcontrol::{AppConfig, Runner};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<()> {
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Failed to load configuration: {}", e);
        e
    })?;

    pumpcontrol::logging::init_logging(&config.logging)?;
    info!("Pumpcontrol {} starting", env!("APP_VERSION"));

    let outcome = async {
        let runner = Runner::from_config(&config).await?;
        runner.run_now().await
    }
    .await;

    match outcome {
        Ok(report) => {
            info!(
                "Run complete: desired={}, previous={}, changed={}",
                report.desired, report.previous, report.changed
            );
            Ok(())
        }
        Err(e) => {
            // Nothing was switched; the next scheduled run retries
            error!(kind = e.kind(), "Run aborted: {}", e);
            Err(anyhow::anyhow!("Run aborted: {}", e))
        }
    }
}

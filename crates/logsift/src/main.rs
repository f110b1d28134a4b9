use logsift::runtime::{boot, run};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    boot::init_logging();
    let (config, cancel) = boot::boot().await?;
    run::run(config, cancel).await?;
    Ok(())
}

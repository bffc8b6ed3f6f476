use azure_vm_disk_sample::logging;
use std::error::Error;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Do as little as possible in main.rs as it can't contain any tests
    logging::init(logging::LOG_CONFIG_FILE)?;
    dotenv::dotenv().ok();
    //
    log::info!("#Start main()");

    if let Some(report) = azure_vm_disk_sample::run(|k| std::env::var(k).ok()).await {
        println!("{report}");
    }

    Ok(())
}

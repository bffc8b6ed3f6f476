//! Azure compute sample: manage a virtual machine and its managed disks.
//!
//! The library holds everything so it can be tested; `main.rs` only wires
//! settings, credentials and logging together.

pub mod azure;
pub mod cloud;
pub mod config;
pub mod disk_plan;
pub mod error;
pub mod logging;
pub mod models;
pub mod names;
pub mod sample;
pub mod simulated;

pub use cloud::CloudApi;
pub use error::{Error, Result};
pub use sample::{cleanup, run_sample, Cleanup, SampleReport, Step};
pub use simulated::SimulatedCloud;

use azure::ArmClient;
use config::{Credentials, SampleSettings, SIMULATED_SUBSCRIPTION_ID};
use std::time::Duration;

/// Read settings through `lookup` and run the sample against Azure, or against
/// [`SimulatedCloud`] when `SIMULATE` is set.
///
/// Nothing is raised: bad settings or missing credentials are logged and the
/// run is skipped.
///
/// # Returns
/// * `Some(SampleReport)` - The run happened; step failures are inside the report
/// * `None` - Settings were invalid or the client could not be built
pub async fn run<F>(lookup: F) -> Option<SampleReport>
where
    F: Fn(&str) -> Option<String>,
{
    match try_run(&lookup).await {
        Ok(report) => Some(report),
        Err(e) => {
            log::error!("Sample not started: {e}");
            None
        }
    }
}

async fn try_run<F>(lookup: &F) -> Result<SampleReport>
where
    F: Fn(&str) -> Option<String>,
{
    let settings = SampleSettings::from_lookup(lookup)?;
    if settings.simulate {
        log::warn!("SIMULATE set, running against the in-memory cloud");
        let cloud = SimulatedCloud::new(SIMULATED_SUBSCRIPTION_ID);
        return Ok(run_sample(&cloud, &settings).await);
    }

    let credentials = Credentials::from_lookup(lookup)?;
    let client = ArmClient::new(
        &credentials,
        &settings.endpoints,
        Duration::from_millis(settings.poll_interval_msec),
    )?;
    Ok(run_sample(&client, &settings).await)
}

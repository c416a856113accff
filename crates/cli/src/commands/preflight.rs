//! Storefront reachability check

use std::sync::Arc;

use storefront_common::HarnessConfig;
use storefront_e2e::{PlaywrightConfig, PlaywrightLauncher, TestRunner};

use crate::output::{print_error, print_success};

pub async fn execute(config: HarnessConfig) -> anyhow::Result<()> {
    let base_url = config.site.base_url.clone();
    let launcher = Arc::new(PlaywrightLauncher::new(PlaywrightConfig::from_harness(&config)));
    let runner = TestRunner::new(launcher, Arc::new(config));

    match runner.preflight().await {
        Ok(()) => {
            print_success(&format!("Storefront is reachable at {}", base_url));
            Ok(())
        }
        Err(e) => {
            print_error(&format!("Storefront is not reachable at {}", base_url));
            Err(e.into())
        }
    }
}

use std::time::Duration;

use tracing::debug;
use vm_scaling_core::loadgen::{
    add_web_service_path, autoscaling_test_path, horizontal_test_path, test_log_path,
    warmup_path,
};
use vm_scaling_core::ports::LoadGeneratorApi;
use vm_scaling_core::LoadGeneratorError;

use super::bridge::block_on;

pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Plain-HTTP client for the load generator's test API.
#[derive(Debug, Clone)]
pub struct HttpLoadGenerator {
    client: reqwest::Client,
}

impl HttpLoadGenerator {
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn get(&self, host: &str, path: &str) -> Result<String, LoadGeneratorError> {
        let url = format!("http://{host}{path}");
        debug!(event = "load_generator_request", url = %url);
        block_on(async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|error| LoadGeneratorError::new(&url, error.to_string()))?;
            let status = response.status();
            let body = response
                .text()
                .await
                .map_err(|error| LoadGeneratorError::new(&url, error.to_string()))?;
            if !status.is_success() {
                return Err(LoadGeneratorError::new(
                    &url,
                    format!("status {status}: {}", body.trim()),
                ));
            }
            Ok(body)
        })
    }
}

impl LoadGeneratorApi for HttpLoadGenerator {
    fn start_horizontal_test(
        &self,
        load_generator_dns: &str,
        web_service_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.get(load_generator_dns, &horizontal_test_path(web_service_dns))
    }

    fn add_web_service(
        &self,
        load_generator_dns: &str,
        web_service_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.get(load_generator_dns, &add_web_service_path(web_service_dns))
    }

    fn start_warmup(
        &self,
        load_generator_dns: &str,
        load_balancer_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.get(load_generator_dns, &warmup_path(load_balancer_dns))
    }

    fn start_autoscaling_test(
        &self,
        load_generator_dns: &str,
        load_balancer_dns: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.get(load_generator_dns, &autoscaling_test_path(load_balancer_dns))
    }

    fn fetch_test_log(
        &self,
        load_generator_dns: &str,
        test_id: &str,
    ) -> Result<String, LoadGeneratorError> {
        self.get(load_generator_dns, &test_log_path(test_id))
    }
}

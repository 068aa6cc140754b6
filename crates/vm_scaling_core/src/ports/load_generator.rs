use crate::error::LoadGeneratorError;

/// The load generator's HTTP API. Hosts are public DNS names; every call
/// returns the raw response body.
pub trait LoadGeneratorApi {
    fn start_horizontal_test(
        &self,
        load_generator_dns: &str,
        web_service_dns: &str,
    ) -> Result<String, LoadGeneratorError>;
    fn add_web_service(
        &self,
        load_generator_dns: &str,
        web_service_dns: &str,
    ) -> Result<String, LoadGeneratorError>;
    fn start_warmup(
        &self,
        load_generator_dns: &str,
        load_balancer_dns: &str,
    ) -> Result<String, LoadGeneratorError>;
    fn start_autoscaling_test(
        &self,
        load_generator_dns: &str,
        load_balancer_dns: &str,
    ) -> Result<String, LoadGeneratorError>;
    fn fetch_test_log(
        &self,
        load_generator_dns: &str,
        test_id: &str,
    ) -> Result<String, LoadGeneratorError>;
}

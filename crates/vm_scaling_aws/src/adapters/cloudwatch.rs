use aws_sdk_cloudwatch::types::{ComparisonOperator, Dimension, Statistic};
use aws_sdk_cloudwatch::Client;
use vm_scaling_core::model::{AlarmComparison, MetricAlarmRequest};
use vm_scaling_core::ports::AlarmApi;
use vm_scaling_core::CloudError;

use super::bridge::{block_on, sdk_error};

pub struct CloudWatchAlarms {
    client: Client,
}

impl CloudWatchAlarms {
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

fn comparison_operator(comparison: AlarmComparison) -> ComparisonOperator {
    match comparison {
        AlarmComparison::GreaterThanThreshold => ComparisonOperator::GreaterThanThreshold,
        AlarmComparison::LessThanThreshold => ComparisonOperator::LessThanThreshold,
    }
}

impl AlarmApi for CloudWatchAlarms {
    fn put_metric_alarm(&self, request: &MetricAlarmRequest) -> Result<(), CloudError> {
        const OPERATION: &str = "put_metric_alarm";
        let dimension = Dimension::builder()
            .name(&request.dimension_name)
            .value(&request.dimension_value)
            .build()
            .map_err(|error| CloudError::new(OPERATION, error.to_string()))?;
        block_on(
            self.client
                .put_metric_alarm()
                .alarm_name(&request.alarm_name)
                .alarm_description(&request.description)
                .namespace(&request.namespace)
                .metric_name(&request.metric_name)
                .dimensions(dimension)
                .statistic(Statistic::Average)
                .period(request.period)
                .evaluation_periods(request.evaluation_periods)
                .threshold(request.threshold)
                .comparison_operator(comparison_operator(request.comparison))
                .actions_enabled(true)
                .alarm_actions(&request.action_arn)
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error(OPERATION, error))
    }

    /// Only deletes alarms that exist; a batch naming a missing alarm would
    /// otherwise fail as a whole.
    fn delete_alarms(&self, alarm_names: &[String]) -> Result<(), CloudError> {
        let output = block_on(
            self.client
                .describe_alarms()
                .set_alarm_names(Some(alarm_names.to_vec()))
                .send(),
        )
        .map_err(|error| sdk_error("describe_alarms", error))?;
        let existing: Vec<String> = output
            .metric_alarms()
            .iter()
            .filter_map(|alarm| alarm.alarm_name())
            .map(str::to_string)
            .collect();
        if existing.is_empty() {
            return Ok(());
        }

        block_on(
            self.client
                .delete_alarms()
                .set_alarm_names(Some(existing))
                .send(),
        )
        .map(|_| ())
        .map_err(|error| sdk_error("delete_alarms", error))
    }
}

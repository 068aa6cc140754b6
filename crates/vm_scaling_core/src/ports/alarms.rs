use crate::error::CloudError;
use crate::model::MetricAlarmRequest;

pub trait AlarmApi {
    fn put_metric_alarm(&self, request: &MetricAlarmRequest) -> Result<(), CloudError>;
    fn delete_alarms(&self, alarm_names: &[String]) -> Result<(), CloudError>;
}

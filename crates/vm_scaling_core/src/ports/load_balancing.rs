use crate::error::CloudError;
use crate::model::{
    ListenerRequest, LoadBalancer, LoadBalancerRequest, TargetGroup, TargetGroupRequest,
};

pub trait LoadBalancingApi {
    fn create_target_group(&self, request: &TargetGroupRequest) -> Result<TargetGroup, CloudError>;
    fn create_load_balancer(
        &self,
        request: &LoadBalancerRequest,
    ) -> Result<LoadBalancer, CloudError>;
    fn create_listener(&self, request: &ListenerRequest) -> Result<(), CloudError>;
    fn find_load_balancer(&self, name: &str) -> Result<Option<LoadBalancer>, CloudError>;
    fn find_target_group(&self, name: &str) -> Result<Option<TargetGroup>, CloudError>;
    fn delete_load_balancer(&self, load_balancer_arn: &str) -> Result<(), CloudError>;
    fn delete_target_group(&self, target_group_arn: &str) -> Result<(), CloudError>;
}

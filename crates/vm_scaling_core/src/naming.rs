//! Fixed resource names, derived names and tag sets.

use crate::model::ResourceTag;

pub const PROJECT_VALUE: &str = "vm-scaling";
pub const TYPE_VALUE: &str = "Project";
pub const ROLE_VALUE: &str = "Test";
pub const EOL_VALUE: &str = "20201230";

pub const WEB_SERVICE_SECURITY_GROUP: &str = "web-service-security-group";
pub const LG_SECURITY_GROUP: &str = "lg-security-group";
pub const ELB_ASG_SECURITY_GROUP: &str = "elb-asg-security-group";

pub const HTTP_PORT: i32 = 80;

pub const CPU_METRIC_NAMESPACE: &str = "AWS/EC2";
pub const CPU_METRIC_NAME: &str = "CPUUtilization";
pub const ASG_DIMENSION_NAME: &str = "AutoScalingGroupName";

pub const LOAD_GENERATOR_NAME: &str = "Load Generator";
pub const WEB_SERVICE_NAME: &str = "Web Service";

/// Tag key used to find instances left behind by an earlier run.
pub const PROJECT_TAG_KEY: &str = "Project";

pub fn scale_out_policy_name(group_name: &str) -> String {
    format!("{group_name}-scale-out-policy")
}

pub fn scale_in_policy_name(group_name: &str) -> String {
    format!("{group_name}-scale-in-policy")
}

pub fn high_cpu_alarm_name(group_name: &str) -> String {
    format!("{group_name}-high-cpu-alarm")
}

pub fn low_cpu_alarm_name(group_name: &str) -> String {
    format!("{group_name}-low-cpu-alarm")
}

/// Tags for instances launched by the horizontal scaling exercise.
pub fn horizontal_instance_tags(name: &str) -> Vec<ResourceTag> {
    vec![
        ResourceTag::new("Name", name),
        ResourceTag::new("project", PROJECT_VALUE),
    ]
}

/// Tags shared by every resource of the auto-scaling exercise.
pub fn lab_tags() -> Vec<ResourceTag> {
    vec![
        ResourceTag::new(PROJECT_TAG_KEY, PROJECT_VALUE),
        ResourceTag::new("Type", TYPE_VALUE),
        ResourceTag::new("Role", ROLE_VALUE),
        ResourceTag::new("EOL", EOL_VALUE),
    ]
}

pub fn load_generator_tags() -> Vec<ResourceTag> {
    let mut tags = lab_tags();
    tags.push(ResourceTag::new("Name", LOAD_GENERATOR_NAME));
    tags
}

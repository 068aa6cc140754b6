//! Get-or-create primitives shared by both exercises.

use tracing::{info, warn};

use crate::error::ScalingError;
use crate::ledger::{GroupOrigin, InstanceRole, ResourceLedger};
use crate::model::{InstanceLaunch, InstanceSnapshot, ResourceTag, SecurityGroupRequest, Vpc};
use crate::naming::HTTP_PORT;
use crate::ports::{Clock, ComputeApi};
use crate::wait::{wait_for_instance_ready, WaitPolicy};

pub fn default_vpc(compute: &dyn ComputeApi) -> Result<Vpc, ScalingError> {
    let vpc = compute.default_vpc()?.ok_or(ScalingError::NoDefaultVpc)?;
    info!(event = "resource_found", kind = "vpc", id = %vpc.vpc_id, "using default VPC");
    Ok(vpc)
}

/// Returns the id of the named group in `vpc_id`, creating it with an
/// HTTP ingress rule when it does not exist yet.
pub fn get_or_create_http_security_group(
    compute: &dyn ComputeApi,
    ledger: &mut ResourceLedger,
    group_name: &str,
    vpc_id: &str,
    tags: &[ResourceTag],
) -> Result<String, ScalingError> {
    match compute.find_security_group(group_name, Some(vpc_id)) {
        Ok(Some(group_id)) => {
            info!(
                event = "resource_found",
                kind = "security_group",
                name = group_name,
                id = %group_id,
                "reusing security group"
            );
            ledger.record_security_group(group_name, &group_id, GroupOrigin::Found);
            return Ok(group_id);
        }
        Ok(None) => {}
        Err(error) => {
            warn!(
                event = "security_group_lookup_failed",
                name = group_name,
                %error,
                "lookup failed, creating a new group"
            );
        }
    }

    let request = SecurityGroupRequest {
        name: group_name.to_string(),
        description: format!("Security group for {group_name}"),
        vpc_id: vpc_id.to_string(),
        tags: tags.to_vec(),
    };
    let group_id = compute.create_security_group(&request)?;
    ledger.record_security_group(group_name, &group_id, GroupOrigin::Created);
    info!(
        event = "resource_created",
        kind = "security_group",
        name = group_name,
        id = %group_id,
        "created security group"
    );

    compute.authorize_http_ingress(&group_id, HTTP_PORT)?;
    info!(
        event = "ingress_authorized",
        id = %group_id,
        port = HTTP_PORT,
        "allowed HTTP from anywhere"
    );
    Ok(group_id)
}

/// Launches one instance, records it, and waits until it is reachable.
pub fn launch_instance(
    compute: &dyn ComputeApi,
    clock: &dyn Clock,
    ledger: &mut ResourceLedger,
    launch: &InstanceLaunch,
    role: InstanceRole,
    wait: WaitPolicy,
) -> Result<InstanceSnapshot, ScalingError> {
    let instance_id = compute.run_instance(launch)?;
    ledger.record_instance(&instance_id, role);
    info!(
        event = "resource_created",
        kind = "instance",
        role = role.as_str(),
        id = %instance_id,
        image_id = %launch.image_id,
        "launched instance"
    );
    wait_for_instance_ready(compute, clock, &instance_id, wait)
}

/// Public DNS of a snapshot that already passed the readiness check.
pub fn public_dns(snapshot: &InstanceSnapshot) -> String {
    snapshot.public_dns.clone().unwrap_or_default()
}

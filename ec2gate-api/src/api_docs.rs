use crate::handlers::instances;
use ec2gate_common::{InstanceState, ManagedInstance, NetworkInterface, SecurityGroupRef, Volume};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    paths(
        instances::list_instances,
        instances::get_instance,
        instances::start_instance,
        instances::stop_instance,
        instances::reboot_instance
    ),
    components(
        schemas(
            instances::ListingResponse,
            instances::MessageResponse,
            ManagedInstance,
            NetworkInterface,
            SecurityGroupRef,
            Volume,
            InstanceState
        )
    )
)]
pub struct ApiDoc;

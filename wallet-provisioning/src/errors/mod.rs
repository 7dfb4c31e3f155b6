pub mod backend_error;
pub mod config_error;
pub mod flow_error;
pub mod material_error;
pub mod provisioning_error;
pub mod session_error;

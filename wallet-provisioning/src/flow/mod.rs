use crate::{errors::flow_error::FlowError, models::challenge::DeviceInfo, relay::FlowDelegate};

pub mod request_configuration;
pub mod simulated;

pub use request_configuration::RequestConfiguration;

/// Platform flow that talks to the secure element.
///
/// Only one flow can be on screen at a time and its callbacks carry no session
/// identifier: once presented it drives the [`FlowDelegate`] it was given,
/// asking for completion material through
/// [`FlowDelegate::request_challenge_response`] and reporting the outcome
/// through [`FlowDelegate::finished`].
pub trait SecureElementFlow: Send + Sync + 'static {
    fn can_add_payment_pass(&self) -> bool;

    fn device_info(&self) -> DeviceInfo;

    fn present(
        &self,
        configuration: RequestConfiguration,
        delegate: FlowDelegate,
    ) -> Result<(), FlowError>;

    fn dismiss(&self);
}

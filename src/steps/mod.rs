//! The concrete policy steps and the default chain definition.
//!
//! Registration order is the contract: later steps depend on state written
//! by earlier ones, and the finalization tail (everything from the merge
//! step on) is where raised exceptions land.

pub mod canonize;
pub mod context;
pub mod disposition;
pub mod finalize;
pub mod guard;
pub mod rate_limit;

use crate::chain::{Chain, SlotId, Step, StepFlow};

/// Build the full pipeline around an opaque application handler step.
///
/// The handler runs after all request policy has been enforced and before
/// response finalization; it is free to write the response, raise, or fail.
pub fn default_chain(handler: Step) -> Chain {
    Chain::new(vec![
        context::attach_transport_context(),
        context::create_response_object(),
        guard::reject_requests_bypassing_proxy(),
        canonize::canonize(),
        context::insert_constants(),
        context::seed_output(),
        rate_limit::enforce_rate_limits(),
        handler,
        disposition::add_content_disposition_header(),
        finalize::merge_exception_into_response(),
        finalize::turn_socket_error_into_50x(),
        finalize::bypass_csp_for_form_redirects(),
        finalize::delegate_error_to_renderer(),
        finalize::return_500_for_exception(),
        finalize::overwrite_status_code_of_gateway_errors(),
    ])
}

/// A handler that does nothing, for pipelines exercised only up to the
/// policy steps.
pub fn noop_handler() -> Step {
    Step::new("handle_request", &[SlotId::Request, SlotId::Response], |_, _| {
        StepFlow::Continue
    })
}

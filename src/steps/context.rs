//! Early enrichment steps: request context, response object, constants.

use crate::chain::{SlotId, Step, StepFlow};
use crate::constants::CONSTANTS;
use crate::http::response::{Body, Response};

/// Derive per-request context from the transport envelope.
///
/// Attaches the client country from the geo header; absence is normal for
/// traffic that did not come through the edge proxy.
pub fn attach_transport_context() -> Step {
    Step::new(
        "attach_transport_context",
        &[SlotId::Request],
        |bag, site| {
            let Some(request) = bag.request.as_mut() else {
                return StepFlow::Continue;
            };
            let country = request
                .header_str(&site.config().proxy.geo_header)
                .filter(|v| !v.is_empty())
                .map(str::to_owned);
            request.country = country;
            StepFlow::Continue
        },
    )
}

/// Create the response accumulator every later step writes into.
pub fn create_response_object() -> Step {
    Step::new("create_response_object", &[SlotId::Request], |bag, _| {
        bag.response = Some(Response::new());
        StepFlow::Continue
    })
}

/// Publish the process-wide constants table for application handlers.
pub fn insert_constants() -> Step {
    Step::new("insert_constants", &[], |bag, _| {
        bag.constants = Some(&CONSTANTS);
        StepFlow::Continue
    })
}

/// Ensure the `output` slot exists before application code runs, so steps
/// that declare it as required are not skipped on requests that produce no
/// output.
pub fn seed_output() -> Step {
    Step::new("seed_output", &[], |bag, _| {
        bag.output.get_or_insert(Body::Empty);
        StepFlow::Continue
    })
}

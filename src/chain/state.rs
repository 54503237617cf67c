//! The shared state bag threaded through the chain.
//!
//! The step set is closed and small, so the bag is a plain context struct
//! with named optional slots rather than a dynamic map. A slot counts as
//! "present" for the executor's skip rule when it is `Some`.

use crate::constants::Constants;
use crate::error::Exception;
use crate::http::request::Request;
use crate::http::response::{Body, Response};
use crate::render::Resource;

/// The authenticated identity, when application code has established one.
#[derive(Debug, Clone, Default)]
pub struct User {
    pub id: Option<u64>,
}

/// Names of the bag's slots, used by steps to declare required inputs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotId {
    Request,
    Response,
    Exception,
    User,
    Resource,
    Output,
    Constants,
}

/// Mutable state shared by all steps processing one request.
///
/// Owned by exactly one in-flight request; never shared across requests.
#[derive(Debug, Default)]
pub struct StateBag {
    pub request: Option<Request>,
    pub response: Option<Response>,
    pub exception: Option<Exception>,
    pub user: Option<User>,
    pub resource: Option<Resource>,
    pub output: Option<Body>,
    pub constants: Option<&'static Constants>,
}

impl StateBag {
    /// A bag seeded with the raw request, as handed over by the transport
    /// layer.
    pub fn new(request: Request) -> Self {
        Self {
            request: Some(request),
            ..Self::default()
        }
    }

    /// Whether a slot is present, for the executor's skip rule.
    pub fn has(&self, slot: SlotId) -> bool {
        match slot {
            SlotId::Request => self.request.is_some(),
            SlotId::Response => self.response.is_some(),
            SlotId::Exception => self.exception.is_some(),
            SlotId::User => self.user.is_some(),
            SlotId::Resource => self.resource.is_some(),
            SlotId::Output => self.output.is_some(),
            SlotId::Constants => self.constants.is_some(),
        }
    }
}

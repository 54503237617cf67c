//! Step registry and chain executor.
//!
//! # Execution rules
//! - Steps run in registration order, exactly once each at most.
//! - A step whose required slots are not all present is skipped, not failed;
//!   absence of an optional dependency is normal.
//! - A step that raises puts the exception into the bag, and execution
//!   jumps forward to the first later step that declares it consumes the
//!   `exception` slot. The finalization tail still honors the skip rule.
//! - A response always exists at termination; the finalization steps
//!   guarantee it, and the executor backstops them.

use http::StatusCode;

use crate::chain::state::{SlotId, StateBag};
use crate::error::{AppError, Exception};
use crate::http::response::{Raise, Response};
use crate::site::Site;

/// What a step tells the executor to do next.
pub enum StepFlow {
    /// Keep walking the chain.
    Continue,
    /// Short-circuit with a response raised as control flow.
    Raise(Raise),
    /// Short-circuit with an application failure.
    Fail(AppError),
}

type StepRun = Box<dyn Fn(&mut StateBag, &Site) -> StepFlow + Send + Sync>;

/// A registered chain step: a name, the slots it requires, and its body.
///
/// Only *required* inputs are declared; a step reads optional inputs as
/// `Option`s from the bag itself.
pub struct Step {
    name: &'static str,
    requires: &'static [SlotId],
    run: StepRun,
}

impl Step {
    pub fn new(
        name: &'static str,
        requires: &'static [SlotId],
        run: impl Fn(&mut StateBag, &Site) -> StepFlow + Send + Sync + 'static,
    ) -> Self {
        Self {
            name,
            requires,
            run: Box::new(run),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn requires(&self) -> &'static [SlotId] {
        self.requires
    }

    /// Invoke the step body directly, without the executor's skip and jump
    /// rules. Exists for step unit tests.
    #[doc(hidden)]
    pub fn invoke(&self, bag: &mut StateBag, site: &Site) -> StepFlow {
        (self.run)(bag, site)
    }

    /// Whether this step is part of the exception-handling tail.
    fn consumes_exception(&self) -> bool {
        self.requires.contains(&SlotId::Exception)
    }
}

/// An ordered list of steps plus the executor walking them.
pub struct Chain {
    steps: Vec<Step>,
}

impl Chain {
    pub fn new(steps: Vec<Step>) -> Self {
        Self { steps }
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run the chain over `bag`, returning the canonical response.
    pub fn run(&self, mut bag: StateBag, site: &Site) -> Response {
        let mut i = 0;
        while i < self.steps.len() {
            let step = &self.steps[i];
            if !step.requires.iter().all(|slot| bag.has(*slot)) {
                tracing::trace!(step = step.name, "skipping step, required input absent");
                i += 1;
                continue;
            }
            tracing::trace!(step = step.name, "running step");
            match (step.run)(&mut bag, site) {
                StepFlow::Continue => i += 1,
                StepFlow::Raise(mut raise) => {
                    raise.set_whence(step.name);
                    tracing::debug!(
                        step = step.name,
                        code = raise.response.code.as_u16(),
                        "step raised a response"
                    );
                    bag.exception = Some(Exception::Response(raise));
                    i = self.jump_to_exception_consumer(i);
                }
                StepFlow::Fail(error) => {
                    tracing::debug!(step = step.name, error = %error, "step failed");
                    bag.exception = Some(Exception::App(error));
                    i = self.jump_to_exception_consumer(i);
                }
            }
        }
        // The finalization tail always produces a response; this backstop
        // only matters for chains built without it (e.g. in tests).
        bag.response
            .unwrap_or_else(|| Response::with_code(StatusCode::INTERNAL_SERVER_ERROR))
    }

    /// Index of the first step after `from` that consumes the exception
    /// slot, or the end of the chain.
    fn jump_to_exception_consumer(&self, from: usize) -> usize {
        self.steps[from + 1..]
            .iter()
            .position(Step::consumes_exception)
            .map(|offset| from + 1 + offset)
            .unwrap_or(self.steps.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;
    use crate::http::request::Request;
    use crate::http::response::Body;
    use http::{HeaderMap, Method, Version};

    fn site() -> Site {
        Site::new(SiteConfig::default())
    }

    fn bag() -> StateBag {
        let request = Request::new(
            Method::GET,
            "/".parse().unwrap(),
            Version::HTTP_11,
            HeaderMap::new(),
            "127.0.0.1".parse().unwrap(),
        );
        let mut bag = StateBag::new(request);
        bag.response = Some(Response::new());
        bag
    }

    #[test]
    fn steps_run_in_registration_order() {
        let chain = Chain::new(vec![
            Step::new("first", &[SlotId::Response], |bag, _| {
                bag.response.as_mut().unwrap().body = Body::Text("a".into());
                StepFlow::Continue
            }),
            Step::new("second", &[SlotId::Response], |bag, _| {
                if let Some(Body::Text(text)) = bag.response.as_mut().map(|r| &mut r.body) {
                    text.push('b');
                }
                StepFlow::Continue
            }),
        ]);
        let response = chain.run(bag(), &site());
        assert_eq!(response.body, Body::Text("ab".into()));
    }

    #[test]
    fn step_with_absent_required_slot_is_skipped() {
        let chain = Chain::new(vec![
            Step::new("needs_user", &[SlotId::User], |bag, _| {
                bag.response.as_mut().unwrap().body = Body::Text("ran".into());
                StepFlow::Continue
            }),
            Step::new("always", &[SlotId::Response], |bag, _| {
                bag.response.as_mut().unwrap().code = StatusCode::ACCEPTED;
                StepFlow::Continue
            }),
        ]);
        let response = chain.run(bag(), &site());
        // The user slot was never seeded, so the first step did not run.
        assert_eq!(response.body, Body::Empty);
        assert_eq!(response.code, StatusCode::ACCEPTED);
    }

    #[test]
    fn raise_jumps_to_first_exception_consumer() {
        let chain = Chain::new(vec![
            Step::new("raiser", &[], |_, _| {
                StepFlow::Raise(Raise::error(StatusCode::FORBIDDEN, "no"))
            }),
            Step::new("skipped", &[], |bag, _| {
                bag.response.as_mut().unwrap().body = Body::Text("must not run".into());
                StepFlow::Continue
            }),
            Step::new("handler", &[SlotId::Exception, SlotId::Response], |bag, _| {
                if let Some(Exception::Response(raise)) = bag.exception.take() {
                    assert_eq!(raise.whence, Some("raiser"));
                    bag.response = Some(raise.response);
                }
                StepFlow::Continue
            }),
        ]);
        let response = chain.run(bag(), &site());
        assert_eq!(response.code, StatusCode::FORBIDDEN);
        assert_eq!(response.body, Body::Text("no".into()));
    }

    #[test]
    fn raise_with_no_consumer_ends_the_chain() {
        let chain = Chain::new(vec![
            Step::new("raiser", &[], |_, _| {
                StepFlow::Raise(Raise::error(StatusCode::IM_A_TEAPOT, "tea"))
            }),
            Step::new("after", &[], |bag, _| {
                bag.response.as_mut().unwrap().code = StatusCode::BAD_GATEWAY;
                StepFlow::Continue
            }),
        ]);
        let response = chain.run(bag(), &site());
        // No consumer: the remaining steps never run, prior response wins.
        assert_eq!(response.code, StatusCode::OK);
    }

    #[test]
    fn missing_response_gets_a_500_backstop() {
        let chain = Chain::new(vec![]);
        let request = Request::new(
            Method::GET,
            "/".parse().unwrap(),
            Version::HTTP_11,
            HeaderMap::new(),
            "127.0.0.1".parse().unwrap(),
        );
        let response = chain.run(StateBag::new(request), &site());
        assert_eq!(response.code, StatusCode::INTERNAL_SERVER_ERROR);
    }
}

//! Content-Disposition handling for the `save_as` query parameter.
//!
//! Tells the browser the response is meant to be saved into a file, per
//! RFC 6266 and RFC 8187.

use http::header::CONTENT_DISPOSITION;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use crate::chain::{SlotId, Step, StepFlow};

/// Everything outside RFC 8187 attr-char gets percent-encoded.
const NON_ATTR_CHARS: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'!')
    .remove(b'#')
    .remove(b'$')
    .remove(b'&')
    .remove(b'+')
    .remove(b'-')
    .remove(b'.')
    .remove(b'^')
    .remove(b'_')
    .remove(b'`')
    .remove(b'|')
    .remove(b'~');

pub fn add_content_disposition_header() -> Step {
    Step::new(
        "add_content_disposition_header",
        &[SlotId::Request, SlotId::Response],
        |bag, _| {
            let Some(request) = bag.request.as_ref() else {
                return StepFlow::Continue;
            };
            let Some(response) = bag.response.as_mut() else {
                return StepFlow::Continue;
            };
            if let Some(save_as) = request.query_param("save_as").filter(|v| !v.is_empty()) {
                let filename = utf8_percent_encode(&save_as, NON_ATTR_CHARS).to_string();
                response.set_header(
                    CONTENT_DISPOSITION,
                    &format!("attachment; filename*=UTF-8''{filename}"),
                );
            }
            StepFlow::Continue
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::StateBag;
    use crate::config::SiteConfig;
    use crate::http::request::Request;
    use crate::http::response::Response;
    use crate::site::Site;
    use http::{HeaderMap, Method, Version};

    fn run(target: &str) -> Option<String> {
        let request = Request::new(
            Method::GET,
            target.parse().unwrap(),
            Version::HTTP_11,
            HeaderMap::new(),
            "127.0.0.1".parse().unwrap(),
        );
        let mut bag = StateBag::new(request);
        bag.response = Some(Response::new());
        let site = Site::new(SiteConfig::default());
        let step = add_content_disposition_header();
        assert!(matches!(step.invoke(&mut bag, &site), StepFlow::Continue));
        bag.response
            .unwrap()
            .header_str("content-disposition")
            .map(str::to_owned)
    }

    #[test]
    fn plain_filename_is_passed_through() {
        assert_eq!(
            run("/report?save_as=report.csv").as_deref(),
            Some("attachment; filename*=UTF-8''report.csv")
        );
    }

    #[test]
    fn non_ascii_filename_is_percent_encoded() {
        assert_eq!(
            run("/report?save_as=r%C3%A9sum%C3%A9.pdf").as_deref(),
            Some("attachment; filename*=UTF-8''r%C3%A9sum%C3%A9.pdf")
        );
    }

    #[test]
    fn absent_parameter_leaves_headers_alone() {
        assert_eq!(run("/report"), None);
    }

    #[test]
    fn header_delimiters_are_encoded() {
        assert_eq!(
            run("/report?save_as=a%20b%22c").as_deref(),
            Some("attachment; filename*=UTF-8''a%20b%22c")
        );
    }
}

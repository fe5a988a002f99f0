//! Header preparation applied to every request before it is sent.
//!
//! The steps run in a fixed order over the header collection:
//! 1. configuration headers, then the request's own headers
//! 2. `User-Agent`, when the request asks for it
//! 3. `Authorization`, when the provider yields a non-empty value

use crate::{ClientConfig, Headers, Request};

/// `User-Agent` header name.
pub const USER_AGENT: &str = "User-Agent";
/// `Authorization` header name.
pub const AUTHORIZATION: &str = "Authorization";

type Step = fn(&ClientConfig, &Request, Headers) -> Headers;

const STEPS: [Step; 3] = [merge_headers, add_user_agent, add_authorization];

fn merge_headers(config: &ClientConfig, request: &Request, _: Headers) -> Headers {
    let mut headers = config.request_headers.clone();
    headers.merge(request.headers());
    headers
}

fn add_user_agent(config: &ClientConfig, request: &Request, mut headers: Headers) -> Headers {
    if request.options().add_user_agent {
        headers.add_value(USER_AGENT, config.user_agent.clone());
    }
    headers
}

fn add_authorization(_: &ClientConfig, request: &Request, mut headers: Headers) -> Headers {
    let credential = request
        .options()
        .authorization_provider
        .as_ref()
        .and_then(|provider| provider(request.url()))
        .filter(|value| !value.is_empty());
    if let Some(value) = credential {
        headers.add_value(AUTHORIZATION, value);
    }
    headers
}

/// Build the request actually handed to the transport.
#[must_use]
pub fn prepare(config: &ClientConfig, request: Request) -> Request {
    let headers = STEPS
        .iter()
        .fold(Headers::new(), |headers, step| step(config, &request, headers));
    let mut request = request;
    *request.headers_mut() = headers;
    request
}

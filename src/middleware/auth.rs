//! Bearer-token authentication.

use http::StatusCode;
use tracing::debug;

use super::{Context, Middleware};
use crate::handler::HandlerResult;
use crate::request::Request;
use crate::response::Response;

/// The token [`BearerAuth`] accepted, stored in the request extensions for
/// later units and the handler.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BearerToken(pub String);

/// Rejects requests without an acceptable `Authorization: Bearer <token>`
/// header with `401 Unauthorized`.
///
/// Token checking is delegated to the predicate, which is called once per
/// request on the blocking worker serving it.
///
/// ```rust
/// use pathwise::middleware::auth::BearerAuth;
///
/// let auth = BearerAuth::new(|token| token == "s3cret").realm("admin");
/// ```
pub struct BearerAuth<F> {
    validate: F,
    realm: String,
}

impl<F> BearerAuth<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    pub fn new(validate: F) -> Self {
        Self { validate, realm: "api".to_owned() }
    }

    /// Realm advertised in the `www-authenticate` challenge.
    pub fn realm(mut self, realm: impl Into<String>) -> Self {
        self.realm = realm.into();
        self
    }
}

fn bearer_token(req: &Request) -> Option<&str> {
    let (scheme, token) = req.header("authorization")?.split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

impl<F> Middleware for BearerAuth<F>
where
    F: Fn(&str) -> bool + Send + Sync + 'static,
{
    fn invoke(&self, req: &mut Request, res: &mut Response, cx: &mut Context<'_>) -> HandlerResult {
        let accepted = bearer_token(req)
            .filter(|token| (self.validate)(*token))
            .map(str::to_owned);

        let Some(token) = accepted else {
            debug!(path = req.path(), "rejecting request without a valid bearer token");
            res.set_status(StatusCode::UNAUTHORIZED)
                .set_header("www-authenticate", &format!("Bearer realm=\"{}\"", self.realm))
                .text("unauthorized");
            return Ok(());
        };

        req.extensions_mut().insert(BearerToken(token));
        cx.next(req, res)
    }

    fn name(&self) -> &'static str {
        "bearer_auth"
    }
}

#[cfg(test)]
mod tests {
    use http::Method;

    use super::*;
    use crate::handler::AppContext;
    use crate::middleware::Chain;

    fn handler(req: &mut Request, res: &mut Response, _: Option<&AppContext>) -> HandlerResult {
        let token = req.extensions().get::<BearerToken>().map(|t| t.0.clone()).unwrap_or_default();
        res.text(format!("hello {token}"));
        Ok(())
    }

    fn chain() -> Chain {
        Chain::new().with(BearerAuth::new(|token| token == "good").realm("test"))
    }

    #[test]
    fn valid_token_passes_and_is_stored() {
        let mut req = Request::new(Method::GET, "/me").with_header("Authorization", "bearer good");
        let mut res = Response::new();
        chain().execute(&mut req, &mut res, &handler).unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.body(), b"hello good");
    }

    #[test]
    fn missing_or_wrong_token_is_rejected() {
        for header in [None, Some("Bearer bad"), Some("Basic good"), Some("Bearer ")] {
            let mut req = Request::new(Method::GET, "/me");
            if let Some(value) = header {
                req = req.with_header("authorization", value);
            }
            let mut res = Response::new();
            chain().execute(&mut req, &mut res, &handler).unwrap();
            assert_eq!(res.status(), StatusCode::UNAUTHORIZED, "header {header:?}");
            assert_eq!(res.header("www-authenticate"), Some("Bearer realm=\"test\""));
        }
    }
}

//! Learner identity extractor
//!
//! Token validation happens upstream; the gateway forwards the
//! authenticated learner id in a header.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use dwell_util::UserId;

use super::ApiError;

/// Header carrying the authenticated learner id
pub const LEARNER_HEADER: &str = "x-learner-id";

/// The authenticated learner making the request
#[derive(Debug, Clone, Copy)]
pub struct Learner(pub UserId);

#[async_trait]
impl<S> FromRequestParts<S> for Learner
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(LEARNER_HEADER)
            .ok_or_else(|| ApiError::Unauthenticated("missing learner identity".into()))?;

        let user_id = value
            .to_str()
            .ok()
            .and_then(|s| s.parse::<UserId>().ok())
            .ok_or_else(|| ApiError::Unauthenticated("malformed learner identity".into()))?;

        Ok(Learner(user_id))
    }
}

use axum::{
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use returnflow_core::{TenantId, UserId};

use crate::context::{ActorContext, TenantContext};

/// Header carrying the merchant account id on dashboard routes.
pub const MERCHANT_HEADER: &str = "x-merchant-id";
/// Optional header naming the acting user within the merchant account.
pub const MERCHANT_USER_HEADER: &str = "x-merchant-user";

/// Resolve the tenant (and optional acting user) from request headers.
///
/// Merchant routes cannot run without a tenant; a missing or malformed
/// `x-merchant-id` is a 401.
pub async fn merchant_middleware(
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let tenant_id = extract_id::<TenantId>(req.headers(), MERCHANT_HEADER)?
        .ok_or(StatusCode::UNAUTHORIZED)?;
    let user_id = extract_id::<UserId>(req.headers(), MERCHANT_USER_HEADER)?;

    req.extensions_mut().insert(TenantContext::new(tenant_id));
    req.extensions_mut().insert(ActorContext::new(user_id));

    Ok(next.run(req).await)
}

fn extract_id<T: std::str::FromStr>(
    headers: &HeaderMap,
    name: &str,
) -> Result<Option<T>, StatusCode> {
    let Some(value) = headers.get(name) else {
        return Ok(None);
    };
    let value = value.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;
    value
        .trim()
        .parse()
        .map(Some)
        .map_err(|_| StatusCode::UNAUTHORIZED)
}

//! Security response headers and ordered header merging.
//!
//! # Design Decisions
//! - The security header set is fixed and independent of the request
//! - Merges are applied in a defined order; the security set is always
//!   applied last so nothing upstream-derived can override it

use axum::http::{
    header::{self, HeaderMap, HeaderValue},
    HeaderName,
};

/// `x-content-type-options` value.
pub const CONTENT_TYPE_OPTIONS: &str = "nosniff";

/// `referrer-policy` value.
pub const REFERRER_POLICY: &str = "strict-origin-when-cross-origin";

/// The fixed set of security headers attached to proxied responses.
pub fn security_headers() -> HeaderMap {
    let mut headers = HeaderMap::with_capacity(2);
    headers.insert(
        header::X_CONTENT_TYPE_OPTIONS,
        HeaderValue::from_static(CONTENT_TYPE_OPTIONS),
    );
    headers.insert(
        header::REFERRER_POLICY,
        HeaderValue::from_static(REFERRER_POLICY),
    );
    headers
}

/// Merge `layers` into `target` in order.
///
/// For every header name present in a layer, all existing values in
/// `target` are replaced by that layer's values. Later layers therefore
/// override earlier ones.
pub fn merge_headers<I>(target: &mut HeaderMap, layers: I)
where
    I: IntoIterator<Item = HeaderMap>,
{
    for layer in layers {
        let mut current: Option<HeaderName> = None;
        for (name, value) in layer {
            match name {
                Some(name) => {
                    target.insert(name.clone(), value);
                    current = Some(name);
                }
                None => {
                    if let Some(name) = &current {
                        target.append(name.clone(), value);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn security_set_is_fixed() {
        let headers = security_headers();
        assert_eq!(headers.len(), 2);
        assert_eq!(headers[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(
            headers[header::REFERRER_POLICY],
            "strict-origin-when-cross-origin"
        );
    }

    #[test]
    fn later_layers_override_earlier() {
        let mut base = HeaderMap::new();
        base.insert(header::REFERRER_POLICY, HeaderValue::from_static("unsafe-url"));
        base.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html"));

        let mut route = HeaderMap::new();
        route.insert(
            header::CONTENT_TYPE,
            HeaderValue::from_static("application/javascript; charset=utf-8"),
        );

        merge_headers(&mut base, [route, security_headers()]);

        assert_eq!(base[header::CONTENT_TYPE], "application/javascript; charset=utf-8");
        assert_eq!(base[header::REFERRER_POLICY], "strict-origin-when-cross-origin");
        assert_eq!(base.get_all(header::REFERRER_POLICY).iter().count(), 1);
    }

    #[test]
    fn multi_valued_layer_is_kept_whole() {
        let mut target = HeaderMap::new();
        target.insert(header::VARY, HeaderValue::from_static("Accept"));

        let mut layer = HeaderMap::new();
        layer.append(header::VARY, HeaderValue::from_static("Origin"));
        layer.append(header::VARY, HeaderValue::from_static("Accept-Encoding"));

        merge_headers(&mut target, [layer]);

        let values: Vec<_> = target.get_all(header::VARY).iter().collect();
        assert_eq!(values, ["Origin", "Accept-Encoding"]);
    }
}

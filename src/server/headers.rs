use axum::http::{HeaderMap, HeaderName, HeaderValue, header};

/// Inbound headers that may reach the classification upstream.
pub const FORWARDED_REQUEST_HEADERS: [HeaderName; 5] = [
    header::AUTHORIZATION,
    header::CONTENT_TYPE,
    header::ACCEPT,
    header::USER_AGENT,
    header::COOKIE,
];

pub const HOP_BY_HOP_HEADERS: [&str; 8] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailers",
    "transfer-encoding",
    "upgrade",
];

/// Framing headers that no longer describe the body once it has been re-streamed.
pub const BODY_FRAMING_HEADERS: [HeaderName; 3] = [
    header::CONTENT_ENCODING,
    header::CONTENT_LENGTH,
    header::CONTENT_RANGE,
];

/// Keeps only the allow-listed request headers and pins `accept-encoding: identity`
/// so the upstream never answers with a compressed body.
pub fn filter_forward_headers(incoming: &HeaderMap) -> HeaderMap {
    let mut out = HeaderMap::new();
    for name in FORWARDED_REQUEST_HEADERS.iter() {
        for v in incoming.get_all(name).iter().filter(|v| !v.is_empty()) {
            out.append(name.clone(), v.clone());
        }
    }
    out.insert(header::ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    out
}

pub fn strip_hop_by_hop_headers(headers: &mut HeaderMap) {
    for name in HOP_BY_HOP_HEADERS {
        headers.remove(name);
    }
}

/// Response headers safe to relay to the caller.
pub fn sanitize_response_headers(upstream: &HeaderMap) -> HeaderMap {
    let mut out = upstream.clone();
    strip_hop_by_hop_headers(&mut out);
    for name in BODY_FRAMING_HEADERS.iter() {
        out.remove(name);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(pairs: &[(&'static str, &'static str)]) -> HeaderMap {
        let mut h = HeaderMap::new();
        for (k, v) in pairs {
            h.append(*k, HeaderValue::from_static(v));
        }
        h
    }

    #[test]
    fn forwards_only_allow_listed_headers() {
        let incoming = headers(&[
            ("authorization", "Bearer abc"),
            ("content-type", "application/json"),
            ("accept", "*/*"),
            ("user-agent", "curl/8"),
            ("cookie", "sid=1"),
            ("host", "localhost:3000"),
            ("x-forwarded-for", "10.0.0.1"),
            ("accept-encoding", "gzip, br"),
            ("connection", "keep-alive"),
        ]);
        let out = filter_forward_headers(&incoming);

        assert_eq!(out.len(), 6);
        assert_eq!(out["authorization"], "Bearer abc");
        assert_eq!(out["cookie"], "sid=1");
        assert_eq!(out["accept-encoding"], "identity");
        assert!(out.get("host").is_none());
        assert!(out.get("x-forwarded-for").is_none());
    }

    #[test]
    fn forwarded_set_is_a_subset_of_the_allow_list() {
        let allowed = [
            "authorization",
            "content-type",
            "accept",
            "user-agent",
            "cookie",
            "accept-encoding",
        ];
        for incoming in [
            HeaderMap::new(),
            headers(&[("x-api-key", "k"), ("origin", "https://a")]),
            headers(&[("accept", "application/json"), ("te", "trailers")]),
        ] {
            let out = filter_forward_headers(&incoming);
            assert!(out.keys().all(|k| allowed.contains(&k.as_str())));
            assert_eq!(out["accept-encoding"], "identity");
        }
    }

    #[test]
    fn repeated_cookie_fields_are_all_forwarded() {
        let incoming = headers(&[
            ("cookie", "sid=1"),
            ("cookie", "csrf=2"),
            ("cookie", ""),
            ("x-trace", "t"),
        ]);
        let out = filter_forward_headers(&incoming);
        let cookies: Vec<_> = out.get_all("cookie").iter().collect();
        assert_eq!(cookies, ["sid=1", "csrf=2"]);
    }

    #[test]
    fn filtering_is_idempotent() {
        let incoming = headers(&[("accept", "text/plain"), ("referer", "https://x")]);
        let once = filter_forward_headers(&incoming);
        assert_eq!(filter_forward_headers(&once), once);
    }

    #[test]
    fn response_headers_lose_hop_by_hop_and_framing() {
        let upstream = headers(&[
            ("content-type", "application/json"),
            ("content-length", "42"),
            ("content-encoding", "gzip"),
            ("content-range", "bytes 0-41/42"),
            ("connection", "close"),
            ("keep-alive", "timeout=5"),
            ("transfer-encoding", "chunked"),
            ("upgrade", "h2c"),
            ("proxy-authenticate", "Basic"),
            ("x-request-id", "r1"),
            ("set-cookie", "a=1"),
            ("set-cookie", "b=2"),
        ]);
        let out = sanitize_response_headers(&upstream);

        for name in HOP_BY_HOP_HEADERS {
            assert!(out.get(name).is_none(), "{} leaked", name);
        }
        for name in BODY_FRAMING_HEADERS.iter() {
            assert!(out.get(name).is_none(), "{} leaked", name);
        }
        assert_eq!(out["content-type"], "application/json");
        assert_eq!(out["x-request-id"], "r1");
        assert_eq!(out.get_all("set-cookie").iter().count(), 2);
    }
}

use std::net::IpAddr;
use std::time::Duration;

use reqwest::ClientBuilder;

use crate::config::Settings;

fn has_proxy_env() -> bool {
    [
        "HTTPS_PROXY",
        "https_proxy",
        "HTTP_PROXY",
        "http_proxy",
        "ALL_PROXY",
        "all_proxy",
    ]
    .iter()
    .any(|k| std::env::var(k).is_ok_and(|v| !v.trim().is_empty()))
}

fn is_loopback_url(url: &str) -> bool {
    let Ok(u) = reqwest::Url::parse(url) else {
        return false;
    };
    let Some(host) = u.host_str() else {
        return false;
    };
    let host = host.trim_start_matches('[').trim_end_matches(']');
    if let Ok(ip) = host.parse::<IpAddr>() {
        return ip.is_loopback();
    }
    let d = host.trim_end_matches('.').to_ascii_lowercase();
    d == "localhost" || d.ends_with(".localhost")
}

fn should_bypass_proxy_impl(urls: &[&str], proxy_env_present: bool) -> bool {
    proxy_env_present && urls.iter().any(|u| is_loopback_url(u))
}

/// A model server on the same host must not be routed through an outbound proxy.
pub fn maybe_disable_proxy(builder: ClientBuilder, urls: &[&str]) -> ClientBuilder {
    if should_bypass_proxy_impl(urls, has_proxy_env()) {
        tracing::info!("Loopback upstream detected; bypassing proxy environment");
        builder.no_proxy()
    } else {
        builder
    }
}

/// Builds the one outbound client shared by all handlers.
pub fn upstream_client(settings: &Settings) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder();
    if let Some(secs) = settings.http.connect_timeout_secs {
        builder = builder.connect_timeout(Duration::from_secs(secs));
    }
    let mut urls = vec![settings.classify.url.as_str()];
    if let Some(base) = settings.gateway.base_url.as_deref() {
        urls.push(base);
    }
    maybe_disable_proxy(builder, &urls).build()
}

use reqwest::{redirect::Policy, Client, Proxy};
use std::time::Duration;

use crate::error::{Result, WayfarerError};

/// Build a reqwest client routed through `proxy` when one is given.
///
/// Proxies are written `user:pass@host:port`; a scheme is added when missing.
pub fn build_http_client(proxy: Option<&str>, timeout: Duration) -> Result<Client> {
    let mut builder = Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .redirect(Policy::limited(5));

    if let Some(proxy) = proxy.map(str::trim).filter(|p| !p.is_empty()) {
        let url = if proxy.contains("://") {
            proxy.to_string()
        } else {
            format!("http://{}", proxy)
        };
        let proxy = Proxy::all(&url)
            .map_err(|e| WayfarerError::Configuration(format!("Invalid proxy {}: {}", url, e)))?;
        builder = builder.proxy(proxy);
    }

    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_direct_and_proxied_clients() {
        let timeout = Duration::from_secs(5);
        assert!(build_http_client(None, timeout).is_ok());
        assert!(build_http_client(Some("user:pass@127.0.0.1:8080"), timeout).is_ok());
    }
}

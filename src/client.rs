use std::env;
use std::time::Duration;

use reqwest::blocking::ClientBuilder;
use reqwest::Proxy;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

pub fn get_proxied_client_builder() -> ClientBuilder {
    let mut cb = ClientBuilder::new();

    trace!("get_proxied_client_builder.http_proxy.before_check");
    if let Ok(http_proxy) = env::var("http_proxy") {
        match Proxy::http(&http_proxy) {
            Ok(proxy) => cb = cb.proxy(proxy),
            Err(e) => warn!("ignoring http_proxy {}: {}", http_proxy, e),
        }
    }

    trace!("get_proxied_client_builder.https_proxy.before_check");
    if let Ok(https_proxy) = env::var("https_proxy") {
        match Proxy::https(&https_proxy) {
            Ok(proxy) => cb = cb.proxy(proxy),
            Err(e) => warn!("ignoring https_proxy {}: {}", https_proxy, e),
        }
    }

    trace!("get_proxied_client_builder.done");
    cb
}

use std::net::IpAddr;

use async_trait::async_trait;

use crate::prelude::*;
use crate::utils::config::GeoConfig;

pub const LOCALHOST: &str = "Localhost (Development)";
pub const UNAVAILABLE: &str = "Location unavailable";

/// Maps a client IP to a human readable `City, Region, Country`.
#[async_trait]
pub trait GeoLocator: Send + Sync {
    async fn locate(&self, ip: &str) -> Result<String>;
}

/// Client for the ip-api.com JSON endpoint.
pub struct IpApi {
    url: String,
    http: reqwest::Client,
}

impl IpApi {
    pub fn new(config: &GeoConfig) -> Result<Self> {
        Ok(Self {
            url: config.url.trim_end_matches('/').to_string(),
            http: reqwest::Client::builder().timeout(Duration::from_secs(config.timeout_secs)).build()?,
        })
    }
}

#[async_trait]
impl GeoLocator for IpApi {
    async fn locate(&self, ip: &str) -> Result<String> {
        #[derive(serde::Deserialize, Debug)]
        #[serde(rename_all = "camelCase")]
        struct Response {
            status: String,
            message: Option<String>,
            city: Option<String>,
            region_name: Option<String>,
            country: Option<String>,
        }

        let res: Response = self
            .http
            .get(format!("{}/{ip}", self.url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if res.status != "success" {
            anyhow::bail!("lookup of ip={ip} failed: {}", res.message.as_deref().unwrap_or(&res.status));
        }

        let parts = [res.city, res.region_name, res.country];
        Ok(parts.into_iter().flatten().filter(|p| !p.is_empty()).collect::<Vec<_>>().join(", "))
    }
}

/// Best-effort location of a client, never failing.
///
/// Only well-formed addresses are looked up, and loopback addresses never are.
pub async fn resolve_location(locator: &dyn GeoLocator, ip: Option<&str>) -> String {
    let Some(ip) = ip else {
        return UNAVAILABLE.into();
    };
    let addr = match ip.parse::<IpAddr>() {
        Ok(addr) => addr,
        Err(_) if ip == "localhost" => return LOCALHOST.into(),
        Err(_) => {
            tracing::warn!("Skipping geolocation of malformed ip={ip:?}");
            return UNAVAILABLE.into();
        }
    };
    if addr.is_loopback() {
        return LOCALHOST.into();
    }
    match locator.locate(&addr.to_string()).await {
        Ok(location) => location,
        Err(e) => {
            tracing::warn!("Geolocation failed for ip={addr}: {e:#}");
            UNAVAILABLE.into()
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Mutex;

    use super::*;

    /// Records every lookup and answers with a fixed result.
    #[derive(Default)]
    pub struct FakeLocator {
        pub lookups: Mutex<Vec<String>>,
        pub fail: bool,
    }

    #[async_trait]
    impl GeoLocator for FakeLocator {
        async fn locate(&self, ip: &str) -> Result<String> {
            self.lookups.lock().unwrap().push(ip.to_string());
            if self.fail {
                anyhow::bail!("connection refused");
            }
            Ok("Pune, Maharashtra, India".into())
        }
    }

    #[tokio::test]
    async fn loopback_skips_lookup() {
        let geo = FakeLocator::default();
        assert_eq!(resolve_location(&geo, Some("127.0.0.1")).await, LOCALHOST);
        assert_eq!(resolve_location(&geo, Some("::1")).await, LOCALHOST);
        assert!(geo.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn remote_ip_is_looked_up() {
        let geo = FakeLocator::default();
        assert_eq!(resolve_location(&geo, Some("203.0.113.7")).await, "Pune, Maharashtra, India");
        assert_eq!(*geo.lookups.lock().unwrap(), vec!["203.0.113.7".to_string()]);
    }

    #[tokio::test]
    async fn failures_become_unavailable() {
        let geo = FakeLocator { fail: true, ..Default::default() };
        assert_eq!(resolve_location(&geo, Some("203.0.113.7")).await, UNAVAILABLE);
    }

    #[tokio::test]
    async fn unknown_ip_is_unavailable() {
        let geo = FakeLocator::default();
        assert_eq!(resolve_location(&geo, None).await, UNAVAILABLE);
        assert!(geo.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_ip_skips_lookup() {
        let geo = FakeLocator::default();
        for ip in ["../../evil?x=", "203.0.113.7/../batch", "unknown", ""] {
            assert_eq!(resolve_location(&geo, Some(ip)).await, UNAVAILABLE, "{ip}");
        }
        assert_eq!(resolve_location(&geo, Some("localhost")).await, LOCALHOST);
        assert!(geo.lookups.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn ip_api_unreachable_is_an_error() {
        // Nothing listens on the discard port
        let config = GeoConfig { url: "http://127.0.0.1:9/json/".into(), timeout_secs: 1 };
        let geo = IpApi::new(&config).unwrap();
        assert!(geo.locate("203.0.113.7").await.is_err());
    }
}

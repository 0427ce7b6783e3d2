//! Ambient environment accessors — the collaborator interface the composer
//! reads route path, referrer, and user agent from.

use beacon_core::BeaconResult;
use tokio::sync::watch;

/// One consistent read of the ambient context, taken per tracking call.
/// `None` fields mean the capability is unavailable in the hosting
/// environment; the composer falls back to empty strings and an unknown
/// device class.
#[derive(Debug, Clone, Default)]
pub struct EnvSnapshot {
    pub path: Option<String>,
    pub referrer: Option<String>,
    pub user_agent: Option<String>,
}

/// Source of ambient context. A failing accessor surfaces as a composition
/// error on the error sink; the event in flight is dropped.
pub trait Environment: Send + Sync {
    fn snapshot(&self) -> BeaconResult<EnvSnapshot>;
}

/// Fixed ambient context, for CLI use, tests, and headless hosts. The
/// default value is a fully detached environment.
#[derive(Debug, Clone, Default)]
pub struct StaticEnvironment {
    path: Option<String>,
    referrer: Option<String>,
    user_agent: Option<String>,
}

impl StaticEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

impl Environment for StaticEnvironment {
    fn snapshot(&self) -> BeaconResult<EnvSnapshot> {
        Ok(EnvSnapshot {
            path: self.path.clone(),
            referrer: self.referrer.clone(),
            user_agent: self.user_agent.clone(),
        })
    }
}

/// Ambient context whose path tracks a live route signal.
pub struct RouteEnvironment {
    routes: watch::Receiver<String>,
    referrer: Option<String>,
    user_agent: Option<String>,
}

impl RouteEnvironment {
    pub fn new(routes: watch::Receiver<String>) -> Self {
        Self {
            routes,
            referrer: None,
            user_agent: None,
        }
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.referrer = Some(referrer.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }
}

impl Environment for RouteEnvironment {
    fn snapshot(&self) -> BeaconResult<EnvSnapshot> {
        Ok(EnvSnapshot {
            path: Some(self.routes.borrow().clone()),
            referrer: self.referrer.clone(),
            user_agent: self.user_agent.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_static_environment() {
        let env = StaticEnvironment::new()
            .with_path("/cart")
            .with_user_agent("Mozilla/5.0");

        let snapshot = env.snapshot().unwrap();
        assert_eq!(snapshot.path.as_deref(), Some("/cart"));
        assert_eq!(snapshot.referrer, None);
        assert_eq!(snapshot.user_agent.as_deref(), Some("Mozilla/5.0"));
    }

    #[test]
    fn test_detached_environment() {
        let snapshot = StaticEnvironment::default().snapshot().unwrap();
        assert_eq!(snapshot.path, None);
        assert_eq!(snapshot.referrer, None);
        assert_eq!(snapshot.user_agent, None);
    }

    #[tokio::test]
    async fn test_route_environment_tracks_signal() {
        let (tx, rx) = watch::channel("/".to_string());
        let env = RouteEnvironment::new(rx).with_referrer("https://example.com");

        assert_eq!(env.snapshot().unwrap().path.as_deref(), Some("/"));

        tx.send("/checkout".to_string()).unwrap();
        let snapshot = env.snapshot().unwrap();
        assert_eq!(snapshot.path.as_deref(), Some("/checkout"));
        assert_eq!(snapshot.referrer.as_deref(), Some("https://example.com"));
    }
}

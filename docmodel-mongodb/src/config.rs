//! Client configuration for the MongoDB driver.

use std::time::Duration;
use mongodb::options::ClientOptions;

/// Pool and timeout settings applied on top of the options parsed from the
/// connection string. `None` leaves the driver's (or the URL's) value in place,
/// and every field defaults to `None`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MongoClientConfig {
    /// Application name reported in server logs.
    pub app_name: Option<String>,
    pub min_pool_size: Option<u32>,
    pub max_pool_size: Option<u32>,
    /// Maximum time a pooled connection may stay idle before it is closed.
    pub max_idle_time: Option<Duration>,
    pub connect_timeout: Option<Duration>,
    pub server_selection_timeout: Option<Duration>,
}

impl MongoClientConfig {
    pub fn builder() -> MongoClientConfigBuilder {
        MongoClientConfigBuilder::default()
    }

    /// Overrides the fields of `options` that this configuration sets.
    pub fn apply(&self, options: &mut ClientOptions) {
        if let Some(app) = &self.app_name {
            options.app_name = Some(app.clone());
        }
        if let Some(min) = self.min_pool_size {
            options.min_pool_size = Some(min);
        }
        if let Some(max) = self.max_pool_size {
            options.max_pool_size = Some(max);
        }
        if let Some(idle) = self.max_idle_time {
            options.max_idle_time = Some(idle);
        }
        if let Some(connect) = self.connect_timeout {
            options.connect_timeout = Some(connect);
        }
        if let Some(server_selection) = self.server_selection_timeout {
            options.server_selection_timeout = Some(server_selection);
        }
    }
}

/// Builder for [`MongoClientConfig`], starting with nothing set.
///
/// # Example
///
/// ```ignore
/// use docmodel_mongodb::MongoClientConfig;
/// use std::time::Duration;
///
/// let config = MongoClientConfig::builder()
///     .app_name("billing")
///     .max_pool_size(50)
///     .server_selection_timeout(Duration::from_secs(5))
///     .build();
/// ```
#[derive(Debug, Default)]
pub struct MongoClientConfigBuilder {
    config: MongoClientConfig,
}

impl MongoClientConfigBuilder {
    pub fn app_name(mut self, app_name: impl Into<String>) -> Self {
        self.config.app_name = Some(app_name.into());
        self
    }

    pub fn min_pool_size(mut self, size: u32) -> Self {
        self.config.min_pool_size = Some(size);
        self
    }

    pub fn max_pool_size(mut self, size: u32) -> Self {
        self.config.max_pool_size = Some(size);
        self
    }

    pub fn max_idle_time(mut self, idle: Duration) -> Self {
        self.config.max_idle_time = Some(idle);
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = Some(timeout);
        self
    }

    pub fn server_selection_timeout(mut self, timeout: Duration) -> Self {
        self.config.server_selection_timeout = Some(timeout);
        self
    }

    pub fn build(self) -> MongoClientConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_set_nothing() {
        assert_eq!(
            MongoClientConfig::default(),
            MongoClientConfig {
                app_name: None,
                min_pool_size: None,
                max_pool_size: None,
                max_idle_time: None,
                connect_timeout: None,
                server_selection_timeout: None,
            }
        );
    }

    #[test]
    fn builder_sets_fields() {
        let config = MongoClientConfig::builder()
            .app_name("billing")
            .min_pool_size(2)
            .max_pool_size(50)
            .connect_timeout(Duration::from_secs(3))
            .build();

        assert_eq!(config.app_name.as_deref(), Some("billing"));
        assert_eq!(config.min_pool_size, Some(2));
        assert_eq!(config.max_pool_size, Some(50));
        assert_eq!(config.connect_timeout, Some(Duration::from_secs(3)));
        assert_eq!(config.server_selection_timeout, None);
    }

    #[tokio::test]
    async fn default_config_keeps_connection_string_options() {
        let mut options = ClientOptions::parse(
            "mongodb://localhost:27017/?maxPoolSize=50&appName=billing&connectTimeoutMS=2000",
        )
        .await
        .unwrap();

        MongoClientConfig::default().apply(&mut options);

        assert_eq!(options.max_pool_size, Some(50));
        assert_eq!(options.app_name.as_deref(), Some("billing"));
        assert_eq!(options.connect_timeout, Some(Duration::from_secs(2)));
    }

    #[tokio::test]
    async fn configured_fields_override_connection_string() {
        let mut options = ClientOptions::parse("mongodb://localhost:27017/?maxPoolSize=50&appName=billing")
            .await
            .unwrap();

        MongoClientConfig::builder()
            .max_pool_size(5)
            .max_idle_time(Duration::from_secs(60))
            .build()
            .apply(&mut options);

        assert_eq!(options.max_pool_size, Some(5));
        assert_eq!(options.max_idle_time, Some(Duration::from_secs(60)));
        assert_eq!(options.app_name.as_deref(), Some("billing"));
    }
}

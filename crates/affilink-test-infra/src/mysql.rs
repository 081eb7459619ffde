use crate::Result;
use testcontainers::core::{IntoContainerPort, WaitFor};
use testcontainers::runners::AsyncRunner;
use testcontainers::ImageExt;
use testcontainers::{ContainerAsync, GenericImage};
use typed_builder::TypedBuilder;

const MYSQL_PORT: u16 = 3306;

/// Credentials and image for a throwaway MySQL server.
#[derive(Debug, Clone, TypedBuilder)]
pub struct MysqlConfig {
    #[builder(default = "8.4".to_string(), setter(into))]
    image_tag: String,
    #[builder(default = "affilink".to_string(), setter(into))]
    database: String,
    #[builder(default = "affilink".to_string(), setter(into))]
    username: String,
    #[builder(default = "affilink".to_string(), setter(into))]
    password: String,
}

/// Test fixture for a disposable MySQL server.
///
/// The container is stopped when the fixture is dropped.
pub struct MySqlServer {
    container: ContainerAsync<GenericImage>,
    config: MysqlConfig,
}

impl MySqlServer {
    /// Starts a MySQL container and waits until it accepts connections.
    pub async fn new(config: MysqlConfig) -> Result<Self> {
        let container = GenericImage::new("mysql", config.image_tag.as_str())
            .with_exposed_port(MYSQL_PORT.tcp())
            .with_wait_for(WaitFor::message_on_stderr("ready for connections"))
            .with_env_var("MYSQL_DATABASE", config.database.as_str())
            .with_env_var("MYSQL_USER", config.username.as_str())
            .with_env_var("MYSQL_PASSWORD", config.password.as_str())
            .with_env_var("MYSQL_ROOT_PASSWORD", "root")
            .start()
            .await?;

        Ok(Self { container, config })
    }

    /// Returns a `mysql://` DSN for the configured user and database.
    pub async fn database_url(&self) -> Result<String> {
        let host = self.container.get_host().await?;
        let port = self.container.get_host_port_ipv4(MYSQL_PORT).await?;
        Ok(format!(
            "mysql://{}:{}@{}:{}/{}",
            self.config.username, self.config.password, host, port, self.config.database
        ))
    }
}

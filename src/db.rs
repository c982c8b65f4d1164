use sqlx::{Connection, SqliteConnection};
use thiserror::Error;

pub mod models;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("error connecting to the settings database: {0}")]
    Connection(#[from] sqlx::Error),
    #[error("failed to find default path")]
    InvalidDefaultPath,
}

pub struct Db {
    connection: SqliteConnection,
}

impl Db {
    /// Open the database given by `path`, falling back to the DATABASE_URL
    /// environment variable and then the default user configuration path.
    pub async fn try_default(path: Option<&str>) -> Result<Self, DbError> {
        let path = if let Some(path) = path {
            path.to_owned()
        } else {
            std::env::var("DATABASE_URL").or_else(|_| {
                dirs::config_dir()
                    .and_then(|path| {
                        path.join("ledvirt/ledvirt.db")
                            .to_str()
                            .map(str::to_owned)
                    })
                    .ok_or(DbError::InvalidDefaultPath)
            })?
        };

        Self::connect(&path).await
    }

    pub async fn connect(path: &str) -> Result<Self, DbError> {
        let url = if path.starts_with("sqlite:") {
            path.to_owned()
        } else {
            format!("sqlite://{}", path)
        };

        Ok(Self {
            connection: SqliteConnection::connect(&url).await?,
        })
    }
}

impl std::ops::Deref for Db {
    type Target = SqliteConnection;

    fn deref(&self) -> &Self::Target {
        &self.connection
    }
}

impl std::ops::DerefMut for Db {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.connection
    }
}

use clap::{Parser, Subcommand};
use serde::Deserialize;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "blogline", about = "A small blog with groups, comments and author feeds")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind to
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Path to data directory
    #[arg(long)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Run the web server (default)
    Serve,
    /// Create a user account
    CreateUser {
        username: String,
        #[arg(long)]
        password: String,
        /// Grant administrator rights
        #[arg(long)]
        admin: bool,
    },
    /// Create a group posts can be filed under
    CreateGroup {
        title: String,
        slug: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    /// Delete a user together with their posts, comments and follows
    DeleteUser { username: String },
    /// Delete a group; its posts stay without a group
    DeleteGroup { slug: String },
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub storage: StorageConfig,
    pub auth: AuthConfig,
    pub posts: PostsConfig,
    pub cache: CacheConfig,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StorageConfig {
    pub path: Option<PathBuf>,
    pub max_upload_mb: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct AuthConfig {
    pub cookie_name: String,
    pub session_hours: u64,
    pub bcrypt_cost: u32,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PostsConfig {
    /// Posts per listing page; shared by every paginated view.
    pub page_size: usize,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(default)]
pub struct CacheConfig {
    pub index_ttl_secs: u64,
    /// Most rendered pages kept at once; one per viewer of the home page.
    pub max_entries: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_upload_mb: 10,
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            cookie_name: "blogline_session".to_string(),
            session_hours: 336,
            bcrypt_cost: bcrypt::DEFAULT_COST,
        }
    }
}

impl Default for PostsConfig {
    fn default() -> Self {
        Self { page_size: 10 }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            index_ttl_secs: 20,
            max_entries: 1000,
        }
    }
}

impl Config {
    pub fn load(cli: &Cli) -> anyhow::Result<Self> {
        let data_dir = Self::data_dir(cli);
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| data_dir.join("config.toml"));

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Config::default()
        };

        // CLI overrides
        if let Some(ref host) = cli.host {
            config.server.host = host.clone();
        }
        if let Some(port) = cli.port {
            config.server.port = port;
        }

        config.resolve_paths(&data_dir);
        Ok(config)
    }

    /// Fill in database and upload locations that were left unset.
    pub fn resolve_paths(&mut self, data_dir: &Path) {
        if self.database.path.is_none() {
            self.database.path = Some(data_dir.join("blogline.db"));
        }
        if self.storage.path.is_none() {
            self.storage.path = Some(data_dir.join("media"));
        }
    }

    /// Defaults rooted at `data_dir`, used by tests and embedders.
    pub fn with_data_dir(data_dir: &Path) -> Self {
        let mut config = Config::default();
        config.resolve_paths(data_dir);
        config
    }

    pub fn data_dir(cli: &Cli) -> PathBuf {
        cli.data_dir.clone().unwrap_or_else(|| {
            dirs::home_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(".blogline")
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.database
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("blogline.db"))
    }

    pub fn media_path(&self) -> PathBuf {
        self.storage
            .path
            .clone()
            .unwrap_or_else(|| PathBuf::from("media"))
    }

    pub fn index_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.index_ttl_secs)
    }

    /// Page cache capacity, clamped to at least one entry.
    pub fn cache_capacity(&self) -> NonZeroUsize {
        NonZeroUsize::new(self.cache.max_entries).unwrap_or(NonZeroUsize::MIN)
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.storage.max_upload_mb * 1024 * 1024
    }
}

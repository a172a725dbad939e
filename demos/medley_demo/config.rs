//! Configuration structs for the medley demo application.
//!
//! A multi-level hierarchy exercising the full binding surface: plain
//! scalars, nested sections, a duration, an IP address, a netmask, a
//! string list, and a hex-encoded byte secret.
//!
//! # Env var mapping
//!
//! With the prefix `MEDLEY_DEMO`, environment variables map to dotted
//! keys via single-underscore separators:
//!
//! | Env var                        | Config key          |
//! |--------------------------------|---------------------|
//! | `MEDLEY_DEMO_NAME`             | `name`              |
//! | `MEDLEY_DEMO_VERBOSE`          | `verbose`           |
//! | `MEDLEY_DEMO_SERVER_BIND`      | `server.bind`       |
//! | `MEDLEY_DEMO_SERVER_PORT`      | `server.port`       |
//! | `MEDLEY_DEMO_SERVER_KEEPALIVE` | `server.keepalive`  |
//! | `MEDLEY_DEMO_DATABASE_URL`     | `database.url`      |
//! | `MEDLEY_DEMO_DATABASE_REPLICAS`| `database.replicas` |
//! | `MEDLEY_DEMO_AUTH_SECRET`      | `auth.secret`       |

use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the demo application.
#[derive(Serialize, Deserialize, Debug)]
pub struct DemoConfig {
    /// Application name shown in the echo banner.
    pub name: String,

    /// Enable verbose output.
    pub verbose: bool,

    /// Server settings, under `[server]` in TOML.
    pub server: ServerConfig,

    /// Database settings, under `[database]` in TOML.
    pub database: DbConfig,

    /// Auth settings, under `[auth]` in TOML.
    pub auth: AuthConfig,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ServerConfig {
    /// Address to bind to. Declared as `Kind::ip()` in main.rs, so flag
    /// and env input is validated as an address, not a free string.
    pub bind: IpAddr,

    /// Port number. The `u16` width is enforced at the flag boundary.
    pub port: u16,

    /// Subnet mask for allowed peers, dotted-quad form.
    pub netmask: String,

    /// Idle connection keep-alive. Accepts humantime forms like `90s`
    /// or `1h30m` from flags and env vars.
    #[serde(with = "humantime_serde")]
    pub keepalive: Duration,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct DbConfig {
    /// Primary database DSN. Bound to `--db-url` via an explicit tag.
    pub url: String,

    /// Read replicas. Repeatable flag, or one comma-separated env var.
    pub replicas: Vec<String>,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct AuthConfig {
    /// Shared secret. `Vec<u8>` binds as a hex string at flag and env
    /// boundaries (`--auth-secret deadbeef`).
    pub secret: Vec<u8>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            name: "medley-demo".to_string(),
            verbose: false,
            server: ServerConfig::default(),
            database: DbConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 3000,
            netmask: "255.255.255.0".to_string(),
            keepalive: Duration::from_secs(75),
        }
    }
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/demo".to_string(),
            replicas: Vec::new(),
        }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: vec![0xde, 0xad, 0xbe, 0xef],
        }
    }
}

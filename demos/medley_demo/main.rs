//! # medley demo application
//!
//! A sample CLI tool that showcases how to integrate
//! [medley](https://docs.rs/medley) into a real application. This is **not**
//! a real app — it exists purely to demonstrate and manually verify medley's
//! features.
//!
//! ## Running
//!
//! ```sh
//! cargo run --example medley_demo
//! cargo run --example medley_demo -- --help
//! ```
//!
//! ## Features demonstrated
//!
//! | Feature              | How to exercise it                                                    |
//! |----------------------|-----------------------------------------------------------------------|
//! | Struct defaults      | `cargo run --example medley_demo`                                     |
//! | Config file          | Create `medley-demo.toml` in cwd, then run                            |
//! | Alternate file       | `cargo run --example medley_demo -- --config other.toml`              |
//! | Env var override     | `MEDLEY_DEMO_SERVER_PORT=9999 cargo run --example medley_demo`        |
//! | Flag override        | `cargo run --example medley_demo -- --server-port 9999`               |
//! | Bool flag            | `cargo run --example medley_demo -- --verbose` (or `--verbose=false`) |
//! | Duration             | `cargo run --example medley_demo -- --server-keepalive 2m30s`         |
//! | IP address           | `cargo run --example medley_demo -- --server-bind 0.0.0.0`            |
//! | Netmask              | `cargo run --example medley_demo -- --server-netmask 255.255.0.0`     |
//! | Explicit flag name   | `cargo run --example medley_demo -- --db-url postgres://db/prod`      |
//! | Repeatable list      | `-- --database-replicas r1 --database-replicas r2,r3`                 |
//! | Hex bytes            | `cargo run --example medley_demo -- --auth-secret cafef00d`           |
//! | Width check          | `-- --server-port 70000` (rejected at the flag boundary)              |

mod config;

use std::path::Path;

use medley::{Field, Kind, Medley, MedleyError, Scalar};

use config::DemoConfig;

const CONFIG_FILE: &str = "medley-demo.toml";

fn load(config: &mut DemoConfig) -> Result<(), MedleyError> {
    let mut builder = Medley::builder(config)
        .app_name("medley-demo")
        .env_prefix("medley_demo")
        .field(
            "server.bind",
            Field::new().kind(Kind::ip()).help("address to bind to"),
        )
        .field(
            "server.netmask",
            Field::new()
                .kind(Kind::ip_mask())
                .help("subnet mask for allowed peers"),
        )
        .field(
            "server.keepalive",
            Field::new()
                .kind(Kind::duration())
                .help("idle connection keep-alive"),
        )
        .field("database.url", Field::tag("db-url,primary database DSN"))
        .field(
            "database.replicas",
            Field::new()
                .kind(Kind::List(Scalar::Str))
                .help("read replica hosts"),
        )
        .field("auth.secret", Field::new().help("shared secret, hex encoded"));

    // Only wire a default path when the file is actually there, so a fresh
    // checkout runs without one. --config still works either way.
    if Path::new(CONFIG_FILE).exists() {
        builder = builder.config_file(CONFIG_FILE);
    }

    let mut loader = builder.build()?;
    loader.load_file()
}

fn print_resolved(config: &DemoConfig) {
    let secret_hex: String = config
        .auth
        .secret
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect();

    let entries = [
        ("name", config.name.clone()),
        ("verbose", config.verbose.to_string()),
        ("server.bind", config.server.bind.to_string()),
        ("server.port", config.server.port.to_string()),
        ("server.netmask", config.server.netmask.clone()),
        (
            "server.keepalive",
            humantime::format_duration(config.server.keepalive).to_string(),
        ),
        ("database.url", config.database.url.clone()),
        ("database.replicas", config.database.replicas.join(",")),
        ("auth.secret", secret_hex),
    ];

    let max_key_len = entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
    for (key, value) in &entries {
        println!("{key:<max_key_len$}  {value}");
    }
}

fn main() {
    let mut config = DemoConfig::default();
    match load(&mut config) {
        Ok(()) => print_resolved(&config),
        // --help, --version, and bad flag values all come back through
        // clap's own rendering; let it print and pick the exit code.
        Err(MedleyError::ParseArgs(e)) => e.exit(),
        Err(e) => {
            eprintln!("Failed to load config:\n{e}");
            std::process::exit(1);
        }
    }
}

#[cfg(test)]
pub mod test {
    use std::time::Duration;

    use serde::{Deserialize, Serialize};

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct TestConfig {
        pub host: String,
        pub port: u16,
        pub debug: bool,
        pub database: DbConfig,
    }

    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct DbConfig {
        pub url: Option<String>,
        pub pool_size: u32,
        pub replicas: Vec<String>,
    }

    impl Default for TestConfig {
        fn default() -> Self {
            Self {
                host: "localhost".into(),
                port: 8080,
                debug: false,
                database: DbConfig::default(),
            }
        }
    }

    impl Default for DbConfig {
        fn default() -> Self {
            Self {
                url: None,
                pool_size: 5,
                replicas: Vec::new(),
            }
        }
    }

    /// Fixture exercising the declared-kind pathway: durations and
    /// addresses that serialize as strings.
    #[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
    pub struct TimingConfig {
        #[serde(with = "humantime_serde")]
        pub timeout: Duration,
        pub bind: std::net::IpAddr,
    }

    impl Default for TimingConfig {
        fn default() -> Self {
            Self {
                timeout: Duration::from_secs(30),
                bind: std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST),
            }
        }
    }

    #[test]
    fn timing_config_serializes_as_strings() {
        let value = toml::Value::try_from(TimingConfig::default()).unwrap();
        assert_eq!(value["timeout"].as_str().unwrap(), "30s");
        assert_eq!(value["bind"].as_str().unwrap(), "127.0.0.1");
    }
}

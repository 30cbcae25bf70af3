use std::env;

const DEFAULT_SMTP_PORT: u16 = 587;
const DEFAULT_FROM_ADDRESS: &str = "noreply@passport.local";
const DEFAULT_TO_ADDRESS: &str = "ops@passport.local";

#[derive(Debug, Clone)]
pub enum BusType {
    Nats,
    InMemory,
}

impl BusType {
    pub fn from_env() -> Self {
        match env::var("BUS_TYPE")
            .unwrap_or_else(|_| "inmemory".to_string())
            .to_lowercase()
            .as_str()
        {
            "nats" => BusType::Nats,
            "inmemory" => BusType::InMemory,
            _ => {
                tracing::warn!("unknown BUS_TYPE, defaulting to inmemory");
                BusType::InMemory
            }
        }
    }
}

/// SMTP settings; the sink is only constructed when host, user, and
/// password are all present, otherwise delivery falls back to the log.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_address: String,
}

impl SmtpConfig {
    pub fn from_env() -> Option<Self> {
        Self::from_values(
            env::var("SMTP_HOST").ok(),
            env::var("SMTP_PORT").ok(),
            env::var("SMTP_USER").ok(),
            env::var("SMTP_PASSWORD").ok(),
            env::var("SMTP_FROM").ok(),
        )
    }

    /// Assemble from already-read values. Host, user, and password are all
    /// required; port and from-address fall back to defaults.
    pub fn from_values(
        host: Option<String>,
        port: Option<String>,
        user: Option<String>,
        password: Option<String>,
        from_address: Option<String>,
    ) -> Option<Self> {
        Some(Self {
            host: host?,
            port: port
                .and_then(|p| p.parse().ok())
                .unwrap_or(DEFAULT_SMTP_PORT),
            user: user?,
            password: password?,
            from_address: from_address.unwrap_or_else(|| DEFAULT_FROM_ADDRESS.to_string()),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    pub bus_type: BusType,
    pub nats_url: Option<String>,
    pub consumer_group: String,

    /// Base URL used to render record links in notification bodies.
    pub passport_base_url: String,

    /// Recipient of lifecycle notifications.
    pub notify_to: String,

    pub smtp: Option<SmtpConfig>,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        let bus_type = BusType::from_env();
        let nats_url = match bus_type {
            BusType::Nats => Some(
                env::var("NATS_URL").unwrap_or_else(|_| "nats://localhost:4222".to_string()),
            ),
            BusType::InMemory => None,
        };

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8084".to_string())
                .parse()?,

            bus_type,
            nats_url,
            consumer_group: env::var("CONSUMER_GROUP")
                .unwrap_or_else(|_| "notification-service".to_string()),

            passport_base_url: env::var("PASSPORT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:8082".to_string()),

            notify_to: env::var("NOTIFY_TO").unwrap_or_else(|_| DEFAULT_TO_ADDRESS.to_string()),

            smtp: SmtpConfig::from_env(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn smtp_config_requires_host_user_and_password() {
        assert!(SmtpConfig::from_values(None, None, None, None, None).is_none());

        // Host alone is not enough.
        assert!(
            SmtpConfig::from_values(Some("smtp.example.com".into()), None, None, None, None)
                .is_none()
        );

        // Host without credentials, and credentials without host, both fail.
        assert!(SmtpConfig::from_values(
            None,
            None,
            Some("mailer".into()),
            Some("secret".into()),
            None
        )
        .is_none());

        let cfg = SmtpConfig::from_values(
            Some("smtp.example.com".into()),
            None,
            Some("mailer".into()),
            Some("secret".into()),
            None,
        )
        .unwrap();
        assert_eq!(cfg.host, "smtp.example.com");
        assert_eq!(cfg.port, 587);
        assert_eq!(cfg.from_address, "noreply@passport.local");
    }

    #[test]
    fn smtp_port_and_from_address_are_overridable() {
        let cfg = SmtpConfig::from_values(
            Some("smtp.example.com".into()),
            Some("2525".into()),
            Some("mailer".into()),
            Some("secret".into()),
            Some("alerts@example.com".into()),
        )
        .unwrap();
        assert_eq!(cfg.port, 2525);
        assert_eq!(cfg.from_address, "alerts@example.com");
    }
}

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,

    /// Shared signing secret. Read once here and injected into `JwtKeys`;
    /// no other component may hold or forward it.
    pub jwt_secret: String,
    pub access_token_ttl_minutes: i64,

    pub argon_memory_kb: u32,
    pub argon_iterations: u32,
    pub argon_parallelism: u32,
}

impl Config {
    pub fn from_env() -> Result<Self, Box<dyn std::error::Error>> {
        dotenvy::dotenv().ok();

        Ok(Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8081".to_string())
                .parse()?,

            jwt_secret: env::var("JWT_SECRET")?,
            access_token_ttl_minutes: env::var("ACCESS_TOKEN_TTL_MINUTES")
                .unwrap_or_else(|_| "60".to_string())
                .parse()?,

            argon_memory_kb: env::var("ARGON_MEMORY_KB")
                .unwrap_or_else(|_| "65536".to_string())
                .parse()?,
            argon_iterations: env::var("ARGON_ITERATIONS")
                .unwrap_or_else(|_| "3".to_string())
                .parse()?,
            argon_parallelism: env::var("ARGON_PARALLELISM")
                .unwrap_or_else(|_| "1".to_string())
                .parse()?,
        })
    }
}

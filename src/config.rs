use std::env;

/// Process configuration, loaded once at startup from the environment.
///
/// The JWT signing secret and token lifetime live here so they can be passed
/// explicitly into the components that need them, rather than read from
/// ambient environment state deep inside the auth code.
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    /// Token lifetime in days. Defaults to 30.
    pub jwt_expiry_days: i64,
    pub server_port: u16,
    pub server_host: String,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            jwt_secret: env::var("JWT_SECRET").expect("JWT_SECRET must be set"),
            jwt_expiry_days: env::var("JWT_EXPIRY_DAYS")
                .unwrap_or_else(|_| "30".to_string())
                .parse()
                .expect("JWT_EXPIRY_DAYS must be a number"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        env::set_var("DATABASE_URL", "postgres://test");
        env::set_var("JWT_SECRET", "test-secret");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.jwt_secret, "test-secret");
        assert_eq!(config.jwt_expiry_days, 30);
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");

        env::set_var("JWT_EXPIRY_DAYS", "7");
        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");

        let config = Config::from_env();

        assert_eq!(config.jwt_expiry_days, 7);
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
    }
}

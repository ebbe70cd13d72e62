use serde::Deserialize;

#[derive(Deserialize, Clone, Default)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub database: DatabaseSettings,
    pub debug: bool,
    pub secret: SecretSettings,
    pub email: EmailSettings,
}

impl Settings {
    pub fn base_settings() -> Self {
        Self {
            application: ApplicationSettings {
                max_log_files: 14,
                activation_path: "activate/{uid}/{token}".to_string(),
                ..Default::default()
            },
            secret: SecretSettings {
                // Three days, in minutes.
                token_expiration: 60 * 24 * 3,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    pub fn activation_url(&self, uid: &str, token: &str) -> String {
        let path = self
            .application
            .activation_path
            .replace("{uid}", uid)
            .replace("{token}", token);
        format!(
            "{}/{}",
            self.application.frontend_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        )
    }
}

#[derive(Deserialize, Clone, Default)]
pub struct ApplicationSettings {
    pub frontend_url: String,
    pub activation_path: String,
    pub max_log_files: usize,
    pub app_name: String,
}

#[derive(Deserialize, Clone, Default, Debug)]
pub struct DatabaseSettings {
    pub url: String,
}

#[derive(Deserialize, Clone, Default)]
pub struct SecretSettings {
    pub secret_key: String,
    pub token_expiration: i64,
    pub hmac_secret: String,
}

#[derive(Deserialize, Clone, Default)]
pub struct EmailSettings {
    pub no_verify: bool,
    pub send_activation_confirmation: bool,
    pub host: String,
    pub host_user: String,
    pub host_user_password: String,
    pub sender: String,
}

pub enum Environment {
    Testing,
    Development,
    Production,
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "testing" => Ok(Self::Testing),
            "development" => Ok(Self::Development),
            "production" => Ok(Self::Production),
            other => Err(format!("{} is not a supported environment.", other)),
        }
    }
}

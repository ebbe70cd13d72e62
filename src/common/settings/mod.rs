use std::env;

use crate::settings::types::{
    ApplicationSettings, DatabaseSettings, EmailSettings, Environment, SecretSettings, Settings,
};

pub mod types;

pub fn get_settings(env_file_name: &str) -> Result<Settings, String> {
    dotenvy::from_filename(env_file_name)
        .map_err(|e| format!("Failed to fetch env file: {}", e))?;

    match Environment::try_from(env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "production".into()))
    {
        Ok(env) => match env {
            Environment::Testing => Ok(get_test_settings()),
            Environment::Development => get_development_settings(),
            Environment::Production => get_production_settings(),
        },
        Err(e) => Err(format!("Failed to parse APP_ENVIRONMENT: {}", e)),
    }
}

/// Self-contained settings for tests: in-memory SQLite, fixed secrets, no mail delivery.
pub fn get_test_settings() -> Settings {
    let b = Settings::base_settings();
    Settings {
        application: ApplicationSettings {
            frontend_url: "http://localhost:3000".to_string(),
            app_name: "Activation Backend (testing)".to_string(),
            ..b.application
        },
        database: DatabaseSettings {
            url: "sqlite::memory:".to_string(),
        },
        debug: true,
        secret: SecretSettings {
            secret_key: "0123456789abcdef0123456789abcdef".to_string(),
            hmac_secret: "testing-hmac-secret".to_string(),
            ..b.secret
        },
        email: EmailSettings {
            no_verify: false,
            send_activation_confirmation: false,
            sender: "Activation Backend <noreply@test.com>".to_string(),
            ..b.email
        },
    }
}

fn get_development_settings() -> Result<Settings, String> {
    let b = Settings::base_settings();
    merge_env(Settings {
        application: ApplicationSettings {
            frontend_url: "https://localhost:3000".to_string(),
            app_name: "Activation Backend (development)".to_string(),
            ..b.application
        },
        debug: true,
        secret: SecretSettings {
            token_expiration: 30,
            ..b.secret
        },
        ..b
    })
}

fn get_production_settings() -> Result<Settings, String> {
    let b = Settings::base_settings();
    merge_env(Settings {
        application: ApplicationSettings {
            app_name: "Activation Backend".to_string(),
            ..b.application
        },
        debug: false,
        ..b
    })
}

fn merge_env(s: Settings) -> Result<Settings, String> {
    let frontend_url = match env::var("APP_APPLICATION__FRONTEND_URL") {
        Ok(url) => url,
        Err(_) if !s.application.frontend_url.is_empty() => s.application.frontend_url.clone(),
        Err(e) => return Err(format!("APP_APPLICATION__FRONTEND_URL: {}", e)),
    };
    // Mailed links must be absolute.
    if !(frontend_url.starts_with("https://") || frontend_url.starts_with("http://")) {
        return Err(format!(
            "APP_APPLICATION__FRONTEND_URL must be an absolute http(s) URL, got '{}'",
            frontend_url
        ));
    }

    Ok(Settings {
        application: ApplicationSettings {
            frontend_url,
            max_log_files: match env::var("APP_APPLICATION__MAX_LOG_FILES") {
                Ok(max_log_files) => max_log_files.parse::<usize>().map_err(|e| e.to_string())?,
                Err(_) => s.application.max_log_files,
            },
            ..s.application
        },
        database: DatabaseSettings {
            url: get_env_var("DATABASE_URL")?,
        },
        debug: match env::var("APP_DEBUG") {
            Ok(debug) => &debug == "true",
            Err(_) => s.debug,
        },
        secret: SecretSettings {
            secret_key: get_env_var("APP_SECRET__SECRET_KEY")?,
            hmac_secret: get_env_var("APP_SECRET__HMAC_SECRET")?,
            token_expiration: match env::var("APP_SECRET__TOKEN_EXPIRATION") {
                Ok(minutes) => minutes.parse::<i64>().map_err(|e| e.to_string())?,
                Err(_) => s.secret.token_expiration,
            },
        },
        email: EmailSettings {
            no_verify: match env::var("APP_EMAIL__NO_VERIFY") {
                Ok(no_verify) => &no_verify == "true",
                Err(_) => s.email.no_verify,
            },
            send_activation_confirmation: match env::var("APP_EMAIL__SEND_ACTIVATION_CONFIRMATION")
            {
                Ok(send) => &send == "true",
                Err(_) => s.email.send_activation_confirmation,
            },
            // Empty host: emails are logged, not delivered.
            host: env::var("APP_EMAIL__HOST").unwrap_or(s.email.host),
            host_user: env::var("APP_EMAIL__HOST_USER").unwrap_or(s.email.host_user),
            host_user_password: env::var("APP_EMAIL__HOST_USER_PASSWORD")
                .unwrap_or(s.email.host_user_password),
            sender: get_env_var("APP_EMAIL__SENDER")?,
        },
    })
}

fn get_env_var(key: &str) -> Result<String, String> {
    env::var(key).map_err(|e| format!("{}: {}", key, e))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REQUIRED: [(&str, &str); 4] = [
        ("DATABASE_URL", "postgres://localhost/activation"),
        ("APP_SECRET__SECRET_KEY", "0123456789abcdef0123456789abcdef"),
        ("APP_SECRET__HMAC_SECRET", "hmac-secret"),
        ("APP_EMAIL__SENDER", "Activation Backend <noreply@test.com>"),
    ];

    // Process env is shared between tests, so every env case lives in this one test.
    #[test]
    fn production_requires_absolute_frontend_url() {
        for (key, value) in REQUIRED {
            env::set_var(key, value);
        }

        env::remove_var("APP_APPLICATION__FRONTEND_URL");
        let err = get_production_settings().err().unwrap();
        assert!(err.contains("APP_APPLICATION__FRONTEND_URL"), "{}", err);

        env::set_var("APP_APPLICATION__FRONTEND_URL", "");
        let err = get_production_settings().err().unwrap();
        assert!(err.contains("absolute"), "{}", err);

        env::set_var("APP_APPLICATION__FRONTEND_URL", "example.com");
        assert!(get_production_settings().is_err());

        env::set_var("APP_APPLICATION__FRONTEND_URL", "https://example.com");
        let settings = get_production_settings().unwrap();
        assert_eq!(
            settings.activation_url("Mw", "token"),
            "https://example.com/activate/Mw/token"
        );

        env::remove_var("APP_APPLICATION__FRONTEND_URL");
        let settings = get_development_settings().unwrap();
        assert!(settings.activation_url("Mw", "token").starts_with("https://localhost:3000/"));

        for (key, _) in REQUIRED {
            env::remove_var(key);
        }
    }
}

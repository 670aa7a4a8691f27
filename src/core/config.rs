mod parsing;
mod secret;
mod settings;
mod types;

pub(crate) use types::{ConfigError, Environment, Settings};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn load_uses_classification_defaults() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::remove_var("CLASSIFY_DEBOUNCE_MS");
        std::env::remove_var("CLASSIFY_MIN_TEXT_CHARS");

        let settings = Settings::load().expect("settings");

        assert_eq!(settings.classification().debounce_ms, 1000);
        assert_eq!(settings.classification().min_text_chars, 20);
        assert_eq!(settings.ai().ai_max_tokens, 1024);
        assert_eq!(settings.runtime().environment, Environment::Test);
        assert!(!settings.ai().is_configured());
    }

    #[tokio::test]
    async fn strict_mode_requires_ai_credentials() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("HOSTEL_STRICT_CONFIG", "1");
        std::env::set_var("FIRST_ADMIN_PASSWORD", "admin-pass");

        let result = Settings::load();
        std::env::set_var("HOSTEL_STRICT_CONFIG", "0");
        std::env::remove_var("FIRST_ADMIN_PASSWORD");

        assert!(matches!(result, Err(ConfigError::MissingSecret("OPENAI_API_KEY"))));
    }

    #[tokio::test]
    async fn rejects_unsupported_image_extension() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("ALLOWED_IMAGE_EXTENSIONS", "jpg,bmp");

        let result = Settings::load();
        std::env::remove_var("ALLOWED_IMAGE_EXTENSIONS");

        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { field: "ALLOWED_IMAGE_EXTENSIONS", .. })
        ));
    }

    #[tokio::test]
    async fn rejects_out_of_range_sizes_and_ttl() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();

        std::env::set_var("MAX_UPLOAD_SIZE_MB", "18446744073709551615");
        let upload = Settings::load();
        std::env::remove_var("MAX_UPLOAD_SIZE_MB");

        std::env::set_var("DRAFT_TTL_MINUTES", "9223372036854775807");
        let ttl = Settings::load();
        std::env::remove_var("DRAFT_TTL_MINUTES");

        assert!(matches!(
            upload,
            Err(ConfigError::InvalidValue { field: "MAX_UPLOAD_SIZE_MB", .. })
        ));
        assert!(matches!(ttl, Err(ConfigError::InvalidValue { field: "DRAFT_TTL_MINUTES", .. })));
    }
}

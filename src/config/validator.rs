use crate::config::{Config, SCHEMA_VERSION};
use crate::error::{LinetraceError, Result, ValidationError};

/// Configuration validator
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate the configuration
    pub fn validate(config: &Config) -> Result<()> {
        let mut errors = Vec::new();

        Self::validate_schema_version(config, &mut errors);
        Self::validate_matching(config, &mut errors);
        Self::validate_attribution(config, &mut errors);
        Self::validate_profiles(config, &mut errors);

        if errors.is_empty() {
            Ok(())
        } else {
            Err(LinetraceError::ConfigValidation { errors })
        }
    }

    fn validate_schema_version(config: &Config, errors: &mut Vec<ValidationError>) {
        let version = &config.meta.schema_version;
        if version != SCHEMA_VERSION {
            errors.push(ValidationError::new(
                "_meta.schema_version",
                format!("Unsupported schema version: {}", version),
            ));
        }
    }

    fn validate_matching(config: &Config, errors: &mut Vec<ValidationError>) {
        let matching = &config.matching;

        if matching.context_window == 0 {
            errors.push(ValidationError::new(
                "matching.context_window",
                "Context window must be greater than 0",
            ));
        }

        if matching.candidate_limit == 0 {
            errors.push(ValidationError::new(
                "matching.candidate_limit",
                "Candidate limit must be greater than 0",
            ));
        }

        Self::check_unit_range(
            "matching.content_weight",
            matching.content_weight,
            errors,
        );
        Self::check_unit_range(
            "matching.context_weight",
            matching.context_weight,
            errors,
        );

        let total = matching.content_weight + matching.context_weight;
        if (total - 1.0).abs() > 1e-6 {
            errors.push(ValidationError::new(
                "matching.content_weight",
                format!(
                    "Content and context weights must sum to 1.0, got {}",
                    total
                ),
            ));
        }

        Self::check_unit_range(
            "matching.match_threshold",
            matching.match_threshold,
            errors,
        );
        Self::check_unit_range(
            "matching.split_threshold",
            matching.split_threshold,
            errors,
        );
    }

    fn validate_attribution(config: &Config, errors: &mut Vec<ValidationError>) {
        let attribution = &config.attribution;

        Self::check_unit_range(
            "attribution.match_threshold",
            attribution.match_threshold,
            errors,
        );

        if attribution.bug_fix_keywords.iter().all(|k| k.trim().is_empty()) {
            errors.push(ValidationError::new(
                "attribution.bug_fix_keywords",
                "At least one bug-fix keyword is required",
            ));
        }

        if attribution.feature_keywords.iter().all(|k| k.trim().is_empty()) {
            errors.push(ValidationError::new(
                "attribution.feature_keywords",
                "At least one feature keyword is required",
            ));
        }

        if attribution.max_depth == Some(0) {
            errors.push(ValidationError::new(
                "attribution.max_depth",
                "Max depth must be greater than 0 when set",
            ));
        }
    }

    fn validate_profiles(config: &Config, errors: &mut Vec<ValidationError>) {
        for (name, overrides) in &config.profiles {
            if let Some(threshold) = overrides.match_threshold {
                Self::check_unit_range(
                    &format!("profiles.{}.match_threshold", name),
                    threshold,
                    errors,
                );
            }
            if overrides.candidate_limit == Some(0) {
                errors.push(ValidationError::new(
                    format!("profiles.{}.candidate_limit", name),
                    "Candidate limit must be greater than 0",
                ));
            }
        }
    }

    fn check_unit_range(path: &str, value: f64, errors: &mut Vec<ValidationError>) {
        if !(0.0..=1.0).contains(&value) {
            errors.push(ValidationError::new(
                path,
                format!("Value must be between 0.0 and 1.0, got {}", value),
            ));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProfileOverrides;

    #[test]
    fn test_valid_config() {
        let config = Config::default();
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_forced_threshold_is_valid() {
        let mut config = Config::default();
        config.matching.match_threshold = 0.0;
        assert!(ConfigValidator::validate(&config).is_ok());
    }

    #[test]
    fn test_weights_must_sum_to_one() {
        let mut config = Config::default();
        config.matching.content_weight = 0.7;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_zero_candidate_limit() {
        let mut config = Config::default();
        config.matching.candidate_limit = 0;
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_empty_keywords() {
        let mut config = Config::default();
        config.attribution.bug_fix_keywords.clear();
        assert!(ConfigValidator::validate(&config).is_err());
    }

    #[test]
    fn test_profile_threshold_out_of_range() {
        let mut config = Config::default();
        config.profiles.insert(
            "loose".to_string(),
            ProfileOverrides {
                match_threshold: Some(1.5),
                ..ProfileOverrides::default()
            },
        );

        match ConfigValidator::validate(&config) {
            Err(LinetraceError::ConfigValidation { errors }) => {
                assert_eq!(errors.len(), 1);
                assert_eq!(errors[0].path, "profiles.loose.match_threshold");
            }
            other => panic!("expected validation failure, got {:?}", other),
        }
    }
}

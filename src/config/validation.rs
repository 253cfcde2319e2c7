//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate retry policies (base > 0, max >= base) and cooldowns
//! - Check referential integrity (category tables name known services)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{AppConfig, BreakerConfig};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field}: invalid socket address {value:?}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("breakers.{breaker}: {reason}")]
    InvalidBreaker { breaker: &'static str, reason: &'static str },

    #[error("registry.{field} must be greater than zero")]
    ZeroInterval { field: &'static str },

    #[error("registry.categories.{category} names unknown service {service:?}")]
    UnknownService { category: &'static str, service: String },

    #[error("registry.services lists {0:?} more than once")]
    DuplicateService(String),
}

pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_address(&mut errors, "listener.bind_address", &config.listener.bind_address);
    if config.observability.metrics_enabled {
        check_address(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    let breakers = &config.breakers;
    for (name, breaker) in [
        ("game_api", &breakers.game_api),
        ("user_store", &breakers.user_store),
        ("comment_store", &breakers.comment_store),
        ("registry_store", &breakers.registry_store),
    ] {
        check_breaker(&mut errors, name, breaker);
    }

    let registry = &config.registry;
    if registry.poll_interval_ms == 0 {
        errors.push(ValidationError::ZeroInterval { field: "poll_interval_ms" });
    }

    let mut seen: Vec<String> = Vec::new();
    for service in &registry.services {
        let key = service.to_lowercase();
        if seen.contains(&key) {
            errors.push(ValidationError::DuplicateService(service.clone()));
        } else {
            seen.push(key);
        }
    }

    let categories = &registry.categories;
    for (category, names) in [
        ("game_api", &categories.game_api),
        ("user_store", &categories.user_store),
        ("comment_store", &categories.comment_store),
    ] {
        for name in names {
            if !seen.contains(&name.to_lowercase()) {
                errors.push(ValidationError::UnknownService { category, service: name.clone() });
            }
        }
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress { field, value: value.to_string() });
    }
}

fn check_breaker(errors: &mut Vec<ValidationError>, breaker: &'static str, config: &BreakerConfig) {
    if config.base_delay_ms == 0 {
        errors.push(ValidationError::InvalidBreaker { breaker, reason: "base_delay_ms must be greater than zero" });
    } else if config.max_delay_ms < config.base_delay_ms {
        errors.push(ValidationError::InvalidBreaker { breaker, reason: "max_delay_ms must be >= base_delay_ms" });
    }
    if config.cooldown_ms == 0 {
        errors.push(ValidationError::InvalidBreaker { breaker, reason: "cooldown_ms must be greater than zero" });
    }
}

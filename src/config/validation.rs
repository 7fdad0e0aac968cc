use crate::config::types::{Config, CrawlerConfig, OutputConfig, Site, SiteEntry, UserAgentConfig};
use crate::url::site_name_from_url;
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Default anchor attribute read for article titles
pub const DEFAULT_TITLE_ATTRIBUTE: &str = "title";

/// Validates the run-wide part of the configuration
///
/// Site entries are not checked here; see [`resolve_sites`].
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_articles < 1 || config.max_concurrent_articles > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_articles must be between 1 and 64, got {}",
            config.max_concurrent_articles
        )));
    }

    if config.request_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request_timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if config.backup_dir.is_empty() {
        return Err(ConfigError::Validation(
            "backup_dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    let invalid = || ConfigError::Validation(format!("Invalid email format: '{}'", email));

    let (local, domain) = email.split_once('@').ok_or_else(invalid)?;
    if local.is_empty() || domain.is_empty() || domain.contains('@') || !domain.contains('.') {
        return Err(invalid());
    }

    Ok(())
}

/// Resolves every `[[site]]` entry into a [`Site`]
///
/// Each entry is resolved independently: a broken entry produces an error in
/// its own slot and never affects its neighbours. A name already taken by an
/// earlier valid entry is reported as an error for the later one.
pub fn resolve_sites(config: &Config) -> Vec<Result<Site, ConfigError>> {
    let mut seen = HashSet::new();

    config
        .sites
        .iter()
        .enumerate()
        .map(|(index, entry)| {
            let site = resolve_site(index, entry, &config.search_terms)?;
            if !seen.insert(site.name.clone()) {
                return Err(site_error(
                    index,
                    format!("duplicate site name '{}'", site.name),
                ));
            }
            Ok(site)
        })
        .collect()
}

fn resolve_site(
    index: usize,
    entry: &SiteEntry,
    global_terms: &[String],
) -> Result<Site, ConfigError> {
    let raw_url = entry
        .url
        .as_deref()
        .map(str::trim)
        .filter(|u| !u.is_empty())
        .ok_or_else(|| site_error(index, "missing url".to_string()))?;

    let parsed = Url::parse(raw_url)
        .map_err(|e| site_error(index, format!("invalid url '{}': {}", raw_url, e)))?;

    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(site_error(
            index,
            format!("url '{}' must use http or https", raw_url),
        ));
    }

    let name = match entry.name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => name.to_lowercase(),
        _ => site_name_from_url(&parsed)
            .ok_or_else(|| site_error(index, format!("cannot derive a name from '{}'", raw_url)))?,
    };

    // The name becomes part of the backup file name
    if name.contains(&['/', '\\'][..]) || name.contains("..") {
        return Err(site_error(
            index,
            format!("site name '{}' must not contain path separators or '..'", name),
        ));
    }

    let terms = entry.search_terms.as_deref().unwrap_or(global_terms);
    let search_terms: Vec<String> = terms
        .iter()
        .map(|t| t.trim().to_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    // Text is split on whitespace before matching, so such a term never matches
    if let Some(term) = search_terms.iter().find(|t| t.contains(char::is_whitespace)) {
        return Err(site_error(
            index,
            format!("search term '{}' for site '{}' contains whitespace", term, name),
        ));
    }

    if search_terms.is_empty() {
        return Err(site_error(
            index,
            format!("site '{}' has no search terms", name),
        ));
    }

    let title_attribute = entry
        .title_attribute
        .clone()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TITLE_ATTRIBUTE.to_string());

    Ok(Site {
        name,
        url: raw_url.to_string(),
        search_terms,
        title_attribute,
    })
}

fn site_error(index: usize, message: String) -> ConfigError {
    ConfigError::Site { index, message }
}

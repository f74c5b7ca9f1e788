pub mod error;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::constants::*;
use crate::models::{
    ApiConfig, Config, ConfigMetadata, ConfigSource, ImageConfig,
    SearchConfig, SiteConfig,
};
use error::ConfigLoadError;

/// Result of a successful load along with non-fatal findings.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: Config,
    pub warnings: Vec<String>,
}

#[derive(Debug, Clone)]
enum EnvSource {
    Process,
    Fixed(HashMap<String, String>),
}

/// Layered configuration loader.
///
/// Precedence, lowest first: defaults, TOML file, `.env`, process
/// environment. `.env` never overrides variables already present.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    env_file: Option<PathBuf>,
    config_file: Option<PathBuf>,
    env: EnvSource,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            env_file: None,
            config_file: None,
            env: EnvSource::Process,
        }
    }

    /// Read this `.env` file instead of searching the working directory.
    pub fn with_env_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.env_file = Some(path.into());
        self
    }

    /// Read this TOML file instead of `$STOREFRONT_CONFIG_PATH` or the
    /// default candidates.
    pub fn with_config_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config_file = Some(path.into());
        self
    }

    /// Use a fixed environment instead of the process environment. Keeps
    /// tests hermetic.
    pub fn with_env<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.env = EnvSource::Fixed(
            vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        );
        self
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (env, env_file) = self.resolve_env()?;
        let (file, source) = self.read_config_file(&env)?;
        let mut warnings = Vec::new();

        let base_url = pick_string(&env, ENV_API_URL, file.api.base_url)
            .ok_or(ConfigLoadError::MissingApiBaseUrl)?;
        let base_url = parse_api_url(&base_url)?;

        let store_id = pick_string(&env, ENV_STORE_ID, file.api.store_id);
        if store_id.is_none() {
            warnings.push(format!(
                "{ENV_STORE_ID} is not set; searches are not scoped to a store"
            ));
        }

        let origin = match pick_string(&env, ENV_SITE_URL, file.site.origin) {
            Some(raw) => Url::parse(&raw).map_err(|source| {
                ConfigLoadError::InvalidSiteUrl { value: raw, source }
            })?,
            None => SiteConfig::default().origin,
        };

        let defaults = SearchConfig::default();
        let search = SearchConfig {
            page_size: pick_parsed(
                &env,
                ENV_PAGE_SIZE,
                file.search.page_size,
                defaults.page_size,
            )?,
            suggestion_limit: pick_parsed(
                &env,
                ENV_SUGGESTION_LIMIT,
                file.search.suggestion_limit,
                defaults.suggestion_limit,
            )?,
            min_query_chars: pick_parsed(
                &env,
                ENV_MIN_QUERY_CHARS,
                file.search.min_query_chars,
                defaults.min_query_chars,
            )?,
            commit_debounce: pick_duration(
                &env,
                ENV_COMMIT_DEBOUNCE,
                file.search.commit_debounce,
                defaults.commit_debounce,
            )?,
            suggest_debounce: pick_duration(
                &env,
                ENV_SUGGEST_DEBOUNCE,
                file.search.suggest_debounce,
                defaults.suggest_debounce,
            )?,
            home_redirect_delay: pick_duration(
                &env,
                ENV_HOME_REDIRECT_DELAY,
                file.search.home_redirect_delay,
                defaults.home_redirect_delay,
            )?,
            request_timeout: pick_duration(
                &env,
                ENV_REQUEST_TIMEOUT,
                file.search.request_timeout,
                defaults.request_timeout,
            )?,
        };
        validate_search(&search)?;

        let image_defaults = ImageConfig::default();
        let images = ImageConfig {
            session_quota_bytes: pick_parsed(
                &env,
                ENV_IMAGE_SESSION_QUOTA,
                file.images.session_quota_bytes,
                image_defaults.session_quota_bytes,
            )?,
            max_upload_bytes: pick_parsed(
                &env,
                ENV_IMAGE_MAX_UPLOAD,
                file.images.max_upload_bytes,
                image_defaults.max_upload_bytes,
            )?,
            cache_dir: pick_string(&env, ENV_IMAGE_CACHE_DIR, file.images.cache_dir)
                .map(PathBuf::from),
        };
        if images.max_upload_bytes == 0 {
            return Err(invalid(ENV_IMAGE_MAX_UPLOAD, "0", "must be positive"));
        }
        if images.session_quota_bytes > images.max_upload_bytes.saturating_mul(2) {
            warnings.push(format!(
                "{ENV_IMAGE_SESSION_QUOTA} exceeds twice the upload limit; the memory fallback will never be used"
            ));
        }

        for warning in &warnings {
            warn!("{warning}");
        }

        let config = Config {
            api: ApiConfig {
                base_url,
                store_id,
                token: pick_string(&env, ENV_API_TOKEN, file.api.token),
            },
            site: SiteConfig { origin },
            search,
            images,
            metadata: ConfigMetadata { source, env_file },
        };
        debug!(base_url = %config.api.base_url, "configuration loaded");

        Ok(ConfigLoad { config, warnings })
    }

    fn resolve_env(
        &self,
    ) -> Result<(HashMap<String, String>, Option<PathBuf>), ConfigLoadError>
    {
        match &self.env {
            EnvSource::Process => {
                let env_file = match &self.env_file {
                    Some(path) => {
                        dotenvy::from_path(path)?;
                        Some(path.clone())
                    }
                    None => match dotenvy::dotenv() {
                        Ok(path) => Some(path),
                        Err(err) if err.not_found() => None,
                        Err(err) => return Err(err.into()),
                    },
                };
                let vars = MANAGED_KEYS
                    .iter()
                    .filter_map(|key| {
                        std::env::var(key).ok().map(|v| (key.to_string(), v))
                    })
                    .collect();
                Ok((vars, env_file))
            }
            EnvSource::Fixed(vars) => {
                let mut vars = vars.clone();
                if let Some(path) = &self.env_file {
                    for item in dotenvy::from_path_iter(path)? {
                        let (key, value) = item?;
                        vars.entry(key).or_insert(value);
                    }
                }
                Ok((vars, self.env_file.clone()))
            }
        }
    }

    fn read_config_file(
        &self,
        env: &HashMap<String, String>,
    ) -> Result<(FileConfig, ConfigSource), ConfigLoadError> {
        let path = self
            .config_file
            .clone()
            .or_else(|| {
                env.get(ENV_CONFIG_PATH)
                    .filter(|p| !p.trim().is_empty())
                    .map(PathBuf::from)
            })
            .or_else(find_default_file);

        let Some(path) = path else {
            return Ok((FileConfig::default(), ConfigSource::Default));
        };

        let contents = std::fs::read_to_string(&path).map_err(|source| {
            ConfigLoadError::ConfigFileIo {
                path: path.clone(),
                source,
            }
        })?;
        let parsed = toml::from_str::<FileConfig>(&contents).map_err(
            |source| ConfigLoadError::ConfigFileParse {
                path: path.clone(),
                source,
            },
        )?;
        Ok((parsed, ConfigSource::File(path)))
    }
}

fn find_default_file() -> Option<PathBuf> {
    DEFAULT_CONFIG_FILES
        .iter()
        .map(Path::new)
        .find(|path| path.exists())
        .map(Path::to_path_buf)
}

/// Normalize the API base: trim whitespace and trailing slashes, require an
/// http(s) scheme.
fn parse_api_url(raw: &str) -> Result<Url, ConfigLoadError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let url = Url::parse(trimmed).map_err(|source| {
        ConfigLoadError::InvalidApiBaseUrl {
            value: raw.to_string(),
            source,
        }
    })?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        _ => Err(ConfigLoadError::UnsupportedScheme(raw.to_string())),
    }
}

fn validate_search(search: &SearchConfig) -> Result<(), ConfigLoadError> {
    if search.page_size == 0 {
        return Err(invalid(ENV_PAGE_SIZE, "0", "must be positive"));
    }
    if search.suggestion_limit == 0
        || search.suggestion_limit > MAX_SUGGESTION_LIMIT
    {
        return Err(invalid(
            ENV_SUGGESTION_LIMIT,
            &search.suggestion_limit.to_string(),
            &format!("must be between 1 and {MAX_SUGGESTION_LIMIT}"),
        ));
    }
    if search.request_timeout.is_zero() {
        return Err(invalid(ENV_REQUEST_TIMEOUT, "0s", "must be non-zero"));
    }
    Ok(())
}

fn invalid(key: &'static str, value: &str, reason: &str) -> ConfigLoadError {
    ConfigLoadError::InvalidValue {
        key,
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

fn pick_string(
    env: &HashMap<String, String>,
    key: &str,
    file_value: Option<String>,
) -> Option<String> {
    env.get(key)
        .cloned()
        .or(file_value)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn pick_parsed<T>(
    env: &HashMap<String, String>,
    key: &'static str,
    file_value: Option<T>,
    default: T,
) -> Result<T, ConfigLoadError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env.get(key).map(|v| v.trim()).filter(|v| !v.is_empty()) {
        Some(raw) => raw
            .parse()
            .map_err(|err: T::Err| invalid(key, raw, &err.to_string())),
        None => Ok(file_value.unwrap_or(default)),
    }
}

fn pick_duration(
    env: &HashMap<String, String>,
    key: &'static str,
    file_value: Option<String>,
    default: Duration,
) -> Result<Duration, ConfigLoadError> {
    let raw = env
        .get(key)
        .cloned()
        .or(file_value)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());
    match raw {
        Some(raw) => humantime::parse_duration(&raw)
            .map_err(|err| invalid(key, &raw, &err.to_string())),
        None => Ok(default),
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    api: FileApi,
    site: FileSite,
    search: FileSearch,
    images: FileImages,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileApi {
    base_url: Option<String>,
    store_id: Option<String>,
    token: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSite {
    origin: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileSearch {
    page_size: Option<u32>,
    suggestion_limit: Option<usize>,
    min_query_chars: Option<usize>,
    commit_debounce: Option<String>,
    suggest_debounce: Option<String>,
    home_redirect_delay: Option<String>,
    request_timeout: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileImages {
    session_quota_bytes: Option<u64>,
    max_upload_bytes: Option<u64>,
    cache_dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_url_is_normalized() {
        let url = parse_api_url(" https://admin.example.com/api/ ").unwrap();
        assert_eq!(url.as_str(), "https://admin.example.com/api");
        assert!(matches!(
            parse_api_url("ftp://admin.example.com"),
            Err(ConfigLoadError::UnsupportedScheme(_))
        ));
        assert!(matches!(
            parse_api_url("admin.example.com"),
            Err(ConfigLoadError::InvalidApiBaseUrl { .. })
        ));
    }

    #[test]
    fn env_values_beat_file_values() {
        let env = HashMap::from([(ENV_PAGE_SIZE.to_string(), "12".to_string())]);
        assert_eq!(pick_parsed(&env, ENV_PAGE_SIZE, Some(30u32), 24).unwrap(), 12);
        assert_eq!(
            pick_parsed(&HashMap::new(), ENV_PAGE_SIZE, Some(30u32), 24).unwrap(),
            30
        );
        assert!(pick_parsed::<u32>(
            &HashMap::from([(ENV_PAGE_SIZE.to_string(), "lots".to_string())]),
            ENV_PAGE_SIZE,
            None,
            24
        )
        .is_err());
    }
}

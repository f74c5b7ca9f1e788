use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use storefront_config::ApiConfig;
use storefront_model::{
    AutocompletePayload, Category, CategoryScope, RawSearchPayload,
};
use tracing::{debug, info, warn};

use crate::domains::search::error::{SearchError, SearchResult};
use crate::infra::services::api::{
    AutocompleteRequest, CatalogApi, ImageSearchRequest, TextSearchRequest,
};

const SEARCH_PATH: &str = "/products/search";
const IMAGE_SEARCH_PATH: &str = "/products/search-by-image";
const AUTOCOMPLETE_PATH: &str = "/products/search/autocomplete";
const CATEGORIES_PATH: &str = "/categories";

/// Error bodies are echoed into `SearchError::Http`; keep them short.
const MAX_ERROR_BODY: usize = 256;

/// HTTP client for the admin/catalog API.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("has_token", &self.token.is_some())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ApiClient {
    /// Build a client for `config`. `timeout` bounds every request; the
    /// coordinator enforces the same bound around the whole future.
    pub fn new(config: &ApiConfig, timeout: Duration) -> SearchResult<Self> {
        let base_url = config.base_url.as_str().trim_end_matches('/').to_string();
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|err| SearchError::InvalidRequest(err.to_string()))?;

        info!("[ApiClient] Catalog API at {}", base_url);

        Ok(Self {
            client,
            base_url,
            token: config.token.clone(),
            timeout,
        })
    }

    pub fn build_url(&self, path: impl AsRef<str>) -> String {
        let path = path.as_ref().trim_start_matches('/');
        format!("{}/{}", self.base_url, path)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.client.request(method, self.build_url(path));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode a JSON body, mapping every failure onto
    /// [`SearchError`].
    async fn execute_request<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> SearchResult<T> {
        let response = request
            .send()
            .await
            .map_err(|err| SearchError::from_reqwest(err, self.timeout))?;

        match response.status() {
            StatusCode::NO_CONTENT => Err(SearchError::Decode(
                "Empty response from server (204 No Content)".to_string(),
            )),
            status if status.is_success() => {
                let bytes = response
                    .bytes()
                    .await
                    .map_err(|err| SearchError::from_reqwest(err, self.timeout))?;
                serde_json::from_slice(&bytes)
                    .map_err(|err| SearchError::Decode(err.to_string()))
            }
            status => {
                let mut message = response
                    .text()
                    .await
                    .unwrap_or_else(|_| "Unknown error".to_string());
                if message.len() > MAX_ERROR_BODY {
                    let mut cut = MAX_ERROR_BODY;
                    while !message.is_char_boundary(cut) {
                        cut -= 1;
                    }
                    message.truncate(cut);
                }
                warn!("[ApiClient] Request failed with status {}", status);
                Err(SearchError::Http {
                    status: status.as_u16(),
                    message,
                })
            }
        }
    }
}

fn scoped_params(
    store_id: &Option<String>,
    category: &CategoryScope,
) -> Vec<(&'static str, String)> {
    let mut params = Vec::new();
    if let Some(store_id) = store_id {
        params.push(("storeId", store_id.clone()));
    }
    if let Some(category) = category.as_param() {
        params.push(("categoryId", category.to_string()));
    }
    params
}

/// `/categories` answers with a bare array on most stores and with a
/// wrapped one on older admin builds.
#[derive(Deserialize)]
#[serde(untagged)]
enum CategoriesPayload {
    Bare(Vec<Category>),
    Wrapped {
        #[serde(alias = "data")]
        categories: Vec<Category>,
    },
}

#[async_trait]
impl CatalogApi for ApiClient {
    async fn search_products(
        &self,
        request: &TextSearchRequest,
    ) -> SearchResult<RawSearchPayload> {
        debug!(
            "[ApiClient] search query={:?} page={} category={}",
            request.query, request.page, request.category
        );
        let mut params = vec![
            ("query", request.query.clone()),
            ("page", request.page.to_string()),
            ("limit", request.limit.to_string()),
        ];
        params.extend(scoped_params(&request.store_id, &request.category));

        let builder = self.request(Method::GET, SEARCH_PATH).query(&params);
        self.execute_request(builder).await
    }

    async fn search_by_image(
        &self,
        request: &ImageSearchRequest,
    ) -> SearchResult<RawSearchPayload> {
        debug!(
            "[ApiClient] image search {} bytes page={} category={}",
            request.image.bytes.len(),
            request.page,
            request.category
        );
        let part = Part::bytes(request.image.bytes.clone())
            .file_name(request.image.file_name.clone())
            .mime_str(&request.image.mime)
            .map_err(|err| SearchError::InvalidRequest(err.to_string()))?;

        let mut form = Form::new()
            .part("image", part)
            .text("page", request.page.to_string())
            .text("limit", request.limit.to_string());
        if let Some(category) = request.category.as_param() {
            form = form.text("categoryId", category.to_string());
        }

        let mut builder =
            self.request(Method::POST, IMAGE_SEARCH_PATH).multipart(form);
        if let Some(store_id) = &request.store_id {
            builder = builder.query(&[("storeId", store_id)]);
        }
        self.execute_request(builder).await
    }

    async fn autocomplete(
        &self,
        request: &AutocompleteRequest,
    ) -> SearchResult<AutocompletePayload> {
        let mut params = vec![
            ("query", request.query.clone()),
            ("limit", request.limit.to_string()),
        ];
        params.extend(scoped_params(&request.store_id, &request.category));

        let builder = self.request(Method::GET, AUTOCOMPLETE_PATH).query(&params);
        self.execute_request(builder).await
    }

    async fn categories(&self) -> SearchResult<Vec<Category>> {
        let builder = self.request(Method::GET, CATEGORIES_PATH);
        let payload: CategoriesPayload = self.execute_request(builder).await?;
        Ok(match payload {
            CategoriesPayload::Bare(categories) => categories,
            CategoriesPayload::Wrapped { categories } => categories,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    fn client(base: &str) -> ApiClient {
        let config = ApiConfig {
            base_url: Url::parse(base).unwrap(),
            store_id: None,
            token: Some("secret".into()),
        };
        ApiClient::new(&config, Duration::from_secs(10)).unwrap()
    }

    #[test]
    fn build_url_joins_without_double_slashes() {
        let api = client("https://admin.example.com/api/");
        assert_eq!(
            api.build_url("/products/search"),
            "https://admin.example.com/api/products/search"
        );

        let root = client("https://admin.example.com");
        assert_eq!(root.base_url(), "https://admin.example.com");
        assert_eq!(
            root.build_url("categories"),
            "https://admin.example.com/categories"
        );
    }

    #[test]
    fn debug_output_hides_the_token() {
        let rendered = format!("{:?}", client("https://admin.example.com"));
        assert!(rendered.contains("has_token: true"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn categories_accept_bare_and_wrapped_payloads() {
        let bare: CategoriesPayload =
            serde_json::from_str(r#"[{"id":"fonts","name":"Fonts"}]"#).unwrap();
        assert!(matches!(bare, CategoriesPayload::Bare(ref c) if c.len() == 1));

        let wrapped: CategoriesPayload =
            serde_json::from_str(r#"{"data":[{"id":1,"name":"Icons"}]}"#)
                .unwrap();
        assert!(matches!(
            wrapped,
            CategoriesPayload::Wrapped { ref categories } if categories[0].id.as_str() == "1"
        ));
    }
}

//! TMDB category oracle
//!
//! Resolves titles through `/search/movie` (first hit wins), reads genres from
//! `/movie/{id}` and lists genres from `/genre/movie/list`. Every request is
//! bounded by the client timeout; a timeout or non-success status surfaces as
//! `Error::Oracle`, which the query engine treats as a rejection.
use reelsim_core::{Category, CategoryOracle, CategorySet, Error, ExternalRecord, Result};
use reqwest::blocking::Client as HttpClient;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_URL: &str = "https://api.themoviedb.org/3";
pub const DEFAULT_IMAGE_URL: &str = "https://image.tmdb.org/t/p/w500";
pub const DEFAULT_LANGUAGE: &str = "en-US";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: String,
    pub api_url: String,
    pub image_url: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_url: DEFAULT_API_URL.to_string(),
            image_url: DEFAULT_IMAGE_URL.to_string(),
            language: DEFAULT_LANGUAGE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    id: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    poster_path: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GenresResponse {
    #[serde(default)]
    genres: Vec<Genre>,
}

#[derive(Debug, Deserialize)]
struct Genre {
    id: u64,
    name: String,
}

impl From<Genre> for Category {
    fn from(g: Genre) -> Self {
        Category { id: g.id, name: g.name }
    }
}

pub struct TmdbOracle {
    http_client: HttpClient,
    config: TmdbConfig,
}

impl TmdbOracle {
    pub fn new(config: TmdbConfig) -> Result<Self> {
        if config.api_key.trim().is_empty() {
            return Err(Error::InvalidConfig("TMDB api key is empty".to_string()));
        }
        let http_client = HttpClient::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Oracle(format!("cannot build HTTP client: {}", e)))?;

        tracing::info!(api_url = %config.api_url, timeout_secs = config.timeout_secs, "TMDB oracle ready");
        Ok(Self { http_client, config })
    }

    pub fn config(&self) -> &TmdbConfig {
        &self.config
    }

    /// Full-size poster URL for a resolved record
    pub fn poster_url(&self, record: &ExternalRecord) -> Option<String> {
        poster_url(&self.config.image_url, record)
    }

    fn get_json<T: DeserializeOwned>(&self, path: &str, params: &[(&str, &str)]) -> Result<T> {
        let url = format!("{}{}", self.config.api_url.trim_end_matches('/'), path);

        let response = self
            .http_client
            .get(&url)
            .query(&[("api_key", self.config.api_key.as_str())])
            .query(params)
            .send()
            .map_err(|e| Error::Oracle(format!("GET {} failed: {}", path, e)))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(Error::Oracle(format!("TMDB returned status {} for {}", status, path)));
        }

        response
            .json::<T>()
            .map_err(|e| Error::Oracle(format!("invalid TMDB response for {}: {}", path, e)))
    }
}

impl CategoryOracle for TmdbOracle {
    fn resolve(&self, title: &str) -> Result<Option<ExternalRecord>> {
        let search: SearchResponse = self.get_json("/search/movie", &[("query", title)])?;
        Ok(first_record(search))
    }

    fn categories_of(&self, record_id: &str) -> Result<CategorySet> {
        let path = format!("/movie/{}", record_id);
        let details: GenresResponse = self.get_json(&path, &[("language", self.config.language.as_str())])?;
        Ok(details.genres.into_iter().map(|g| g.id).collect())
    }

    fn categories(&self) -> Result<Vec<Category>> {
        let list: GenresResponse =
            self.get_json("/genre/movie/list", &[("language", self.config.language.as_str())])?;
        Ok(list.genres.into_iter().map(Category::from).collect())
    }

    fn name(&self) -> &'static str {
        "tmdb"
    }
}

fn first_record(search: SearchResponse) -> Option<ExternalRecord> {
    search.results.into_iter().next().map(|hit| ExternalRecord {
        id: hit.id.to_string(),
        title: hit.title,
        poster_path: hit.poster_path,
    })
}

/// Join an image base URL with a record's poster path
pub fn poster_url(image_url: &str, record: &ExternalRecord) -> Option<String> {
    record
        .poster_path
        .as_deref()
        .filter(|p| !p.is_empty())
        .map(|p| format!("{}{}", image_url.trim_end_matches('/'), p))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_search_hit_wins() {
        let body = r#"{"page":1,"results":[
            {"id":19995,"title":"Avatar","poster_path":"/kyeq.jpg","genre_ids":[28]},
            {"id":76600,"title":"Avatar: The Way of Water","poster_path":null}
        ]}"#;
        let search: SearchResponse = serde_json::from_str(body).unwrap();
        let record = first_record(search).unwrap();
        assert_eq!(record.id, "19995");
        assert_eq!(record.poster_path.as_deref(), Some("/kyeq.jpg"));
    }

    #[test]
    fn test_no_hits_is_not_found() {
        let search: SearchResponse = serde_json::from_str(r#"{"results":[]}"#).unwrap();
        assert!(first_record(search).is_none());
        let search: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(first_record(search).is_none());
    }

    #[test]
    fn test_genre_decoding() {
        let body = r#"{"id":19995,"genres":[{"id":28,"name":"Action"},{"id":878,"name":"Science Fiction"}]}"#;
        let details: GenresResponse = serde_json::from_str(body).unwrap();
        let categories: Vec<Category> = details.genres.into_iter().map(Category::from).collect();
        assert_eq!(categories[1], Category { id: 878, name: "Science Fiction".to_string() });
    }

    #[test]
    fn test_poster_url() {
        let record = ExternalRecord {
            id: "1".to_string(),
            title: "x".to_string(),
            poster_path: Some("/p.jpg".to_string()),
        };
        assert_eq!(
            poster_url(DEFAULT_IMAGE_URL, &record).as_deref(),
            Some("https://image.tmdb.org/t/p/w500/p.jpg")
        );
        let bare = ExternalRecord { poster_path: None, ..record };
        assert!(poster_url(DEFAULT_IMAGE_URL, &bare).is_none());
    }

    #[test]
    fn test_empty_api_key_rejected() {
        assert!(matches!(TmdbOracle::new(TmdbConfig::default()), Err(Error::InvalidConfig(_))));
    }

    mod http {
        use super::*;
        use reelsim_core::{
            CandidateFilter, Catalog, CatalogRecord, CategoryFilter, EngineConfig, Item, QueryEngine,
            SimilarityMatrix, SimilarityStore,
        };
        use std::sync::Arc;
        use wiremock::{matchers, Mock, MockServer, ResponseTemplate};

        const API_KEY: &str = "test-key";

        fn config(server: &MockServer, timeout_secs: u64) -> TmdbConfig {
            TmdbConfig {
                api_key: API_KEY.to_string(),
                api_url: server.uri(),
                timeout_secs,
                ..TmdbConfig::default()
            }
        }

        // The blocking client must be built, used and dropped off the async runtime
        async fn with_oracle<T, F>(config: TmdbConfig, f: F) -> T
        where
            T: Send + 'static,
            F: FnOnce(TmdbOracle) -> T + Send + 'static,
        {
            tokio::task::spawn_blocking(move || f(TmdbOracle::new(config).unwrap()))
                .await
                .unwrap()
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_search_sends_key_and_query() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/search/movie"))
                .and(matchers::query_param("api_key", API_KEY))
                .and(matchers::query_param("query", "Avatar"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "page": 1,
                    "results": [{"id": 19995, "title": "Avatar", "poster_path": "/kyeq.jpg"}]
                })))
                .expect(1)
                .mount(&server)
                .await;

            let record = with_oracle(config(&server, 5), |o| o.resolve("Avatar")).await.unwrap();
            let record = record.unwrap();
            assert_eq!(record.id, "19995");
            assert_eq!(record.poster_path.as_deref(), Some("/kyeq.jpg"));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_empty_search_is_not_found() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/search/movie"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "page": 1,
                    "results": []
                })))
                .mount(&server)
                .await;

            let record = with_oracle(config(&server, 5), |o| o.resolve("Nothing Like It")).await;
            assert!(record.unwrap().is_none());
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_details_and_genre_list_send_language() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/movie/19995"))
                .and(matchers::query_param("api_key", API_KEY))
                .and(matchers::query_param("language", DEFAULT_LANGUAGE))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "id": 19995,
                    "genres": [{"id": 28, "name": "Action"}, {"id": 878, "name": "Science Fiction"}]
                })))
                .mount(&server)
                .await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/genre/movie/list"))
                .and(matchers::query_param("language", DEFAULT_LANGUAGE))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "genres": [{"id": 16, "name": "Animation"}]
                })))
                .mount(&server)
                .await;

            let (genres, listing) = with_oracle(config(&server, 5), |o| {
                (o.categories_of("19995"), o.categories())
            })
            .await;
            let genres = genres.unwrap();
            assert!(genres.contains(&28) && genres.contains(&878));
            assert_eq!(listing.unwrap(), vec![Category { id: 16, name: "Animation".to_string() }]);
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_server_error_is_oracle_error() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&server)
                .await;

            let (search, listing) =
                with_oracle(config(&server, 5), |o| (o.resolve("Avatar"), o.categories())).await;
            assert!(matches!(search, Err(Error::Oracle(_))));
            assert!(matches!(listing, Err(Error::Oracle(_))));
        }

        #[tokio::test(flavor = "multi_thread")]
        async fn test_timeout_rejects_candidate() {
            let server = MockServer::start().await;
            Mock::given(matchers::method("GET"))
                .and(matchers::path("/search/movie"))
                .respond_with(
                    ResponseTemplate::new(200)
                        .set_body_json(serde_json::json!({"results": [{"id": 1, "title": "Slow"}]}))
                        .set_delay(Duration::from_secs(3)),
                )
                .mount(&server)
                .await;

            let (lookup, accepted, recs) = with_oracle(config(&server, 1), |oracle| {
                let lookup = oracle.resolve("Slow");

                let filter = CategoryFilter::new(oracle, 28);
                let slow = Item { index: 1, id: "1".to_string(), title: "Slow".to_string() };
                let accepted = filter.evaluate(&slow);

                let records = [CatalogRecord::new("0", "Fast", None), CatalogRecord::new("1", "Slow", None)];
                let matrix = SimilarityMatrix::from_rows(vec![vec![1.0, 0.4], vec![0.4, 1.0]]).unwrap();
                let store = SimilarityStore::new(Catalog::from_records(&records), matrix).unwrap();
                let engine = QueryEngine::new(Arc::new(store), EngineConfig::default()).unwrap();
                let recs = engine.recommend(0, 1, Some(&filter)).unwrap();
                (lookup, accepted, recs)
            })
            .await;

            assert!(matches!(lookup, Err(Error::Oracle(_))));
            assert!(matches!(accepted, Err(Error::Oracle(_))));
            assert!(recs.is_empty());
            assert_eq!(recs.failed, 1);
        }
    }
}

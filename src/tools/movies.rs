//! The movie guide's tools.
//!
//! Listings and reviews come from the TMDB v3 API and suspend on HTTP.
//! Showtimes, purchase and confirmation are synchronous [`FnTool`]s that
//! only shape text for the model.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::{Arguments, FnTool, Parameter, Tool, ToolRegistry};
use crate::config::TmdbConfig;
use crate::constants::{TMDB_MAX_REVIEWS, TMDB_REVIEW_MAX_CHARS};

const SHOWTIME_PARAMS: &[Parameter] = &[
    Parameter {
        name: "title",
        description: "Title of the movie",
    },
    Parameter {
        name: "location",
        description: "City or ZIP code to search near",
    },
];

const PURCHASE_PARAMS: &[Parameter] = &[
    Parameter {
        name: "theater",
        description: "Name of the theater",
    },
    Parameter {
        name: "movie",
        description: "Title of the movie",
    },
    Parameter {
        name: "showtime",
        description: "Showtime to book, as shown in the listing",
    },
];

const REVIEW_PARAMS: &[Parameter] = &[Parameter {
    name: "movie_id",
    description: "TMDB id of the movie, as returned by get_now_playing_movies",
}];

/// Registers all five movie tools.
pub fn register_all(registry: &mut ToolRegistry, tmdb: &TmdbConfig) -> Result<()> {
    let client = TmdbClient::from_config(tmdb);
    registry.register(NowPlayingTool {
        client: client.clone(),
    })?;
    registry.register(FnTool::new(
        "get_showtimes",
        "Get showtimes for a specific movie at a given location",
        SHOWTIME_PARAMS,
        showtimes,
    ))?;
    registry.register(FnTool::new(
        "buy_ticket",
        "Purchase a ticket for a specific movie showing",
        PURCHASE_PARAMS,
        buy_ticket,
    ))?;
    registry.register(ReviewsTool { client })?;
    registry.register(FnTool::new(
        "confirm_ticket_purchase",
        "Confirm the details with the user before purchasing the ticket",
        PURCHASE_PARAMS,
        confirm_ticket_purchase,
    ))?;
    Ok(())
}

/// Reads a required string argument.
fn required<'a>(args: &'a Arguments, key: &str) -> Result<&'a str> {
    match args.get(key) {
        Some(Value::String(s)) if !s.trim().is_empty() => Ok(s.trim()),
        Some(other) => anyhow::bail!("argument '{}' must be a non-empty string, got {}", key, other),
        None => anyhow::bail!("missing required argument '{}'", key),
    }
}

fn showtimes(args: &Arguments) -> Result<String> {
    let title = required(args, "title")?;
    let location = required(args, "location")?;
    Ok(format!(
        "No live showtime feed is connected for {location}. \
Suggest that the user check local theater listings for \"{title}\", \
then offer to book a ticket once they pick a theater and time."
    ))
}

fn buy_ticket(args: &Arguments) -> Result<String> {
    let theater = required(args, "theater")?;
    let movie = required(args, "movie")?;
    let showtime = required(args, "showtime")?;
    Ok(format!(
        "Ticket purchased for {movie} at {theater} for {showtime}."
    ))
}

fn confirm_ticket_purchase(args: &Arguments) -> Result<String> {
    let theater = required(args, "theater")?;
    let movie = required(args, "movie")?;
    let showtime = required(args, "showtime")?;
    Ok(format!(
        "Ask the user to confirm before buying: one ticket for {movie} at {theater}, \
showtime {showtime}. Only call buy_ticket after they agree."
    ))
}

/// Minimal TMDB v3 client.
#[derive(Clone)]
pub struct TmdbClient {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct Page<T> {
    results: Vec<T>,
}

#[derive(Deserialize)]
struct MovieSummary {
    id: u64,
    title: String,
    #[serde(default)]
    release_date: String,
    #[serde(default)]
    overview: String,
}

#[derive(Deserialize)]
struct Review {
    author: String,
    content: String,
}

impl TmdbClient {
    pub fn from_config(config: &TmdbConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: config.base_url().trim_end_matches('/').to_string(),
            api_key: config.api_key.clone().filter(|k| !k.is_empty()),
        }
    }

    fn url(&self, path: &str) -> Result<String> {
        let key = self
            .api_key
            .as_deref()
            .context("TMDB API key is not configured. Set TMDB_API_KEY or [tmdb] api_key")?;
        Ok(format!(
            "{}{}?api_key={}&language=en-US&page=1",
            self.base_url, path, key
        ))
    }

    async fn get<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<Page<T>> {
        let url = self.url(path)?;
        // The key travels in the query string, so errors must not echo the URL.
        let page = self
            .http
            .get(url)
            .send()
            .await
            .and_then(reqwest::Response::error_for_status)
            .map_err(reqwest::Error::without_url)
            .with_context(|| format!("TMDB request to {} failed", path))?
            .json::<Page<T>>()
            .await
            .map_err(reqwest::Error::without_url)
            .context("Failed to parse TMDB response")?;
        Ok(page)
    }
}

struct NowPlayingTool {
    client: TmdbClient,
}

#[async_trait::async_trait]
impl Tool for NowPlayingTool {
    fn name(&self) -> &str {
        "get_now_playing_movies"
    }

    fn description(&self) -> &str {
        "Get a list of movies currently playing in theaters"
    }

    fn parameters(&self) -> &[Parameter] {
        &[]
    }

    async fn call(&self, _args: Arguments) -> Result<String> {
        let page: Page<MovieSummary> = self.client.get("/movie/now_playing").await?;
        if page.results.is_empty() {
            return Ok("No movies are listed as now playing.".to_string());
        }
        let listing = page
            .results
            .iter()
            .map(|m| {
                format!(
                    "Title: {}\nMovie ID: {}\nRelease Date: {}\nOverview: {}",
                    m.title, m.id, m.release_date, m.overview
                )
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(format!("Now Playing Movies:\n\n{}", listing))
    }
}

struct ReviewsTool {
    client: TmdbClient,
}

#[async_trait::async_trait]
impl Tool for ReviewsTool {
    fn name(&self) -> &str {
        "get_reviews"
    }

    fn description(&self) -> &str {
        "Get recent reviews for a specific movie"
    }

    fn parameters(&self) -> &[Parameter] {
        REVIEW_PARAMS
    }

    async fn call(&self, args: Arguments) -> Result<String> {
        let movie_id = match args.get("movie_id") {
            Some(Value::Number(n)) => n.to_string(),
            _ => required(&args, "movie_id")?.to_string(),
        };
        anyhow::ensure!(
            movie_id.chars().all(|c| c.is_ascii_digit()),
            "movie_id must be numeric, got '{}'",
            movie_id
        );
        let page: Page<Review> = self
            .client
            .get(&format!("/movie/{}/reviews", movie_id))
            .await?;
        if page.results.is_empty() {
            return Ok(format!("No reviews found for movie {}.", movie_id));
        }
        let reviews = page
            .results
            .iter()
            .take(TMDB_MAX_REVIEWS)
            .map(|r| {
                let excerpt: String = r.content.chars().take(TMDB_REVIEW_MAX_CHARS).collect();
                format!("Author: {}\nReview: {}", r.author, excerpt)
            })
            .collect::<Vec<_>>()
            .join("\n\n");
        Ok(format!("Reviews:\n\n{}", reviews))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::{ToolInvocationRequest, ToolInvoker, ToolRegistry};
    use serde_json::json;

    fn args(value: Value) -> Arguments {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn purchase_requires_all_fields() {
        let err = buy_ticket(&args(json!({"theater": "Rex", "movie": "Dune"}))).unwrap_err();
        assert!(err.to_string().contains("showtime"));

        let ok = buy_ticket(&args(
            json!({"theater": "Rex", "movie": "Dune", "showtime": "19:30"}),
        ))
        .unwrap();
        assert_eq!(ok, "Ticket purchased for Dune at Rex for 19:30.");
    }

    #[test]
    fn non_string_argument_is_rejected() {
        let err = showtimes(&args(json!({"title": 3, "location": "Oslo"}))).unwrap_err();
        assert!(err.to_string().contains("non-empty string"));
    }

    #[tokio::test]
    async fn tmdb_tools_fail_without_key() {
        let client = TmdbClient::from_config(&TmdbConfig::default());
        let tool = NowPlayingTool { client };
        let err = tool.call(Arguments::new()).await.unwrap_err();
        assert!(err.to_string().contains("TMDB API key"));
    }

    #[tokio::test]
    async fn request_failure_does_not_expose_key() {
        let config = TmdbConfig {
            api_key: Some("SECRETKEY123".into()),
            base_url: Some("http://127.0.0.1:9".into()),
        };
        let mut registry = ToolRegistry::new();
        register_all(&mut registry, &config).unwrap();
        let invoker = ToolInvoker::new(&registry, std::time::Duration::from_secs(10));
        let request = ToolInvocationRequest {
            name: "get_now_playing_movies".into(),
            raw_arguments: Arguments::new(),
        };

        let result = invoker.invoke(request).await;

        assert!(result.is_failure());
        assert!(result.content().contains("/movie/now_playing"));
        assert!(!result.content().contains("SECRETKEY123"), "{}", result.content());
    }

    #[tokio::test]
    async fn reviews_reject_non_numeric_id() {
        let config = TmdbConfig {
            api_key: Some("k".into()),
            base_url: None,
        };
        let tool = ReviewsTool {
            client: TmdbClient::from_config(&config),
        };
        let err = tool
            .call(args(json!({"movie_id": "../secrets"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("numeric"));
    }
}

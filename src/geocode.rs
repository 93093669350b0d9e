//! City lookup against the Open-Meteo geocoding API

use crate::{config::Config, location::Location};
use anyhow::Context;
use log::{debug, info};
use serde::Deserialize;

/// Anything that can turn a free-text city name into candidates
pub trait CityLookup: Send + Sync {
    fn search(&self, query: &str) -> anyhow::Result<Vec<Candidate>>;
}

/// HTTP client for the geocoding API
pub struct Geocoder {
    agent: ureq::Agent,
    url: String,
    result_count: u32,
    language: String,
}

impl Geocoder {
    pub fn new(config: &Config) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(config.request_timeout())
            .build();
        Self {
            agent,
            url: format!(
                "{}/v1/search",
                config.geocoding_host.trim_end_matches('/')
            ),
            result_count: config.result_count,
            language: config.language.clone(),
        }
    }
}

impl CityLookup for Geocoder {
    fn search(&self, query: &str) -> anyhow::Result<Vec<Candidate>> {
        info!("Searching for cities matching {query:?}");
        let response = self
            .agent
            .get(&self.url)
            .query("name", query)
            .query("count", &self.result_count.to_string())
            .query("language", &self.language)
            .query("format", "json")
            .call()
            .with_context(|| format!("Error searching cities at {}", self.url))?;
        let body: SearchResponse = response
            .into_json()
            .context("Error parsing search response as JSON")?;
        debug!("Got {} candidate(s)", body.results.len());
        Ok(body.results)
    }
}

/// https://open-meteo.com/en/docs/geocoding-api
#[derive(Debug, Deserialize)]
struct SearchResponse {
    /// The API omits this entirely when nothing matched
    #[serde(default)]
    results: Vec<Candidate>,
}

/// One search hit
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Candidate {
    pub name: String,
    /// First-level administrative region (state, province, ...)
    pub admin1: Option<String>,
    pub country: Option<String>,
    pub timezone: Option<String>,
}

impl Candidate {
    /// Subtitle shown under the name in the result list
    pub fn region(&self) -> String {
        format!(
            "{}, {}",
            self.admin1.as_deref().unwrap_or_default(),
            self.country.as_deref().unwrap_or_default()
        )
    }

    pub fn to_location(&self) -> Location {
        Location::new(
            self.name.clone(),
            self.country.clone(),
            self.timezone.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::{
        io::{BufRead, BufReader, Write},
        net::TcpListener,
        sync::mpsc::{self, Receiver},
        thread,
    };

    /// Answer a single HTTP request on a local port with a canned response.
    /// Returns the host to point the geocoder at, and a channel that gets the
    /// request line once it's been read.
    fn serve_once(status: &str, body: &str) -> (String, Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let host = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
            Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let (sender, receiver) = mpsc::channel();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            // Drain headers, there's no request body on a GET
            let mut header = String::new();
            while reader.read_line(&mut header).unwrap() > 0 && header != "\r\n"
            {
                header.clear();
            }
            stream.write_all(response.as_bytes()).unwrap();
            let _ = sender.send(request_line.trim_end().to_owned());
        });
        (host, receiver)
    }

    fn geocoder(host: String) -> Geocoder {
        Geocoder::new(&Config {
            geocoding_host: host,
            ..Config::default()
        })
    }

    #[test]
    fn test_parse_response() {
        let body: SearchResponse = serde_json::from_str(
            r#"{
                "results": [
                    {
                        "id": 2988507,
                        "name": "Paris",
                        "latitude": 48.85341,
                        "longitude": 2.3488,
                        "country_code": "FR",
                        "admin1": "Île-de-France",
                        "timezone": "Europe/Paris",
                        "country": "France"
                    },
                    {"id": 1, "name": "Paris Island"}
                ],
                "generationtime_ms": 0.9
            }"#,
        )
        .unwrap();

        assert_eq!(body.results.len(), 2);
        let paris = &body.results[0];
        assert_eq!(paris.region(), "Île-de-France, France");
        assert_eq!(
            paris.to_location(),
            Location::new(
                "Paris",
                Some("France".into()),
                Some("Europe/Paris".into())
            )
        );

        let island = &body.results[1];
        assert_eq!(island.region(), ", ");
        assert_eq!(island.to_location(), Location::new("Paris Island", None, None));
    }

    #[test]
    fn test_parse_no_results() {
        let body: SearchResponse =
            serde_json::from_str(r#"{"generationtime_ms": 0.2}"#).unwrap();
        assert!(body.results.is_empty());
    }

    #[test]
    fn test_url() {
        let geocoder = Geocoder::new(&Config {
            geocoding_host: "http://localhost:8080/".into(),
            ..Config::default()
        });
        assert_eq!(geocoder.url, "http://localhost:8080/v1/search");
    }

    #[test]
    fn test_search() {
        let (host, request) = serve_once(
            "200 OK",
            r#"{"results": [{"name": "Paris", "country": "France",
                "admin1": "Île-de-France", "timezone": "Europe/Paris"}]}"#,
        );
        let candidates = geocoder(host).search("Paris").unwrap();
        assert_eq!(
            candidates,
            vec![Candidate {
                name: "Paris".into(),
                admin1: Some("Île-de-France".into()),
                country: Some("France".into()),
                timezone: Some("Europe/Paris".into()),
            }]
        );

        let request = request.recv().unwrap();
        assert!(request.starts_with("GET /v1/search?"), "{request}");
        for param in ["name=Paris", "count=10", "language=en", "format=json"] {
            assert!(request.contains(param), "{param} missing from {request}");
        }
    }

    #[test]
    fn test_search_no_results() {
        let (host, _request) = serve_once("200 OK", r#"{"generationtime_ms": 0.2}"#);
        assert!(geocoder(host).search("Atlantis").unwrap().is_empty());
    }

    #[test]
    fn test_search_error_status() {
        let (host, _request) =
            serve_once("500 Internal Server Error", r#"{"error": true}"#);
        assert!(geocoder(host).search("Paris").is_err());
    }
}

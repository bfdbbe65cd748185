use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use url::Url;

use crate::dictionary::{EntryBody, NotFoundError, Word};
use crate::lookup::DictionarySource;
use crate::DictionaryError;

pub const FREE_DICTIONARY_API_URL: &str = "https://api.dictionaryapi.dev/api/v2/entries/en";
pub const DEFAULT_DICTIONARY_TIMEOUT: Duration = Duration::from_secs(8);
pub const USER_AGENT: &str = concat!("vocab-vault/", env!("CARGO_PKG_VERSION"));

/// Builds `<endpoint>/<term>` with the term percent-encoded as one path segment.
pub(crate) fn entry_url(endpoint: &Url, word: &str) -> Result<Url, DictionaryError> {
    let mut url = endpoint.clone();
    url.path_segments_mut()
        .map_err(|_| DictionaryError::InvalidEndpoint(endpoint.to_string()))?
        .pop_if_empty()
        .push(word);
    Ok(url)
}

pub(crate) async fn get_definition(
    client: &reqwest::Client,
    endpoint: &Url,
    word: &str,
) -> Result<Word, DictionaryError> {
    let url = entry_url(endpoint, word)?;
    let res = client
        .get(url)
        .send()
        .await
        .map_err(DictionaryError::Fetch)?;
    match res.status() {
        StatusCode::OK => {}
        StatusCode::NOT_FOUND => {
            let body = res.json::<NotFoundError>().await.unwrap_or_default();
            return Err(DictionaryError::NotFound(body));
        }
        status => return Err(DictionaryError::Status(status.as_u16())),
    }
    res.json::<EntryBody>()
        .await
        .map_err(DictionaryError::Deserialize)?
        .into_first()
        .ok_or_else(|| DictionaryError::NotFound(NotFoundError::default()))
}

/// Client for the free dictionary service.
pub struct Dictionary {
    client: reqwest::Client,
    endpoint: Url,
}

impl Dictionary {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, DictionaryError> {
        let endpoint = Url::parse(endpoint)
            .ok()
            .filter(|url| !url.cannot_be_a_base())
            .ok_or_else(|| DictionaryError::InvalidEndpoint(endpoint.to_string()))?;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(DictionaryError::Client)?;
        Ok(Self { client, endpoint })
    }

    pub async fn get_definition(&self, word: &str) -> Result<Word, DictionaryError> {
        get_definition(&self.client, &self.endpoint, word).await
    }
}

#[async_trait]
impl DictionarySource for Dictionary {
    async fn fetch_entry(&self, word: &str) -> Result<Word, DictionaryError> {
        self.get_definition(word).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_server::{serve_once, Canned};

    #[test]
    fn term_is_a_single_encoded_segment() {
        let endpoint = Url::parse(FREE_DICTIONARY_API_URL).unwrap();
        assert_eq!(
            entry_url(&endpoint, "hello").unwrap().as_str(),
            "https://api.dictionaryapi.dev/api/v2/entries/en/hello"
        );
        assert_eq!(
            entry_url(&endpoint, "a/b?c#d e").unwrap().as_str(),
            "https://api.dictionaryapi.dev/api/v2/entries/en/a%2Fb%3Fc%23d%20e"
        );
    }

    #[test]
    fn trailing_slash_on_endpoint_is_tolerated() {
        let endpoint = Url::parse("http://localhost:9000/entries/en/").unwrap();
        assert_eq!(
            entry_url(&endpoint, "word").unwrap().as_str(),
            "http://localhost:9000/entries/en/word"
        );
    }

    #[test]
    fn rejects_endpoints_that_cannot_take_a_path() {
        assert!(matches!(
            Dictionary::new("mailto:someone@example.com", DEFAULT_DICTIONARY_TIMEOUT),
            Err(DictionaryError::InvalidEndpoint(_))
        ));
    }

    fn dictionary_at(base: &str, timeout: Duration) -> Dictionary {
        Dictionary::new(&format!("{base}/api/v2/entries/en"), timeout).unwrap()
    }

    #[tokio::test]
    async fn first_entry_of_a_list_is_returned() {
        let (base, request) = serve_once(Canned::json(
            "200 OK",
            r#"[{"word": "hello", "meanings": []}, {"word": "hellos"}]"#,
        ))
        .await;
        let dictionary = dictionary_at(&base, DEFAULT_DICTIONARY_TIMEOUT);

        let word = dictionary.get_definition("hello").await.unwrap();
        assert_eq!(word.word, "hello");

        let request = request.await.unwrap().to_ascii_lowercase();
        assert!(request.starts_with("get /api/v2/entries/en/hello http/1.1"));
        assert!(request.contains(&format!("user-agent: {}", USER_AGENT.to_ascii_lowercase())));
    }

    #[tokio::test]
    async fn phrase_is_sent_as_one_segment() {
        let (base, request) = serve_once(Canned::json("200 OK", r#"{"word": "break a leg"}"#)).await;
        let dictionary = dictionary_at(&base, DEFAULT_DICTIONARY_TIMEOUT);

        assert_eq!(
            dictionary.get_definition("break a leg").await.unwrap().word,
            "break a leg"
        );
        assert!(request
            .await
            .unwrap()
            .starts_with("GET /api/v2/entries/en/break%20a%20leg HTTP/1.1"));
    }

    #[tokio::test]
    async fn empty_list_is_not_found() {
        let (base, _request) = serve_once(Canned::json("200 OK", "[]")).await;
        let dictionary = dictionary_at(&base, DEFAULT_DICTIONARY_TIMEOUT);
        assert!(matches!(
            dictionary.get_definition("zzzz").await,
            Err(DictionaryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn not_found_payload_is_kept() {
        let (base, _request) = serve_once(Canned::json(
            "404 Not Found",
            r#"{"title": "No Definitions Found", "message": "Sorry pal"}"#,
        ))
        .await;
        let dictionary = dictionary_at(&base, DEFAULT_DICTIONARY_TIMEOUT);
        match dictionary.get_definition("zzzz").await {
            Err(DictionaryError::NotFound(body)) => {
                assert_eq!(body.title, "No Definitions Found");
                assert_eq!(body.message, "Sorry pal");
            }
            other => panic!("expected not found, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn not_found_with_html_body_is_still_not_found() {
        let (base, _request) =
            serve_once(Canned::html("404 Not Found", "<html>nope</html>")).await;
        let dictionary = dictionary_at(&base, DEFAULT_DICTIONARY_TIMEOUT);
        assert!(matches!(
            dictionary.get_definition("zzzz").await,
            Err(DictionaryError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn other_status_is_reported() {
        let (base, _request) =
            serve_once(Canned::html("503 Service Unavailable", "down")).await;
        let dictionary = dictionary_at(&base, DEFAULT_DICTIONARY_TIMEOUT);
        assert!(matches!(
            dictionary.get_definition("hello").await,
            Err(DictionaryError::Status(503))
        ));
    }

    #[tokio::test]
    async fn slow_service_times_out() {
        let (base, _request) = serve_once(
            Canned::json("200 OK", r#"{"word": "late"}"#).delayed(Duration::from_millis(1500)),
        )
        .await;
        let dictionary = dictionary_at(&base, Duration::from_millis(200));
        match dictionary.get_definition("late").await {
            Err(DictionaryError::Fetch(err)) => assert!(err.is_timeout()),
            other => panic!("expected timeout, got {other:?}"),
        }
    }
}

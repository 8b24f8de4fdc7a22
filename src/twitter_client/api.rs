use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Envelope of a v2 search response. `data` is left out entirely when nothing matched.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Response<Data> {
    pub data: Option<Data>,
    pub meta: Option<Meta>,
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Meta {
    pub next_token: Option<String>,
    #[serde(default)]
    pub result_count: i64,
    pub newest_id: Option<String>,
    pub oldest_id: Option<String>,
}

/// One search hit, as much of it as the pipeline asks for.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tweet {
    pub id: Option<String>,
    #[serde(default)]
    pub text: String,
    pub created_at: Option<DateTime<Utc>>,
    pub author_id: Option<String>,
}

impl Tweet {
    pub fn from_text(text: &str) -> Self {
        Self {
            id: None,
            text: text.to_string(),
            created_at: None,
            author_id: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_page() {
        let body = r#"{
            "data": [
                {"id": "1", "text": "hello", "created_at": "2024-03-01T12:00:00.000Z", "author_id": "42"},
                {"id": "2", "text": "world"}
            ],
            "meta": {"newest_id": "2", "oldest_id": "1", "result_count": 2, "next_token": "abc"}
        }"#;
        let resp: Response<Vec<Tweet>> = serde_json::from_str(body).unwrap();
        let tweets = resp.data.unwrap();
        assert_eq!(tweets.len(), 2);
        assert_eq!(tweets[0].author_id.as_deref(), Some("42"));
        assert!(tweets[0].created_at.is_some());
        assert_eq!(tweets[1].created_at, None);
        assert_eq!(resp.meta.unwrap().next_token.as_deref(), Some("abc"));
    }

    #[test]
    fn test_parse_empty_result() {
        let body = r#"{"meta": {"result_count": 0}}"#;
        let resp: Response<Vec<Tweet>> = serde_json::from_str(body).unwrap();
        assert!(resp.data.is_none());
        assert_eq!(resp.meta.unwrap().next_token, None);
    }
}

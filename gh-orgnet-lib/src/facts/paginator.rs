//! Page-by-page traversal of list endpoints.

use crate::facts::client::{Client, FetchError, NextPage};
use futures_util::stream::{self, Stream, TryStreamExt};
use ohno::app_err;
use serde_json::Value;

/// Lazily stream every record of a paginated list endpoint.
///
/// Pages are requested with `per_page` and `page` query parameters, starting at page 1.
/// The stream ends on the first empty page, or after a page whose `Link` header does not
/// announce a next page. A failed request is yielded as the last item of the stream.
pub fn paginate<'a>(client: &'a Client, endpoint: &'a str) -> impl Stream<Item = Result<Value, FetchError>> + 'a {
    stream::try_unfold(Some(1_u32), move |cursor| async move {
        let Some(page_number) = cursor else {
            return Ok(None);
        };

        let query = [("per_page", client.per_page().to_string()), ("page", page_number.to_string())];
        let page = client.fetch(endpoint, &query).await?;

        let items = match page.body {
            Value::Null => return Ok(None),
            Value::Array(items) => items,
            other => {
                return Err(FetchError::http(
                    &page.url,
                    None,
                    app_err!("expected a JSON array of records, got {}", json_kind(&other)),
                ));
            }
        };

        if items.is_empty() {
            return Ok(None);
        }

        let next = match page.next {
            NextPage::Last => None,
            NextPage::Linked | NextPage::Unknown => Some(page_number + 1),
        };

        Ok(Some((items, next)))
    })
    .map_ok(|items| stream::iter(items.into_iter().map(Ok)))
    .try_flatten()
}

/// Collect every record of a paginated endpoint, or the first failure.
pub async fn fetch_all(client: &Client, endpoint: &str) -> Result<Vec<Value>, FetchError> {
    paginate(client, endpoint).try_collect().await
}

const fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_kind() {
        assert_eq!(json_kind(&serde_json::json!({ "message": "oops" })), "an object");
        assert_eq!(json_kind(&serde_json::json!("text")), "a string");
        assert_eq!(json_kind(&Value::Null), "null");
    }
}

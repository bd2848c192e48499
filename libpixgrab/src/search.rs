use crate::config::{Color, FetchConfig};
use crate::errors::PixgrabError;
use reqwest::Client;
use serde::Deserialize;
use url::Url;

/// One photo record from the search endpoint. Only the identifier and the
/// webformat rendition link are consumed, everything else is ignored.
#[derive(Debug, Clone, Deserialize)]
pub struct Hit {
    pub id: u64,
    #[serde(rename = "webformatURL")]
    pub webformat_url: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    pub hits: Vec<Hit>,
}

pub(crate) fn search_url(config: &FetchConfig, color: Color) -> Url {
    let mut url = config.endpoint.clone();
    url.query_pairs_mut()
        .append_pair("key", &config.api_key)
        .append_pair("image_type", "photo")
        .append_pair("colors", color.as_str())
        .append_pair("per_page", &config.per_page.to_string());
    url
}

/// Fetches one page of photo hits for a single color.
#[tracing::instrument(skip(client, config))]
pub(crate) async fn search_color(
    client: &Client,
    config: &FetchConfig,
    color: Color,
) -> Result<Vec<Hit>, PixgrabError> {
    let url = search_url(config, color);

    let response = match client.get(url.clone()).send().await {
        Err(e) => {
            tracing::error!("Error querying search endpoint for {}", color);
            tracing::error!("{}", e);
            return Err(PixgrabError::NetworkError(e.to_string()));
        }
        Ok(r) => r,
    };

    if !response.status().is_success() {
        tracing::error!(
            "Error status code received : {} |{}|",
            response.status(),
            color
        );
        return Err(PixgrabError::ErrorStatusCode {
            status_code: response.status().to_string(),
            url: url.to_string(),
        });
    }

    match response.json::<SearchResponse>().await {
        Err(e) => {
            tracing::error!("Error parsing search response for {}", color);
            tracing::error!("{}", e);
            Err(PixgrabError::InvalidResponseBody {
                url: url.to_string(),
                message: e.to_string(),
            })
        }
        Ok(body) => {
            tracing::debug!("{} hits for {}", body.hits.len(), color);
            Ok(body.hits)
        }
    }
}

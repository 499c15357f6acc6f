//! Storefront GraphQL client.
//!
//! One query against the shop's Storefront API, mapped into the flat
//! catalog projection. An unconfigured storefront is a valid state: the
//! client answers with an empty result and a note instead of failing, so
//! the rest of the pipeline keeps working in demo deployments.

use async_trait::async_trait;
use secrecy::ExposeSecret;
use serde_json::{json, Value};

use tendero_core::config::CatalogConfig;
use tendero_core::traits::CatalogSearch;
use tendero_core::{CatalogItem, CatalogVariant, Error, Result, SearchOutcome};

/// Product search document: up to 5 products, 1 image and 10 variants each.
const PRODUCT_SEARCH_QUERY: &str = r#"
query SearchProducts($query: String!) {
  products(first: 5, query: $query) {
    edges {
      node {
        title
        handle
        onlineStoreUrl
        images(first: 1) { edges { node { url } } }
        variants(first: 10) {
          edges {
            node {
              title
              availableForSale
              price { amount currencyCode }
            }
          }
        }
      }
    }
  }
}
"#;

pub struct StorefrontClient {
    http: reqwest::Client,
    cfg: CatalogConfig,
}

impl StorefrontClient {
    pub fn new(cfg: CatalogConfig, http: reqwest::Client) -> Self {
        Self { http, cfg }
    }

    fn endpoint(&self, shop_domain: &str) -> String {
        format!(
            "https://{}/api/{}/graphql.json",
            shop_domain, self.cfg.api_version
        )
    }
}

#[async_trait]
impl CatalogSearch for StorefrontClient {
    async fn search(&self, query: &str) -> Result<SearchOutcome> {
        let (Some(shop_domain), Some(token)) =
            (&self.cfg.shop_domain, &self.cfg.storefront_token)
        else {
            tracing::info!("Storefront credentials not configured, returning empty result");
            return Ok(SearchOutcome {
                results: Vec::new(),
                note: Some(
                    "catalog search is not configured; set the shop domain and storefront token"
                        .into(),
                ),
            });
        };

        tracing::debug!(query = %query, shop = %shop_domain, "Searching catalog");

        let response = self
            .http
            .post(self.endpoint(shop_domain))
            .header("X-Shopify-Storefront-Access-Token", token.expose_secret())
            .json(&json!({
                "query": PRODUCT_SEARCH_QUERY,
                "variables": { "query": query },
            }))
            .send()
            .await
            .map_err(|e| Error::upstream("storefront", format!("search call failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, detail = %detail, "Storefront call rejected");
            return Err(Error::upstream("storefront", format!("{}: {}", status, detail)));
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| Error::upstream("storefront", format!("invalid payload: {}", e)))?;

        if let Some(errors) = payload["errors"].as_array() {
            if !errors.is_empty() {
                return Err(Error::upstream(
                    "storefront",
                    format!("graphql errors: {}", Value::Array(errors.clone())),
                ));
            }
        }

        Ok(SearchOutcome {
            results: parse_products(&payload["data"]["products"], shop_domain),
            note: None,
        })
    }
}

/// Map product nodes into the flat catalog projection. Nodes without a
/// title are dropped; price and currency pass through unmodified.
pub(crate) fn parse_products(products: &Value, shop_domain: &str) -> Vec<CatalogItem> {
    let Some(edges) = products["edges"].as_array() else {
        return Vec::new();
    };

    edges
        .iter()
        .filter_map(|edge| {
            let node = &edge["node"];
            let title = node["title"].as_str()?.to_string();

            let url = node["onlineStoreUrl"]
                .as_str()
                .map(|u| u.to_string())
                .or_else(|| {
                    node["handle"]
                        .as_str()
                        .map(|h| format!("https://{}/products/{}", shop_domain, h))
                });

            let image = node["images"]["edges"]
                .as_array()
                .and_then(|images| images.first())
                .and_then(|edge| edge["node"]["url"].as_str())
                .map(|u| u.to_string());

            let variants = node["variants"]["edges"]
                .as_array()
                .map(|edges| {
                    edges
                        .iter()
                        .filter_map(|edge| {
                            let variant = &edge["node"];
                            Some(CatalogVariant {
                                title: variant["title"].as_str()?.to_string(),
                                available: variant["availableForSale"].as_bool().unwrap_or(false),
                                price: variant["price"]["amount"].as_str()?.to_string(),
                                currency: variant["price"]["currencyCode"]
                                    .as_str()?
                                    .to_string(),
                            })
                        })
                        .collect()
                })
                .unwrap_or_default();

            Some(CatalogItem {
                title,
                url,
                image,
                variants,
            })
        })
        .collect()
}

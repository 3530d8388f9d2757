//! Paid-entitlement lookup for the progressive and multiplier formats.
//!
//! [`StripeEntitlements`] looks up the customer by email, then asks whether that
//! customer has an active subscription to the configured price.

use futures::future::BoxFuture;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::Deserialize;

use crate::error::EntitlementError;

const STRIPE_API_URL: &str = "https://api.stripe.com/v1";

pub trait EntitlementChecker: Send + Sync {
    fn is_entitled<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<bool, EntitlementError>>;
}

#[derive(Deserialize)]
struct List<T> {
    data: Vec<T>,
}

#[derive(Deserialize)]
struct Customer {
    id: String,
}

/// Stripe-backed entitlement checks. Single attempt, no retry.
pub struct StripeEntitlements {
    client: reqwest::Client,
    secret_key: Option<String>,
    price_id: Option<String>,
    base_url: String,
}

impl StripeEntitlements {
    pub fn new(secret_key: Option<String>, price_id: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            secret_key,
            price_id,
            base_url: STRIPE_API_URL.to_string(),
        }
    }

    async fn list<T: DeserializeOwned>(
        &self,
        secret_key: &str,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<Vec<T>, EntitlementError> {
        let response = self
            .client
            .get(format!("{}/{}", self.base_url, path))
            .bearer_auth(secret_key)
            .query(query)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(EntitlementError::Status(response.status()));
        }
        let list: List<T> = response.json().await?;
        Ok(list.data)
    }

    async fn check(&self, email: &str) -> Result<bool, EntitlementError> {
        let secret_key = self
            .secret_key
            .as_deref()
            .ok_or(EntitlementError::NotConfigured("STRIPE_SECRET_KEY"))?;

        let customers: Vec<Customer> = self
            .list(secret_key, "customers", &[("email", email), ("limit", "1")])
            .await?;
        let Some(customer) = customers.first() else {
            return Ok(false);
        };

        let mut query = vec![
            ("customer", customer.id.as_str()),
            ("status", "active"),
            ("limit", "1"),
        ];
        if let Some(price) = self.price_id.as_deref() {
            query.push(("price", price));
        }
        let subscriptions: Vec<IgnoredAny> =
            self.list(secret_key, "subscriptions", &query).await?;
        Ok(!subscriptions.is_empty())
    }
}

impl EntitlementChecker for StripeEntitlements {
    fn is_entitled<'a>(&'a self, email: &'a str) -> BoxFuture<'a, Result<bool, EntitlementError>> {
        Box::pin(self.check(email))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_secret_key_is_not_configured() {
        let checker = StripeEntitlements::new(None, Some("price_123".to_string()));
        assert!(matches!(
            checker.is_entitled("hero@example.com").await,
            Err(EntitlementError::NotConfigured("STRIPE_SECRET_KEY"))
        ));
    }

    #[test]
    fn test_list_response_parses() {
        let list: List<Customer> =
            serde_json::from_str(r#"{"object":"list","data":[{"id":"cus_1","email":"a@b"}]}"#)
                .unwrap();
        assert_eq!(list.data.len(), 1);
        assert_eq!(list.data[0].id, "cus_1");
    }
}

//! Endpoint URL construction.
//!
//! ```text
//! Stock            {api}/stock/{locationId}/{sku}
//! PriceIntegrity   {api}/price-integrity/{locationId}/{sku}
//! StockHistory     {api}/stock-history/{locationId}/{sku}
//! OrderInfo        {api}/orders/{locationId}/{sku}?orders=last,next,current
//! DetailProxy      {proxy}/api/products/{sku}
//! ```
//!
//! Path segments are percent-encoded, so a scanned code can never escape its
//! segment.

use url::Url;

use crate::error::{ClientError, ClientResult};

/// Order positions requested from OrderInfo.
pub const ORDER_POSITIONS: &str = "last,next,current";

/// Base URLs of the backend API and the same-origin product-detail proxy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    api_base: Url,
    proxy_base: Url,
}

impl Endpoints {
    pub fn new(api_base: &str, proxy_base: &str) -> ClientResult<Self> {
        let endpoints = Endpoints {
            api_base: Url::parse(api_base)?,
            proxy_base: Url::parse(proxy_base)?,
        };

        for base in [&endpoints.api_base, &endpoints.proxy_base] {
            if base.cannot_be_a_base() {
                return Err(ClientError::InvalidUrl(format!("{base} cannot be a base URL")));
            }
        }

        Ok(endpoints)
    }

    pub fn stock(&self, location_id: &str, sku: &str) -> ClientResult<Url> {
        join(&self.api_base, &["stock", location_id, sku])
    }

    pub fn price_integrity(&self, location_id: &str, sku: &str) -> ClientResult<Url> {
        join(&self.api_base, &["price-integrity", location_id, sku])
    }

    pub fn stock_history(&self, location_id: &str, sku: &str) -> ClientResult<Url> {
        join(&self.api_base, &["stock-history", location_id, sku])
    }

    pub fn order_info(&self, location_id: &str, sku: &str) -> ClientResult<Url> {
        let mut url = join(&self.api_base, &["orders", location_id, sku])?;
        url.set_query(Some(&format!("orders={ORDER_POSITIONS}")));
        Ok(url)
    }

    pub fn product_detail(&self, sku: &str) -> ClientResult<Url> {
        join(&self.proxy_base, &["api", "products", sku])
    }
}

fn join(base: &Url, segments: &[&str]) -> ClientResult<Url> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| ClientError::InvalidUrl(format!("{base} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn endpoints() -> Endpoints {
        Endpoints::new("https://api.example.com/v1", "https://app.example.com/").unwrap()
    }

    #[test]
    fn test_endpoint_paths() {
        let e = endpoints();
        assert_eq!(
            e.stock("1042", "123456").unwrap().as_str(),
            "https://api.example.com/v1/stock/1042/123456"
        );
        assert_eq!(
            e.price_integrity("1042", "123456").unwrap().as_str(),
            "https://api.example.com/v1/price-integrity/1042/123456"
        );
        assert_eq!(
            e.stock_history("1042", "123456").unwrap().as_str(),
            "https://api.example.com/v1/stock-history/1042/123456"
        );
        assert_eq!(
            e.order_info("1042", "123456").unwrap().as_str(),
            "https://api.example.com/v1/orders/1042/123456?orders=last,next,current"
        );
        assert_eq!(
            e.product_detail("123456").unwrap().as_str(),
            "https://app.example.com/api/products/123456"
        );
    }

    #[test]
    fn test_segments_are_encoded() {
        let url = endpoints().stock("1042", "A/B 1").unwrap();
        assert_eq!(url.as_str(), "https://api.example.com/v1/stock/1042/A%2FB%201");
    }

    #[test]
    fn test_rejects_invalid_base() {
        assert!(Endpoints::new("not a url", "https://app.example.com").is_err());
        assert!(Endpoints::new("mailto:ops@example.com", "https://app.example.com").is_err());
    }
}

//! Narrow interfaces to external collaborators
//!
//! The core depends on these abstract capabilities only; concrete widgets
//! (map tiles, geolocation hardware, CAPTCHA/identity services) live
//! outside this crate and are injected at the edges. Tests substitute the
//! fixed implementations below.

use async_trait::async_trait;

use crate::error::RegistryError;

/// A geographic position from the device or a map pick
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPosition {
    pub lat: f64,
    pub lng: f64,
    pub accuracy_m: Option<f64>,
}

/// Device geolocation ("use my location")
#[async_trait]
pub trait Geolocator: Send + Sync {
    async fn current_position(&self) -> Result<GeoPosition, RegistryError>;
}

/// Interactive coordinate picking on a map surface
#[async_trait]
pub trait CoordinatePicker: Send + Sync {
    /// Resolves when the user confirms a point, None if they cancel
    async fn pick(&self) -> Result<Option<GeoPosition>, RegistryError>;
}

/// Source of map tile layers for the picker surface
pub trait TileLayerSource: Send + Sync {
    /// URL template with {z}/{x}/{y} placeholders
    fn tile_url_template(&self) -> String;
    fn attribution(&self) -> String;
}

/// CAPTCHA token minting for submission requests
#[async_trait]
pub trait CaptchaTokenProvider: Send + Sync {
    async fn token(&self) -> Result<String, RegistryError>;
}

/// Optional identity token for authenticated submitters
#[async_trait]
pub trait IdentityTokenProvider: Send + Sync {
    async fn token(&self) -> Result<Option<String>, RegistryError>;
}

/// Fixed-value providers for tests and headless use
pub mod fixed {
    use super::*;

    pub struct FixedPosition(pub GeoPosition);

    #[async_trait]
    impl Geolocator for FixedPosition {
        async fn current_position(&self) -> Result<GeoPosition, RegistryError> {
            Ok(self.0)
        }
    }

    #[async_trait]
    impl CoordinatePicker for FixedPosition {
        async fn pick(&self) -> Result<Option<GeoPosition>, RegistryError> {
            Ok(Some(self.0))
        }
    }

    pub struct FixedCaptcha(pub String);

    #[async_trait]
    impl CaptchaTokenProvider for FixedCaptcha {
        async fn token(&self) -> Result<String, RegistryError> {
            Ok(self.0.clone())
        }
    }

    /// Anonymous sessions carry no identity token
    pub struct Anonymous;

    #[async_trait]
    impl IdentityTokenProvider for Anonymous {
        async fn token(&self) -> Result<Option<String>, RegistryError> {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::fixed::*;
    use super::*;

    #[tokio::test]
    async fn test_fixed_providers() {
        let position = GeoPosition {
            lat: 11.43,
            lng: 79.79,
            accuracy_m: Some(8.0),
        };

        let geo = FixedPosition(position);
        assert_eq!(geo.current_position().await.unwrap(), position);
        assert_eq!(geo.pick().await.unwrap(), Some(position));

        let captcha = FixedCaptcha("tok-123".into());
        assert_eq!(captcha.token().await.unwrap(), "tok-123");

        assert_eq!(Anonymous.token().await.unwrap(), None);
    }
}

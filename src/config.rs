//! Configuration for the extraction stage.
//!
//! The packaging stage needs only an output base path and a split size, which
//! travel as plain arguments; extraction has enough knobs to warrant a struct
//! and builder.

use crate::error::ChinaXivError;
use serde::{Deserialize, Serialize};

/// Configuration for document-folder extraction.
///
/// Built via [`ExtractConfig::builder()`] or [`ExtractConfig::default()`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractConfig {
    /// Multiplier applied to the page's natural size when rendering its
    /// image. Range: 0.5–4.0. Default: 2.0.
    ///
    /// 2.0 keeps small CJK glyphs legible in the rendered PNG without the
    /// file sizes a 300-DPI render would produce.
    pub image_scale: f32,

    /// Cap on either rendered dimension, in pixels. Default: 4000.
    ///
    /// Poster-sized pages at scale 2.0 would otherwise allocate
    /// pathologically large bitmaps.
    pub max_rendered_pixels: u32,

    /// PDF user password for encrypted documents.
    pub password: Option<String>,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            image_scale: 2.0,
            max_rendered_pixels: 4000,
            password: None,
        }
    }
}

impl ExtractConfig {
    /// Create a new builder for `ExtractConfig`.
    pub fn builder() -> ExtractConfigBuilder {
        ExtractConfigBuilder {
            config: Self::default(),
        }
    }
}

/// Builder for [`ExtractConfig`].
#[derive(Debug)]
pub struct ExtractConfigBuilder {
    config: ExtractConfig,
}

impl ExtractConfigBuilder {
    pub fn image_scale(mut self, scale: f32) -> Self {
        self.config.image_scale = scale;
        self
    }

    pub fn max_rendered_pixels(mut self, px: u32) -> Self {
        self.config.max_rendered_pixels = px.max(100);
        self
    }

    pub fn password(mut self, pwd: impl Into<String>) -> Self {
        self.config.password = Some(pwd.into());
        self
    }

    /// Build the configuration, validating constraints.
    pub fn build(self) -> Result<ExtractConfig, ChinaXivError> {
        let c = &self.config;
        if !(0.5..=4.0).contains(&c.image_scale) {
            return Err(ChinaXivError::InvalidConfig(format!(
                "image scale must be 0.5–4.0, got {}",
                c.image_scale
            )));
        }
        Ok(self.config)
    }
}

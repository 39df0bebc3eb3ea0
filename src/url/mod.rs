//! URL handling module for url-harvest
//!
//! This module provides article URL normalization, host extraction and the
//! domain rules crawlers are registered under.

mod domain;
mod matcher;
mod normalize;

pub use domain::{extract_domain, site_host};
pub use matcher::DomainRule;
pub use normalize::normalize_url;

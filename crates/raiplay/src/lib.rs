//! Resolution of RaiPlay catalog pages into download descriptors.
//!
//! [`RequestResolver`] turns an episode page into one [`Descriptor`], or a
//! programme page into the descriptors of every listed episode, using a
//! [`MetadataClient`] built around a caller-owned `reqwest::Client`.

pub mod client;
pub mod descriptor;
pub mod error;
pub mod models;
pub mod page_kind;
pub mod resolver;

pub use client::{ClientConfig, DEFAULT_ORIGIN, MetadataClient};
pub use descriptor::Descriptor;
pub use error::{CatalogError, Result};
pub use page_kind::UrlKind;
pub use resolver::{
    EpisodeFailure, RequestResolver, ResolverConfig, SeriesFailurePolicy, SeriesResolution,
};

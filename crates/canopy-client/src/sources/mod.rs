//! Concrete [`SourceAdapter`](canopy_core::traits::SourceAdapter)s.

pub mod api;
pub mod jsearch;
pub mod rendered;

pub use api::{ApiAdapter, ApiProvider};
pub use jsearch::JSearchProvider;
pub use rendered::{CardSelectors, RenderedPageAdapter, RenderedSourceConfig};

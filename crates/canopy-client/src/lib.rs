//! Network-facing implementations of the `canopy-core` traits, plus the
//! job sources and the wiring that assembles them into a pipeline.

#[cfg(feature = "browser")]
pub mod browser;
pub mod http;
pub mod llm;
pub mod pipeline;
pub mod render;
pub mod sources;

#[cfg(feature = "browser")]
pub use browser::ChromiumRenderer;
pub use http::ReqwestHttpClient;
pub use llm::OpenAiCompleter;
pub use pipeline::{DefaultRenderer, DefaultSession, build_manager, open_session};
pub use render::RenderTimeouts;
pub use sources::{
    ApiAdapter, ApiProvider, JSearchProvider, RenderedPageAdapter, RenderedSourceConfig,
};

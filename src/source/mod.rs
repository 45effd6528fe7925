// Download backends for the media cache: HTTP, plus fakes in tests.

pub mod http_source;
pub mod traits;

pub use http_source::HttpSource;
pub use traits::MediaSource;

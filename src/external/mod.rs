pub mod error;
pub mod http;
pub mod query;
pub mod youtube;

pub use error::{FetchError, TransportError};
pub use http::{HttpClient, HttpResponse, ReqwestHttpClient};
pub use query::{HttpMethod, QueryBuilder, QueryConfig, QueryKind, RequestDescriptor};
pub use youtube::{parse_iso8601_duration, YoutubeClient, YoutubeConverter, YoutubeVideo};

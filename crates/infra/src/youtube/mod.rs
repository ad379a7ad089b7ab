pub mod fetcher;
pub mod payload;
pub mod retry;
pub mod transport;

pub use fetcher::{CommentFetcher, FetchError, FetchRequest, PagePacing};
pub use retry::RetryPolicy;
pub use transport::{CommentsTransport, PageQuery, RawPage, TransportError, YoutubeHttpTransport};

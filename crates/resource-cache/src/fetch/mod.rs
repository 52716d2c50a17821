mod http;
mod primitive;

pub use http::{HttpFetcher, HttpImageProbe, create_client, resolve_uri};
pub use primitive::{FetchPrimitive, ImageProbe};

pub mod loader;
pub mod multimap;
pub mod registry;
pub mod request;
pub mod update;

pub use loader::load_resource;
pub use multimap::{FormData, Headers, MultiMap};
pub use registry::Registry;
pub use request::{REQUEST_KIND, Request, RequestBody, RequestSpec, Variant};

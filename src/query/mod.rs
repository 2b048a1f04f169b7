pub mod bucketize;
pub mod facets;
pub mod mandatory;
pub mod paginate;
pub mod request;
pub mod response;
pub mod server;

pub use bucketize::*;
pub use facets::*;
pub use mandatory::*;
pub use paginate::*;
pub use request::*;
pub use response::*;
pub use server::*;

pub mod extract;
pub mod mapper;
pub mod model;
pub mod proto;

pub use extract::*;
pub use mapper::*;
pub use model::*;
pub use proto::*;

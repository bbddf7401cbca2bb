pub mod ids;
pub mod handle;
pub mod flow_type;
pub mod node;

pub use ids::*;
pub use handle::*;
pub use flow_type::*;
pub use node::*;

pub mod eta;
pub mod material;
pub mod method;
pub mod pile;
pub mod recommendation;
pub mod task;
pub mod turn;

pub use eta::*;
pub use material::*;
pub use method::*;
pub use pile::*;
pub use recommendation::*;
pub use task::*;
pub use turn::*;

pub mod matrix;
pub mod request;
pub mod wire;

pub use matrix::*;
pub use request::*;
pub use wire::*;

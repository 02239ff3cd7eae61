//! matrixflow データモデル

pub mod config;
pub mod credentials;
pub mod target;

pub use config::*;
pub use credentials::*;
pub use target::*;

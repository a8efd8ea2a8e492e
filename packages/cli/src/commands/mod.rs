pub mod apply;
pub mod fragment;
pub mod invert;

pub use apply::{apply, ApplyArgs};
pub use fragment::{fragment, FragmentArgs};
pub use invert::{invert, InvertArgs};

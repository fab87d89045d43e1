mod epub;
pub use epub::*;

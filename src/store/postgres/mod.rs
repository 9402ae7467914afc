pub use builder::*;
pub use post_store::*;
pub use statements::Statements;

mod builder;
mod post_store;
mod statements;

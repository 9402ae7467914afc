//! Posts with eventually-consistent engagement counters.
//!
//! [`PostManager`] is the entry point of every request: it owns ownership checks, the
//! like/unlike and view protocols against the [`ledger`], cache invalidation and fact
//! publication on the [`bus`]es. Facts coming from other services are applied by the
//! [`relay::Consumer`] directly onto the [`store`].

pub use crate::error::{ErrorKind, PostError, StoreError};
pub use crate::event::{IncomingFact, PostFact};
pub use crate::manager::{ManagerConfig, PostManager};
pub use crate::post::{Author, Counter, NewPost, Post, PostPatch, PostState, PostView};
pub use crate::query::{ListQuery, Page};
pub use crate::ranking::SortMode;
pub use crate::types::{PostId, UserId, Viewer};

pub mod bus;
pub mod cache;
pub mod config;
pub mod error;
pub mod event;
pub mod ledger;
pub mod manager;
pub mod post;
pub mod query;
pub mod ranking;
pub mod relay;
pub mod store;
pub mod types;

//! Gradual feature rollout for Rust services.
//!
//! # Overview
//!
//! A [`Feature`] is a named toggle. Whether it is active for a given subject (a user, an account,
//! or just an identifier string) is decided, in order, by:
//!
//! 1. the feature being enabled at all,
//! 2. a 100% rollout,
//! 3. the subject being whitelisted,
//! 4. the feature's [`Rule`] matching the subject,
//! 5. the subject's stable hash bucket falling inside the rollout percentage.
//!
//! Subjects implement the [`Subject`] trait; string and integer identifiers already do. A
//! feature's [`Field`] tells how to derive the identifier used for whitelisting and bucketing from
//! richer subjects.
//!
//! The [`Rollout`] facade exposes all of this on top of a [`Backend`]: [`MemoryBackEnd`] for a
//! single process, or [`RedisBackEnd`] and [`RedisHighPerfBackEnd`] to share state between
//! processes. [`Guard`]s wrap calls so they only run when a feature is active.
//!
//! # Error Handling
//!
//! Errors are represented by the [`Error`] enum. Querying unknown features is not an error (they
//! are simply inactive) but modifying them is.
//!
//! # Logging
//!
//! The crate uses the [`log`](https://docs.rs/log/latest/log/) crate with target `hanoi`.
//! Rejected guarded calls and unreadable stored records are logged as warnings; individual
//! decisions are logged at `trace` level.
//!
//! # Examples
//!
//! See `demos/guard.rs` in the crate repository.

#![warn(rustdoc::missing_crate_level_docs)]
#![warn(missing_docs)]

mod backend;
mod config;
mod error;
mod eval;
mod feature;
mod guard;
mod rollout;
mod rules;
mod sharder;
mod store;
mod subject;

pub use backend::{Backend, MemoryBackEnd, RedisBackEnd, RedisHighPerfBackEnd};
pub use config::RedisConfig;
pub use error::{Error, Result};
pub use feature::{Extractor, Feature, Field, Percentage};
pub use guard::{CallContext, Guard};
pub use rollout::{Accessor, Registration, Rollout};
pub use rules::Rule;
pub use sharder::{Crc32Sharder, Sharder};
pub use store::KeyValueStore;
pub use subject::Subject;

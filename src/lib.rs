//! Schema discovery for property-graph databases by walking them one hop at
//! a time.
//!
//! A [`Walk`](walk::model::Walk) is the ordered list of hops picked so far.
//! [`gql`] compiles a walk plus the step being composed into Cypher read
//! queries, runs them through an injected [`QueryExecutor`](gql::executor::QueryExecutor)
//! and decodes the rows. [`walk`] holds the data model, the persisted state
//! machine and the stepper session tying it all together.

pub mod error;
pub mod gql;
pub mod persistence;
pub mod walk;

pub use error::{Result, WalkError};

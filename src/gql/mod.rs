pub mod builders;
pub mod decode;
pub mod executor;
pub mod literal;
pub mod prefix;
pub mod query_log;
pub mod tracker;

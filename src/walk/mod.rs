pub mod grouping;
pub mod machine;
pub mod model;
pub mod session;

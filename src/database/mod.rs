//! Database module exports.

mod mongo;
mod template;

pub use mongo::Database;
#[cfg(test)]
pub use template::MockTemplate;
pub use template::{DocumentStream, MongoTemplate, Template};

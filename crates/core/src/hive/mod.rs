pub mod model;
pub mod query;

pub use model::{CreateHiveRequest, Hive, NewHive};
pub use query::{HiveFilter, ListHivesParams, Pagination};

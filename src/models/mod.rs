pub mod applications;
pub mod candidate;
pub mod users;

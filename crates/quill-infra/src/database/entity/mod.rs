//! SeaORM entities mirroring the domain model.

pub mod post;
pub mod post_content;
pub mod user;

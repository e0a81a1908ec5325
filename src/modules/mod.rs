pub mod auth;
pub mod categories;
pub mod courses;
pub mod enrollments;
pub mod evaluations;
pub mod instructors;
pub mod levels;
pub mod users;

pub mod activities;
pub mod applications;
pub mod contracts;
pub mod notifications;
pub mod projects;
pub mod users;
pub mod work_submissions;

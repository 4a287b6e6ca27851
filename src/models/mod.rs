pub mod activity;
pub mod application;
pub mod contract;
pub mod notification;
pub mod project;
pub mod user;
pub mod work_submission;

pub use activity::Activity;
pub use application::{Application, ApplicationStatus, ApplicationSummary};
pub use contract::Contract;
pub use notification::Notification;
pub use project::{NewProject, Project, ProjectStatus};
pub use user::User;
pub use work_submission::WorkSubmission;

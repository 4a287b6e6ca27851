pub mod activity;
pub mod notifier;

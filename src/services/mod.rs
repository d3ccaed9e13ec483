pub mod approval;
pub mod availability;
pub mod candidate_diff;
pub mod database;
pub mod directory;
pub mod meetings;
pub mod notifier;
pub mod reminder;







#[cfg(test)]
#[path = "notifier_test.rs"]
mod notifier_test;

use crate::domain::jobs::Job;

/// Hands accepted jobs to background execution without waiting for them.
#[cfg_attr(test, mockall::automock)]
pub trait JobDispatcher: Send + Sync {
    fn dispatch(&self, job: Job);
}

pub(crate) mod reconciliation;
pub(crate) mod scheduler;


// Re-export the public interface
pub use reconciliation::{ReconciliationJobs, SweepSummary};
pub use scheduler::JobScheduler;

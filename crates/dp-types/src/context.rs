//! Execution context threaded through entry points.
//!
//! Parallel training runs several worker processes; diagnostics should be
//! printed once and in order. Callers pass an [`ExecutionContext`] instead of
//! consulting process-global state. [`SingleProcess`] is the no-op default.

use tracing::info;

pub trait ExecutionContext {
    /// Rank of this worker (0 is the coordinator).
    fn rank(&self) -> usize;

    /// Total number of worker processes.
    fn num_workers(&self) -> usize;

    /// Block until every worker has reached this point.
    fn barrier(&self);

    fn is_coordinator(&self) -> bool {
        self.rank() == 0
    }

    /// Emit a diagnostic once per run, from the coordinator only.
    fn print_unique(&self, message: &str) {
        if self.is_coordinator() {
            info!("{}", message);
        }
    }
}

/// Execution context for a plain single-process run.
#[derive(Debug, Clone, Copy, Default)]
pub struct SingleProcess;

impl ExecutionContext for SingleProcess {
    fn rank(&self) -> usize {
        0
    }

    fn num_workers(&self) -> usize {
        1
    }

    fn barrier(&self) {}
}

/// Static rank assignment, e.g. read from launcher environment variables.
/// The barrier is a no-op: synchronization belongs to the launcher.
#[derive(Debug, Clone, Copy)]
pub struct StaticRank {
    pub rank: usize,
    pub num_workers: usize,
}

impl StaticRank {
    /// Reads `PMI_RANK`/`OMPI_COMM_WORLD_RANK` and the matching size
    /// variables, falling back to a single worker.
    pub fn from_env() -> Self {
        let read = |keys: &[&str]| {
            keys.iter()
                .find_map(|k| std::env::var(k).ok())
                .and_then(|v| v.parse::<usize>().ok())
        };
        let rank = read(&["PMI_RANK", "OMPI_COMM_WORLD_RANK"]).unwrap_or(0);
        let num_workers = read(&["PMI_SIZE", "OMPI_COMM_WORLD_SIZE"]).unwrap_or(1).max(1);
        Self { rank, num_workers }
    }
}

impl ExecutionContext for StaticRank {
    fn rank(&self) -> usize {
        self.rank
    }

    fn num_workers(&self) -> usize {
        self.num_workers
    }

    fn barrier(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_process_is_coordinator() {
        let ctx = SingleProcess;
        assert_eq!(ctx.rank(), 0);
        assert_eq!(ctx.num_workers(), 1);
        assert!(ctx.is_coordinator());
        ctx.barrier();
        ctx.print_unique("only once");
    }

    #[test]
    fn non_zero_rank_is_not_coordinator() {
        let ctx = StaticRank { rank: 3, num_workers: 4 };
        assert!(!ctx.is_coordinator());
    }
}

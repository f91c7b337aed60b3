/// Where batch fetches run.
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

/// Runs listing jobs off (or, for `Inline`, on) the owning thread.
///
/// Jobs never touch models; they only call `Listing::next_batch` and post the
/// result back over the completion channel.
pub enum IoExecutor {
    Pool(ThreadPool),
    Inline,
}

impl IoExecutor {
    /// A dedicated pool; `threads == 0` means one thread per CPU.
    pub fn pool(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let threads = if threads == 0 { num_cpus::get() } else { threads };
        ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("treescout-io-{i}"))
            .build()
            .map(Self::Pool)
    }

    pub fn spawn<F>(&self, job: F)
    where
        F: FnOnce() + Send + 'static,
    {
        match self {
            Self::Pool(pool) => pool.spawn(job),
            Self::Inline => job(),
        }
    }

    pub fn is_inline(&self) -> bool {
        matches!(self, Self::Inline)
    }
}

pub mod export;
pub mod import;

pub use export::run_export;
pub use import::run_import;

use firebridge::{BarProgress, NoopProgress, TransferProgress};

fn progress_reporter(enabled: bool, prefix: &str) -> Box<dyn TransferProgress> {
    if enabled {
        Box::new(BarProgress::new(prefix))
    } else {
        Box::new(NoopProgress)
    }
}

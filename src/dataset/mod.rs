pub mod merge;
pub mod storage;
pub mod types;

pub use merge::{merge, MergeOutcome};
pub use storage::{load_dataset, save_dataset, save_final_dataset, write_json_atomic};
pub use types::{CumulativeDataset, DATASET_VERSION};

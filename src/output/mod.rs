pub mod formatter;

pub use formatter::{
    format_aggregates, format_lost_tests, format_rankings, format_record_rows, format_step,
    format_test_totals, format_winners, should_use_colors, StepStatus,
};

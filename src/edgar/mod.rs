pub mod report;

pub use report::ReportType;

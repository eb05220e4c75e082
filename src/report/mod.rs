//! Report generation for completed consultations

mod client;

pub use client::{HttpReportSink, ReportReceipt, ReportRequest, ReportSink};

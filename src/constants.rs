pub const BYTES_PER_KB: usize = 1024;
pub const BYTES_PER_MB: usize = 1_048_576;
pub const BYTES_PER_GB: f64 = 1_073_741_824.0;
pub const PERCENT_100: f64 = 100.0;

pub const PROGRESS_REPORT_INTERVAL_RECORDS: usize = 1_000_000;
pub const SHUTDOWN_CHECK_INTERVAL_RECORDS: usize = 1000;

// Rough in-memory cost of one buffered Edge (two ids plus set overhead)
pub const ESTIMATED_EDGE_BYTES: usize = 96;

pub const FIELD_SEPARATOR: char = '\t';
pub const COMMENT_PREFIX: &str = "# ";

pub const PAYMENT_RECORD_FIELDS: usize = 3;
pub const EDGE_RECORD_FIELDS: usize = 2;

pub const DEFAULT_DOCTOR_HEADER: &str = "doctorId\tdoctorId";
pub const DEFAULT_COMPANY_HEADER: &str = "companyId\tcompanyId";
pub const DEFAULT_LARGE_HUB_THRESHOLD: usize = 10_000;

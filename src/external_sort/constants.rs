pub const DEFAULT_PARTITIONS: usize = 20;
pub const DEFAULT_IO_BUFFER_SIZE_KB: usize = 64;
pub const DEFAULT_MERGE_BUFFER_SIZE_KB: usize = 256;
pub const DEFAULT_MEMORY_USAGE_PERCENT: f64 = 60.0;
pub const DEFAULT_CHUNK_HEADER: &str = "nodeId\tnodeId";

pub const MIN_PARTITIONS: usize = 1;
pub const MAX_PARTITIONS: usize = 4096;
pub const MIN_IO_BUFFER_SIZE_KB: usize = 4;
pub const MAX_IO_BUFFER_SIZE_KB: usize = 65536;
pub const MIN_MEMORY_USAGE_PERCENT: f64 = 10.0;
pub const MAX_MEMORY_USAGE_PERCENT: f64 = 90.0;

pub const CHUNK_FILE_PREFIX: &str = "chunk_";
pub const CHUNK_FILE_EXTENSION: &str = ".tab";
pub const TEMP_DIR_NAME: &str = "coedge_chunks";

use sysinfo::System;

use crate::constants::{BYTES_PER_GB, PERCENT_100};

/// (total, available) RAM in GB.
pub fn get_memory_info() -> (f64, f64) {
    let mut system = System::new();
    system.refresh_memory();

    let total_memory = system.total_memory() as f64 / BYTES_PER_GB;
    let available_memory = system.available_memory() as f64 / BYTES_PER_GB;

    (total_memory, available_memory)
}

/// Share of currently available RAM the process may hold in buffers.
pub fn memory_budget_bytes(usage_percent: f64) -> usize {
    let mut system = System::new();
    system.refresh_memory();

    (system.available_memory() as f64 * usage_percent / PERCENT_100) as usize
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_scales_with_percent() {
        let small = memory_budget_bytes(10.0);
        let large = memory_budget_bytes(90.0);
        assert!(small <= large);
    }

    #[test]
    fn test_memory_info_is_consistent() {
        let (total, available) = get_memory_info();
        assert!(total >= 0.0);
        assert!(available >= 0.0);
    }
}

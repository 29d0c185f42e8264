//! Plausible random snapshots for running without a metrics bridge.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::system::snapshot::{
    BatteryMetrics, CoreMetrics, CpuMetrics, MemoryMetrics, SystemIdentity, SystemSnapshot,
};

pub const SYNTHETIC_CORES: usize = 8;
const GIB: u64 = 1024 * 1024 * 1024;
pub const SYNTHETIC_MEMORY_TOTAL: u64 = 16 * GIB;

pub struct SyntheticGenerator {
    rng: StdRng,
}

impl Default for SyntheticGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticGenerator {
    pub fn new() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn generate(&mut self) -> SystemSnapshot {
        let rng = &mut self.rng;

        let cores = (0..SYNTHETIC_CORES)
            .map(|_| CoreMetrics {
                usage: rng.gen_range(10..90) as f32,
                temperature: rng.gen_range(30..45) as f32,
            })
            .collect();
        let cpu = CpuMetrics {
            usage: rng.gen_range(20..80) as f32,
            temperature: rng.gen_range(35..55) as f32,
            frequency: rng.gen_range(2.4..3.6),
            cores,
        };

        let battery = BatteryMetrics {
            level: rng.gen_range(50..100) as f32,
            is_charging: rng.gen_bool(0.5),
            health: rng.gen_range(80..100) as f32,
            cycle_count: rng.gen_range(100..400),
            temperature: rng.gen_range(30..40) as f32,
            voltage: rng.gen_range(11.2..12.5),
            time_remaining: Some(rng.gen_range(120..420)),
        };

        // `free` stays 0 and `usage` is drawn independently of `used`; callers
        // rely on these placeholder values.
        let memory = MemoryMetrics {
            total: SYNTHETIC_MEMORY_TOTAL,
            used: rng.gen_range(6..14) * GIB,
            free: 0,
            usage: rng.gen_range(30..70) as f32,
        };

        SystemSnapshot {
            cpu,
            battery,
            memory,
            system: synthetic_identity(),
        }
    }
}

fn synthetic_identity() -> SystemIdentity {
    SystemIdentity {
        manufacturer: "Apple Inc.".to_string(),
        model: "MacBook Pro".to_string(),
        os: "macOS Sonoma 14.1".to_string(),
        arch: "arm64".to_string(),
        cpu_manufacturer: "Apple".to_string(),
        cpu_brand: "Apple M2 Pro".to_string(),
        cpu_cores: SYNTHETIC_CORES as u32,
        cpu_speed: 3.5,
    }
}

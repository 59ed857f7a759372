//! Accelerated measurement path
//!
//! Vector kernels for the byte sum and the pattern store: SSE2 on x86_64,
//! NEON on aarch64. Copy is a single `memcpy`. A CPU capability probe runs
//! once per process and picks the kernel set; a CPU that lacks the vector
//! unit falls back to word-wide SWAR kernels. Targets with no vector
//! kernels at all cannot use this path.

use std::sync::OnceLock;

use crate::bench::engine::{measure_copy, measure_read, measure_write, AccessKernels, MeasurementEngine, PATTERN_PERIOD};
use crate::{RamBenchError, Result};

const WORD: usize = std::mem::size_of::<u64>();

/// Words folded per block. Each word adds at most 510 to every 16-bit lane,
/// so 128 words stay below 65536 and no lane carries into its neighbour.
const WORDS_PER_BLOCK: usize = 128;
const SUM_BLOCK: usize = WORD * WORDS_PER_BLOCK;

/// Mask selecting the even bytes of a word into 16-bit lanes
const LOW_BYTES: u64 = 0x00FF_00FF_00FF_00FF;

/// Width of one vector register in bytes
#[cfg(any(target_arch = "x86_64", target_arch = "aarch64"))]
const VECTOR: usize = 16;

/// One period of the write pattern
const PATTERN_TILE: [u8; PATTERN_PERIOD] = pattern_tile();

static CAPABILITY: OnceLock<std::result::Result<Kernels, String>> = OnceLock::new();

const fn pattern_tile() -> [u8; PATTERN_PERIOD] {
    let mut tile = [0u8; PATTERN_PERIOD];
    let mut i = 0;
    while i < PATTERN_PERIOD {
        tile[i] = i as u8;
        i += 1;
    }
    tile
}

/// Kernel set chosen by the capability probe
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kernels {
    #[cfg(target_arch = "x86_64")]
    Sse2,
    #[cfg(target_arch = "aarch64")]
    Neon,
    /// Portable word-wide fallback
    Swar,
}

impl Kernels {
    pub fn label(self) -> &'static str {
        match self {
            #[cfg(target_arch = "x86_64")]
            Kernels::Sse2 => "sse2",
            #[cfg(target_arch = "aarch64")]
            Kernels::Neon => "neon",
            Kernels::Swar => "swar",
        }
    }
}

#[cfg(target_arch = "x86_64")]
fn probe_cpu() -> std::result::Result<Kernels, String> {
    if std::arch::is_x86_feature_detected!("sse2") {
        Ok(Kernels::Sse2)
    } else {
        Ok(Kernels::Swar)
    }
}

#[cfg(target_arch = "aarch64")]
fn probe_cpu() -> std::result::Result<Kernels, String> {
    if std::arch::is_aarch64_feature_detected!("neon") {
        Ok(Kernels::Neon)
    } else {
        Ok(Kernels::Swar)
    }
}

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
fn probe_cpu() -> std::result::Result<Kernels, String> {
    Err(format!("no vector kernels for {}", std::env::consts::ARCH))
}

/// Sum the four 16-bit lanes of a SWAR accumulator
fn fold_lanes(lanes: u64) -> u64 {
    (lanes & 0xFFFF) + ((lanes >> 16) & 0xFFFF) + ((lanes >> 32) & 0xFFFF) + (lanes >> 48)
}

fn swar_sum_bytes(buffer: &[u8]) -> u64 {
    let mut blocks = buffer.chunks_exact(SUM_BLOCK);
    let mut total = 0u64;

    for block in &mut blocks {
        let mut lanes = 0u64;
        for word in block.chunks_exact(WORD) {
            let word = <[u8; WORD]>::try_from(word).map_or(0, u64::from_ne_bytes);
            lanes += (word & LOW_BYTES) + ((word >> 8) & LOW_BYTES);
        }
        total += fold_lanes(lanes);
    }

    total + scalar_sum(blocks.remainder())
}

fn swar_write_pattern(buffer: &mut [u8]) {
    // Chunks start at multiples of the period, so each one is a tile prefix
    for chunk in buffer.chunks_mut(PATTERN_PERIOD) {
        chunk.copy_from_slice(&PATTERN_TILE[..chunk.len()]);
    }
}

fn scalar_sum(bytes: &[u8]) -> u64 {
    bytes.iter().map(|&b| u64::from(b)).sum()
}

#[cfg(target_arch = "x86_64")]
mod sse2 {
    use std::arch::x86_64::{
        __m128i, _mm_add_epi64, _mm_loadu_si128, _mm_sad_epu8, _mm_setzero_si128, _mm_storeu_si128,
    };

    use super::{scalar_sum, PATTERN_PERIOD, PATTERN_TILE, VECTOR};

    /// # Safety
    /// The CPU must support SSE2.
    #[target_feature(enable = "sse2")]
    pub unsafe fn sum_bytes(buffer: &[u8]) -> u64 {
        let mut chunks = buffer.chunks_exact(VECTOR);
        let zero = _mm_setzero_si128();
        let mut acc = _mm_setzero_si128();

        for chunk in &mut chunks {
            let bytes = _mm_loadu_si128(chunk.as_ptr().cast::<__m128i>());
            // Two 64-bit lanes, each the sum of eight bytes
            acc = _mm_add_epi64(acc, _mm_sad_epu8(bytes, zero));
        }

        let mut lanes = [0u64; 2];
        _mm_storeu_si128(lanes.as_mut_ptr().cast::<__m128i>(), acc);
        lanes[0] + lanes[1] + scalar_sum(chunks.remainder())
    }

    /// # Safety
    /// The CPU must support SSE2.
    #[target_feature(enable = "sse2")]
    pub unsafe fn write_pattern(buffer: &mut [u8]) {
        let mut tile = [_mm_setzero_si128(); PATTERN_PERIOD / VECTOR];
        for (i, lane) in tile.iter_mut().enumerate() {
            *lane = _mm_loadu_si128(PATTERN_TILE.as_ptr().add(i * VECTOR).cast::<__m128i>());
        }

        let mut periods = buffer.chunks_exact_mut(PATTERN_PERIOD);
        for period in &mut periods {
            let base = period.as_mut_ptr();
            for (i, lane) in tile.iter().enumerate() {
                _mm_storeu_si128(base.add(i * VECTOR).cast::<__m128i>(), *lane);
            }
        }

        let tail = periods.into_remainder();
        let len = tail.len();
        tail.copy_from_slice(&PATTERN_TILE[..len]);
    }
}

#[cfg(target_arch = "aarch64")]
mod neon {
    use std::arch::aarch64::{
        uint8x16_t, vaddvq_u64, vdupq_n_u64, vdupq_n_u8, vld1q_u8, vpadalq_u32, vpaddlq_u16, vpaddlq_u8,
        vst1q_u8,
    };

    use super::{scalar_sum, PATTERN_PERIOD, PATTERN_TILE, VECTOR};

    /// # Safety
    /// The CPU must support NEON.
    #[target_feature(enable = "neon")]
    pub unsafe fn sum_bytes(buffer: &[u8]) -> u64 {
        let mut chunks = buffer.chunks_exact(VECTOR);
        let mut acc = vdupq_n_u64(0);

        for chunk in &mut chunks {
            let bytes = vld1q_u8(chunk.as_ptr());
            // Widen u8x16 -> u16x8 -> u32x4, then accumulate into u64x2
            acc = vpadalq_u32(acc, vpaddlq_u16(vpaddlq_u8(bytes)));
        }

        vaddvq_u64(acc) + scalar_sum(chunks.remainder())
    }

    /// # Safety
    /// The CPU must support NEON.
    #[target_feature(enable = "neon")]
    pub unsafe fn write_pattern(buffer: &mut [u8]) {
        let mut tile: [uint8x16_t; PATTERN_PERIOD / VECTOR] = [vdupq_n_u8(0); PATTERN_PERIOD / VECTOR];
        for (i, lane) in tile.iter_mut().enumerate() {
            *lane = vld1q_u8(PATTERN_TILE.as_ptr().add(i * VECTOR));
        }

        let mut periods = buffer.chunks_exact_mut(PATTERN_PERIOD);
        for period in &mut periods {
            let base = period.as_mut_ptr();
            for (i, lane) in tile.iter().enumerate() {
                vst1q_u8(base.add(i * VECTOR), *lane);
            }
        }

        let tail = periods.into_remainder();
        let len = tail.len();
        tail.copy_from_slice(&PATTERN_TILE[..len]);
    }
}

/// Vector engine, available once the capability probe succeeds
#[derive(Debug, Clone, Copy)]
pub struct AcceleratedEngine {
    kernels: Kernels,
}

impl AcceleratedEngine {
    /// Run the capability probe (first call only) and hand out an engine
    pub fn initialize() -> Result<Self> {
        match CAPABILITY.get_or_init(probe_cpu) {
            Ok(kernels) => Ok(Self { kernels: *kernels }),
            Err(reason) => Err(RamBenchError::AcceleratedUnavailable(reason.clone())),
        }
    }

    /// Whether this process can use the accelerated path
    pub fn is_available() -> bool {
        Self::initialize().is_ok()
    }

    /// Kernel set the probe selected
    pub fn kernels(&self) -> Kernels {
        self.kernels
    }
}

impl AccessKernels for AcceleratedEngine {
    fn sum_bytes(&self, buffer: &[u8]) -> u64 {
        match self.kernels {
            // SAFETY: the probe reported SSE2 before selecting these kernels
            #[cfg(target_arch = "x86_64")]
            Kernels::Sse2 => unsafe { sse2::sum_bytes(buffer) },
            // SAFETY: the probe reported NEON before selecting these kernels
            #[cfg(target_arch = "aarch64")]
            Kernels::Neon => unsafe { neon::sum_bytes(buffer) },
            Kernels::Swar => swar_sum_bytes(buffer),
        }
    }

    fn write_pattern(&self, buffer: &mut [u8]) {
        match self.kernels {
            // SAFETY: the probe reported SSE2 before selecting these kernels
            #[cfg(target_arch = "x86_64")]
            Kernels::Sse2 => unsafe { sse2::write_pattern(buffer) },
            // SAFETY: the probe reported NEON before selecting these kernels
            #[cfg(target_arch = "aarch64")]
            Kernels::Neon => unsafe { neon::write_pattern(buffer) },
            Kernels::Swar => swar_write_pattern(buffer),
        }
    }

    fn copy_bytes(&self, src: &[u8], dst: &mut [u8]) {
        dst.copy_from_slice(src);
    }
}

impl MeasurementEngine for AcceleratedEngine {
    fn name(&self) -> &'static str {
        "accelerated"
    }

    fn read(&self, size_bytes: usize) -> Result<f64> {
        measure_read(self, size_bytes)
    }

    fn write(&self, size_bytes: usize) -> Result<f64> {
        measure_write(self, size_bytes)
    }

    fn copy(&self, size_bytes: usize) -> Result<f64> {
        measure_copy(self, size_bytes)
    }
}

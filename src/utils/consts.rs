/// Log level (overridable with RUST_LOG)
pub const LOG_LEVEL: &str = "info";

// ============================================================================
// Sweep / capture
// ============================================================================

/// Samples skipped at the start of every capture to let channel transients settle
pub const CAPTURE_MARGIN: usize = 500;

/// Capture holds this many times `window_len * num_exemplars` samples (plus margin)
pub const CAPTURE_FACTOR: usize = 5;

/// Gap between window offsets is drawn from [GAP_MIN_WINDOWS, GAP_MAX_WINDOWS) windows
pub const GAP_MIN_WINDOWS: usize = 2;
pub const GAP_MAX_WINDOWS: usize = 4;

/// Samples per chunk handed from the stream thread to the capture sink
pub const CHUNK_LEN: usize = 4096;

/// Chunks buffered between producer and capture sink
pub const STREAM_QUEUE_DEPTH: usize = 8;

/// How often the capture wait wakes up to check for cancellation (ms)
pub const POLL_INTERVAL_MS: u64 = 50;

/// Upper bound on a single capture (ms)
pub const DEFAULT_CAPTURE_TIMEOUT_MS: u64 = 30_000;

/// Producer back-off when a source has nothing to give (ms)
pub const STALL_BACKOFF_MS: u64 = 5;

pub const DEFAULT_WINDOW_LEN: usize = 128;
pub const DEFAULT_EXEMPLARS_PER_KEY: usize = 1000;
pub const DEFAULT_SNR_RANGE: &str = "-20:20:2";
pub const DEFAULT_SEED: u64 = 0;

/// Longest SNR list a sweep accepts
pub const MAX_SNR_VALUES: usize = 10_000;

// ============================================================================
// Generators
// ============================================================================

/// Working sample rate (Hz) of the analog generators and radio channel models
pub const SAMPLE_RATE: f32 = 200e3;

/// Audio rate feeding the analog modulators (Hz)
pub const AUDIO_RATE: f32 = 44.1e3;

pub const WBFM_QUAD_RATE: f32 = 220.5e3;
pub const WBFM_DEVIATION_HZ: f32 = 75e3;

pub const CONSTELLATION_SPS: usize = 2;
pub const RRC_EXCESS_BW: f64 = 0.35;
pub const FSK_SPS: usize = 8;
pub const CPFSK_INDEX: f32 = 0.5;
pub const CHIRP_LEN: usize = 1024;

// ============================================================================
// Channel models
// ============================================================================

/// Sinusoids in the sum-of-sinusoids fading model
pub const FADING_SINUSOIDS: usize = 8;

/// Normalized maximum Doppler of the plain fading channels (cycles/sample)
pub const FADING_MAX_DOPPLER: f64 = 1.0 / 200e3;

/// Power delay profile of the frequency-selective channels
pub const PDP_DELAYS: [f64; 3] = [0.0, 0.9, 1.7];
pub const PDP_MAGNITUDES: [f64; 3] = [1.0, 0.8, 0.3];
pub const PDP_TAPS: usize = 8;

/// Radio channel sample-rate-offset random walk (Hz)
pub const SRO_STDEV: f64 = 0.01;
pub const SRO_MAXDEV: f64 = 50.0;

/// Radio channel carrier-frequency-offset random walk (Hz)
pub const CFO_STDEV: f64 = 0.01;
pub const CFO_MAXDEV: f64 = 500.0;

/// Maximum Doppler of the radio fading models (Hz)
pub const RADIO_MAX_DOPPLER_HZ: f64 = 1.0;

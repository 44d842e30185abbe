// Power band breakpoints (kW), left-closed: [0, 1000), [1000, 2000), ... [5200, inf)
pub const POWER_BAND_BREAKPOINTS_KW: [f64; 8] = [
    1000.0, 2000.0, 2300.0, 2600.0, 3000.0, 3300.0, 3700.0, 5200.0,
];

// Physical constants
pub const SOLAR_CONSTANT: f64 = 1367.0;                // W/m²
pub const STC_IRRADIANCE: f64 = 1000.0;                // W/m² at standard test conditions
pub const WIND_REFERENCE_HEIGHT_M: f64 = 10.0;         // anemometer height of the weather feed
pub const WATTS_PER_MEGAWATT: f64 = 1_000_000.0;

// Irradiance decomposition limits
pub const MIN_COS_ZENITH: f64 = 0.065;                 // ~86.3° zenith
pub const MAX_DNI_ZENITH_DEG: f64 = 87.0;

// Local solar hours in which a zero reading is reported as a data-quality signal
pub const OPERATING_HOURS_START: f64 = 10.0;
pub const OPERATING_HOURS_END: f64 = 15.0;

// PV generator correction factor k_g by month, columns: best, normal, worst
pub const PV_GENERATOR_CORRECTION: [[f64; 3]; 12] = [
    [1.03, 0.97, 0.90], // Jan
    [1.03, 0.98, 0.91], // Feb
    [1.04, 0.99, 0.92], // Mar
    [1.05, 1.00, 0.93], // Apr
    [1.05, 1.00, 0.94], // May
    [1.05, 1.00, 0.94], // Jun
    [1.05, 1.00, 0.94], // Jul
    [1.05, 1.00, 0.94], // Aug
    [1.04, 0.99, 0.93], // Sep
    [1.04, 0.98, 0.92], // Oct
    [1.03, 0.97, 0.90], // Nov
    [1.03, 0.96, 0.89], // Dec
];

// PV temperature correction k_t by month
pub const PV_TEMPERATURE_CORRECTION: [f64; 12] = [
    1.03, 1.02, 1.00, 0.98, 0.96, 0.94, 0.93, 0.93, 0.95, 0.98, 1.01, 1.03,
];

// Scenario tables below are ordered best, normal, worst
pub const PV_SYSTEM_EFFICIENCY: [f64; 3] = [0.90, 0.86, 0.80];
pub const WIND_SHEAR_EXPONENT: [f64; 3] = [0.25, 0.20, 0.14];
pub const WIND_WAKE_LOSS: [f64; 3] = [0.05, 0.10, 0.15];
pub const WIND_SYSTEM_EFFICIENCY: [f64; 3] = [0.98, 0.95, 0.90];

// PV loss defaults
pub const DEFAULT_DEGRADATION_RATE: f64 = 0.005;       // 0.5% per year
pub const DEFAULT_ALBEDO: f64 = 0.2;

// Weather sources
pub const DEFAULT_SAMPLE_INTERVAL_MINUTES: u32 = 60;
pub const STATION_SAMPLE_INTERVAL_MINUTES: u32 = 10;
pub const STATION_MISSING_VALUE: f64 = -999.0;
pub const DEFAULT_CACHE_DIR: &str = "cache";

// Geocoding
pub const NOMINATIM_SEARCH_URL: &str = "https://nominatim.openstreetmap.org/search";
pub const GEOCODER_USER_AGENT: &str = "fleetgen/0.1";
pub const GEOCODER_TIMEOUT_SECS: u64 = 5;

// Output
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
pub const TIMESTAMP_COLUMN: &str = "timestamp";
pub const POWER_SUM_COLUMN: &str = "power_sum";

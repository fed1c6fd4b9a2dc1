//! Centralized balance and tuning constants for the thirst simulation.
//!
//! Values that players are expected to tune live in the JSON configs
//! (`ConfigServer`, patch files). Everything here is the fixed cadence and
//! arithmetic of the state machine itself.

// Identifiers --------------------------------------------------------------
pub const THIRST_ATTRIBUTE_KEY: &str = "parched:thirst";
pub const CONFIG_CHANNEL: &str = "parched:config";
pub const THIRST_RATE_STAT: &str = "parched:thirstrate";
pub const HUNGER_RATE_STAT: &str = "hungerrate";
pub const THIRSTY_MODIFIER: &str = "parched:thirsty";
pub const HEALTH_MODIFIER_KEY: &str = "parched:thirstHealthMod";
pub const SALT_WATER_MODIFIER: &str = "dranksaltwater";
pub const HEAT_RESIST_MODIFIER: &str = "resistheat";
pub const ADMIN_PRIVILEGE: &str = "controlserver";
pub const VOMIT_SOUND: &str = "sounds/player/hurt1";

// Config files -------------------------------------------------------------
pub const PATCH_FILE_PATTERN: &str = r"^.*AddItemHydration.*\.json$";
pub const MOD_PATCH_FILE: &str = "Parched.AddItemHydration.json";
pub const COMPAT_PATCH_FILE: &str = "Compat.AddItemHydration.json";
pub const SERVER_CONFIG_FILE: &str = "parched-server.json";
pub const CLIENT_CONFIG_FILE: &str = "parched-client.json";
pub const DEFAULT_PATCH_PRIORITY: i32 = 5;

// Entity defaults ----------------------------------------------------------
pub const DEFAULT_MAX_HYDRATION: f32 = 1500.0;
pub const DEFAULT_HYDRATION: f32 = 1500.0;
pub const INITIAL_LOSS_DELAY: f32 = 180.0;

// Tick cadence -------------------------------------------------------------
pub const THIRST_TICK_THRESHOLD_SECS: f32 = 10.0;
pub const DELAY_ABSORB_REFUND_SECS: f32 = 10.0;
pub const SLOW_TICK_INTERVAL_MS: u64 = 6000;
pub const STILLNESS_THRESHOLD_MS: u64 = 3000;
pub const DETOX_INTERVAL_SECS: f32 = 1.0;
pub const DETOX_STEP: f32 = 0.005;

// Decay arithmetic ---------------------------------------------------------
pub const HUNGER_SPEED_DIVISOR: f32 = 30.0;
pub const STILLNESS_DIVISOR: f32 = 4.0;
pub const SPRINT_BASE: f32 = 8.0;
pub const SPRINT_TICKS_PER_STEP: f32 = 15.0;
pub const SPRINT_SCALE: f32 = 1.2;
pub const LOSS_SCALE: f32 = 10.0;
pub const EUHYDRATION_THRESHOLD_RATIO: f32 = 0.6;
pub const ATTACK_HYDRATION_COST: f32 = 3.0;

// Consumption side effects -------------------------------------------------
pub const VOMIT_DELAY_MS: u64 = 2000;
pub const INTOXICATION_RESET_DELAY_MS: u64 = 5000;
pub const SALT_PENALTY_DURATION_MS: u64 = 10_000;
pub const VOMIT_SOUND_RANGE: f32 = 10.0;
pub const VOMIT_SATURATION_FACTOR: f32 = 0.5;
pub const EUHYDRATION_GAIN_DIVISOR: f32 = 10.0;

// Environment --------------------------------------------------------------
pub const HEAT_THRESHOLD_C: f32 = 30.0;
pub const HEAT_RANGE_C: f32 = 40.0;

// Vomit model --------------------------------------------------------------
pub const VOMIT_DECAY_RATE: f64 = 8.445;

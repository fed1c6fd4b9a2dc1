pub mod scenario;
mod util;

pub use util::{config_dir_or_temp, split_csv};

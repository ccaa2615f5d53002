mod load;
mod types;

pub use load::{
    apply_env_overrides, default_config_path, get_geoprobe_data_dir, load_default, load_from_path,
    ENV_KEY_MAP,
};
pub use types::*;

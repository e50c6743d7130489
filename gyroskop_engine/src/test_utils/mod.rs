pub mod clock;
pub mod prepare_env;

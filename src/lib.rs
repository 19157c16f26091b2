pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::client::{BattleTarget, ClientSettings, run, run_with_config};

// Use cases layer: session lifecycle, change detection and the battle view loop.

pub mod battle_view;
pub mod input;
pub mod render;
pub mod schedule;
pub mod session;

#[cfg(test)]
pub(crate) mod test_support;

pub use battle_view::{BattleOutcome, BattleView, BattleViewConfig};
pub use input::{ActionSink, InputMapper, KeyOutcome};
pub use render::{RenderLoop, Scene};
pub use schedule::{Debounce, PeriodicTask};
pub use session::{TransportSession, acquire_credential};

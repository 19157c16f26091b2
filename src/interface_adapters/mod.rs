// Interface adapters: wire protocol, socket transport, REST clients and terminal I/O.

pub mod assets;
pub mod clients;
pub mod keyboard;
pub mod notifier;
pub mod protocol;
pub mod raster;
pub mod ws;

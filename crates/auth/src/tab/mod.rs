//! Server-side tab storage and the typed view the pages use.

mod browser;
mod memory;

pub use browser::BrowserTab;
pub use memory::MemoryTabStorage;

//! The seams between the generic connection layer and each backend.

pub mod allocator;
pub mod backend;
pub mod client;
pub mod session;
pub mod translator;

pub use allocator::ConnectionAllocator;
pub use backend::Backend;
pub use client::ConnectionClient;
pub use session::Session;
pub use translator::CommandTranslator;

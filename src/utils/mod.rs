pub mod completion_guard;

pub use completion_guard::CompletionGuard;

pub mod confirmation;
pub mod content;
pub mod digest;
pub mod markdown;
pub mod router;

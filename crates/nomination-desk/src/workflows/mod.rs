pub mod clock;
pub mod memory;
pub mod moderation;
pub mod nomination;
pub mod roster;

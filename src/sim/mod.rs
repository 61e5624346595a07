pub mod clock;
pub mod event;
pub mod level;
pub mod objective;
pub mod step;
pub mod view;
pub mod world;

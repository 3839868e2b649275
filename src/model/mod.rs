// MODEL: Definitions, levels, the player and simulation time
pub mod animation;
pub mod camera;
pub mod clock;
pub mod definitions;
pub mod geometry;
pub mod level;
pub mod player;
pub mod xml;

pub use camera::Camera;
pub use clock::Clock;
pub use definitions::Definitions;
pub use level::Level;
pub use player::Player;

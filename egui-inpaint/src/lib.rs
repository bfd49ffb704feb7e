mod editor;
mod map;
mod raster;
mod source;
mod stroke;

pub use editor::*;
pub use map::*;
pub use raster::*;
pub use source::*;
pub use stroke::*;

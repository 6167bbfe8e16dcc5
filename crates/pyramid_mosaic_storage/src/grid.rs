//! Planar grid geometry shared by every mosaic: where cells go, how big they are at each level, and which source owns
//! which cell.

pub mod cell_index;
pub mod layout;
pub mod positions;

pub use cell_index::*;
pub use layout::*;
pub use positions::*;

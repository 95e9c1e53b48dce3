//! Material interactions: material properties, detector-element
//! crossings, and the straw material model used by the drift-tube
//! drivers.

mod det_material;
mod element_xing;
mod straw_mat;

pub use det_material::DetMaterial;
pub use element_xing::{ElementXing, MaterialXing};
pub use straw_mat::StrawMat;

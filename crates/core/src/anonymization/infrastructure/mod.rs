mod gaussian;
pub mod region_transforms;

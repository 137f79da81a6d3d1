pub mod model;
pub mod nearby;
pub mod window;

pub use model::{CreateCropRequest, Crop, NewCrop};
pub use nearby::{NearbyCropsParams, NearbyQuery};
pub use window::FloweringWindow;

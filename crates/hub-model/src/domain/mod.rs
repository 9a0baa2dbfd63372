mod ids;
pub use ids::{TaskId, WorkerId};

mod property_set;
pub use property_set::PropertySet;

mod slot;
pub use slot::{GpuCount, NetworkType, Resources, Slot};

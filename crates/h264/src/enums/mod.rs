mod nal_unit_type;
pub use nal_unit_type::*;

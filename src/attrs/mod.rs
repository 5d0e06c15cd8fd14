mod value;

pub use value::{AttrAccess, AttrType, AttrValue, AttributeMap};

mod op_desc;
mod proto;

pub use op_desc::OpDescriptor;
pub use proto::{AttrDef, AttrValidator, OpProto, OpProtoBuilder, SlotDef};

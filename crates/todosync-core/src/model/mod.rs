// ── Domain model ──
//
// Entities are kept as the service sends them: a JSON object per
// record. The typed layer is limited to identity and resource kind.

mod entity;
mod entity_id;
mod resource;

pub use entity::{Entity, is_deleted_flag};
pub use entity_id::EntityId;
pub use resource::ResourceType;

use serde::{Deserialize, Serialize};

use rentpoint_core::{Entity, PickupPointId};

/// A physical location (parcel locker) where items are stored and handed out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PickupPoint {
    pub id: PickupPointId,
    pub address: String,
    pub is_active: bool,
}

impl Entity for PickupPoint {
    type Id = PickupPointId;

    fn id(&self) -> Self::Id {
        self.id
    }
}

use serde::{Deserialize, Serialize};

/// Fields shared by every persisted record.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BaseEntity {
    pub id: i32,
    #[serde(default = "default_status")]
    pub status: bool,
}

fn default_status() -> bool {
    true
}

impl Default for BaseEntity {
    fn default() -> Self {
        Self {
            id: 0,
            status: default_status(),
        }
    }
}

impl BaseEntity {
    #[cfg(test)]
    pub fn with_id(id: i32) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }
}

/// Uniform access to the embedded `BaseEntity` of a concrete record.
pub trait Entity {
    fn base(&self) -> &BaseEntity;

    fn base_mut(&mut self) -> &mut BaseEntity;

    fn id(&self) -> i32 {
        self.base().id
    }

    fn status(&self) -> bool {
        self.base().status
    }

    fn set_status(&mut self, status: bool) {
        self.base_mut().status = status;
    }
}
